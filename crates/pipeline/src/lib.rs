//! Conversation-aware retrieval-augmented answering for cvrag.
//!
//! One request runs four stages in order:
//!
//! 1. [`QueryReformulator`]: rewrite the follow-up into a standalone question
//! 2. [`Retriever`](cvrag_core::Retriever): fetch ranked fragments
//! 3. [`ContextAssembler`]: pack fragments under a character budget
//! 4. [`AnswerGenerator`]: answer grounded in the packed context
//!
//! [`RagPipeline`] orchestrates them; [`ChatSession`] owns one conversation.

pub mod assembler;
pub mod generator;
pub mod pipeline;
pub mod reformulator;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use assembler::{AssembledContext, ContextAssembler, SEPARATOR};
pub use generator::AnswerGenerator;
pub use pipeline::{
    InputRejection, PipelineError, PipelineStage, RagPipeline, RagResult, build_previews,
};
pub use reformulator::QueryReformulator;
pub use session::{ChatSession, Reply, ReplyKind};
