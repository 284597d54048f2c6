//! Pipeline orchestrator: one question in, one [`RagResult`] out.
//!
//! # Flow
//!
//! 1. Validate the question (no model or retrieval call on rejection)
//! 2. Reformulate it against the conversation history
//! 3. Retrieve fragments for the reformulated question
//! 4. Assemble them under the character budget
//! 5. No context: return the fallback answer without a generation call
//! 6. Otherwise generate an answer from the original question and context
//!
//! Retrieval failures degrade to "nothing found". Model failures end the
//! request. A request yields one complete result or one error, never a
//! partial result.

use crate::assembler::ContextAssembler;
use crate::generator::AnswerGenerator;
use crate::reformulator::QueryReformulator;
use cvrag_config::{AppConfig, PipelineConfig};
use cvrag_core::error::ProviderError;
use cvrag_core::language::Language;
use cvrag_core::message::Message;
use cvrag_core::provider::Provider;
use cvrag_core::retrieval::{RetrievedFragment, Retriever};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Outcome of one answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResult {
    pub answer: String,
    /// The standalone question used for retrieval.
    pub reformulated_question: String,
    /// Previews of the first retrieved fragments, for display.
    pub context_preview: Vec<String>,
    /// False when no fragment fit the context and the fallback was returned.
    pub had_context: bool,
}

/// Why a question was refused before any work was done.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputRejection {
    #[error("question is empty")]
    Empty,

    #[error("question has {len} characters, maximum is {max}")]
    TooLong { len: usize, max: usize },
}

impl InputRejection {
    /// The localized corrective message for the user.
    pub fn user_message(&self, language: Language) -> String {
        let pack = language.pack();
        match self {
            Self::Empty => pack.empty_question_message.to_string(),
            Self::TooLong { max, .. } => pack.too_long_message(*max),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input rejected: {0}")]
    InputRejected(#[from] InputRejection),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[from] ProviderError),
}

impl PipelineError {
    /// What the user should see for this error.
    pub fn user_message(&self, language: Language) -> String {
        match self {
            Self::InputRejected(rejection) => rejection.user_message(language),
            Self::ModelUnavailable(_) => language.pack().error_message.to_string(),
        }
    }
}

/// Request lifecycle stages, logged at debug level as they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Reformulating,
    Retrieving,
    Assembling,
    NoContext,
    Generating,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Reformulating => "reformulating",
            Self::Retrieving => "retrieving",
            Self::Assembling => "assembling",
            Self::NoContext => "no_context",
            Self::Generating => "generating",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

fn enter(stage: PipelineStage) {
    debug!(stage = %stage, "Pipeline stage");
}

/// The conversation-aware RAG pipeline.
///
/// Immutable after construction; share it across sessions behind an `Arc`.
pub struct RagPipeline {
    reformulator: QueryReformulator,
    retriever: Arc<dyn Retriever>,
    assembler: ContextAssembler,
    generator: AnswerGenerator,
    max_question_chars: usize,
    preview_count: usize,
    preview_chars: usize,
}

impl RagPipeline {
    /// Create a pipeline with default limits.
    pub fn new(
        provider: Arc<dyn Provider>,
        retriever: Arc<dyn Retriever>,
        model: impl Into<String>,
    ) -> Self {
        let model = model.into();
        let defaults = PipelineConfig::default();
        Self {
            reformulator: QueryReformulator::new(provider.clone(), &model),
            retriever,
            assembler: ContextAssembler::new(defaults.context_budget_chars),
            generator: AnswerGenerator::new(provider, model),
            max_question_chars: defaults.max_question_chars,
            preview_count: defaults.preview_count,
            preview_chars: defaults.preview_chars,
        }
    }

    /// Create a pipeline from application configuration.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        retriever: Arc<dyn Retriever>,
    ) -> Self {
        Self::new(provider, retriever, &config.default_model)
            .with_sampling(config.default_temperature, config.default_max_tokens)
            .with_limits(&config.pipeline)
    }

    /// Temperature and token cap for both model calls.
    pub fn with_sampling(mut self, temperature: f32, max_tokens: Option<u32>) -> Self {
        self.reformulator = self
            .reformulator
            .with_temperature(temperature)
            .with_max_tokens(max_tokens);
        self.generator = self
            .generator
            .with_temperature(temperature)
            .with_max_tokens(max_tokens);
        self
    }

    pub fn with_limits(mut self, limits: &PipelineConfig) -> Self {
        self.assembler = ContextAssembler::new(limits.context_budget_chars);
        self.max_question_chars = limits.max_question_chars;
        self.preview_count = limits.preview_count;
        self.preview_chars = limits.preview_chars;
        self
    }

    pub fn retriever_name(&self) -> &str {
        self.retriever.name()
    }

    /// Check a question before any model or retrieval call.
    pub fn validate_question(&self, question: &str) -> Result<(), InputRejection> {
        if question.trim().is_empty() {
            return Err(InputRejection::Empty);
        }
        let len = question.chars().count();
        if len > self.max_question_chars {
            return Err(InputRejection::TooLong {
                len,
                max: self.max_question_chars,
            });
        }
        Ok(())
    }

    /// Answer `question` given the conversation `history`.
    pub async fn answer(
        &self,
        question: &str,
        history: &[Message],
        language: Language,
    ) -> Result<RagResult, PipelineError> {
        enter(PipelineStage::Idle);
        if let Err(rejection) = self.validate_question(question) {
            warn!(reason = %rejection, "Question rejected");
            return Err(rejection.into());
        }

        info!(
            question = %truncate_chars(question, 100),
            language = %language,
            history = history.len(),
            "Processing question"
        );

        enter(PipelineStage::Reformulating);
        let reformulated = self
            .reformulator
            .reformulate(question, history, language)
            .await?;

        enter(PipelineStage::Retrieving);
        let fragments = match self.retriever.retrieve(&reformulated).await {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!(
                    retriever = self.retriever.name(),
                    error = %e,
                    "Retrieval failed, continuing without context"
                );
                Vec::new()
            }
        };
        debug!(fragments = fragments.len(), "Fragments retrieved");

        enter(PipelineStage::Assembling);
        let context = self.assembler.assemble(&fragments);
        info!(
            included = context.included_count,
            total_length = context.total_length,
            "Context assembled"
        );

        if context.is_empty() {
            enter(PipelineStage::NoContext);
            warn!("Empty context, returning fallback answer");
            return Ok(RagResult {
                answer: language.pack().fallback_message.to_string(),
                reformulated_question: reformulated,
                context_preview: Vec::new(),
                had_context: false,
            });
        }

        enter(PipelineStage::Generating);
        let answer = self
            .generator
            .generate(question, &context.text, language)
            .await?;

        let context_preview = build_previews(&fragments, self.preview_count, self.preview_chars);

        enter(PipelineStage::Done);
        Ok(RagResult {
            answer,
            reformulated_question: reformulated,
            context_preview,
            had_context: true,
        })
    }
}

/// Previews of the first `count` fragments: `chars` characters each,
/// newlines flattened to spaces, followed by `...`.
pub fn build_previews(fragments: &[RetrievedFragment], count: usize, chars: usize) -> Vec<String> {
    fragments
        .iter()
        .take(count)
        .map(|f| format!("{}...", truncate_chars(&f.text, chars).replace('\n', " ")))
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
