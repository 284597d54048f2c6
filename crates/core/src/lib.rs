//! # cvrag Core
//!
//! Domain types, traits, and error definitions for the cvrag conversational
//! RAG pipeline. This crate has **no framework dependencies**: it defines the
//! domain model that the other crates implement against.
//!
//! ## Seams
//!
//! Every external collaborator is a trait here:
//! - [`Provider`]: the language-model client (chat completion + embeddings)
//! - [`Retriever`]: the read-only retrieval capability over a built index
//!
//! Implementations live in `cvrag-providers` and `cvrag-index`; tests swap in
//! scripted stubs.

pub mod error;
pub mod language;
pub mod message;
pub mod provider;
pub mod retrieval;

// Re-export key types at crate root for ergonomics
pub use error::{IndexError, ProviderError, RetrievalError};
pub use language::{Language, LanguagePack, UnknownLanguage};
pub use message::{ConversationState, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use retrieval::{RetrievedFragment, Retriever};
