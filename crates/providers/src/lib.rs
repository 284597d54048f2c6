//! LLM provider implementations for cvrag.
//!
//! All providers implement the `cvrag_core::Provider` trait.
//! The router builds them from configuration and wraps each one in a
//! [`RetryProvider`].

pub mod openai_compat;
pub mod retry;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use retry::RetryProvider;
pub use router::{ProviderRouter, build_from_config};
