//! Error types for the cvrag domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the language-model client.
///
/// Any of these, surfacing after the client's own retries, makes the current
/// request fail as a whole.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Authentication and configuration problems never heal on their own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_) | Self::NotConfigured(_) => false,
        }
    }
}

/// Failures while serving a single retrieval call.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Query embedding failed: {0}")]
    EmbeddingFailed(#[from] ProviderError),

    #[error("Embedding dimension mismatch: index has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Search failed: {0}")]
    SearchFailed(String),
}

/// Failures while loading a persisted index at startup.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index not found at {0}")]
    NotFound(PathBuf),

    #[error("Failed to read index at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse index at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid index: {0}")]
    Invalid(String),
}
