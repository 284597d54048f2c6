//! Retriever trait: the read-only retrieval capability over a built index.
//!
//! Any vector-store client is adapted to this one shape once, at construction
//! time. Implementations must be safe to share across concurrent sessions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// A chunk of source text returned by retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedFragment {
    /// The fragment text
    pub text: String,

    /// Position in retrieval order (0 = most relevant)
    pub rank: usize,

    /// Human-readable source label (file name, URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Similarity score reported by the search, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl RetrievedFragment {
    pub fn new(text: impl Into<String>, rank: usize) -> Self {
        Self {
            text: text.into(),
            rank,
            source: None,
            score: None,
        }
    }

    /// Length in characters, the unit of every context budget.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Text in, ranked fragments out.
///
/// An empty index yields `Ok(vec![])`. Errors are reported, not panicked; the
/// pipeline treats any error as "nothing found".
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Adapter name for logs (e.g., "vector", "keyword").
    fn name(&self) -> &str;

    /// Return fragments for `query`, most relevant first.
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedFragment>, RetrievalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_len_counts_unicode_scalars() {
        let fragment = RetrievedFragment::new("experiência", 0);
        assert_eq!(fragment.char_len(), 11);
        assert!(fragment.text.len() > 11);
    }

    #[test]
    fn optional_fields_skipped_in_json() {
        let json = serde_json::to_string(&RetrievedFragment::new("text", 2)).unwrap();
        assert!(!json.contains("source"));
        assert!(!json.contains("score"));
        assert!(json.contains("\"rank\":2"));
    }
}
