//! Retrieval adapters over a loaded [`VectorIndex`].
//!
//! Both adapters are built once at startup and shared as `Arc<dyn Retriever>`.

use crate::store::VectorIndex;
use crate::vector::{mmr_select, rank_by_similarity};
use async_trait::async_trait;
use cvrag_core::error::{IndexError, RetrievalError};
use cvrag_core::provider::{EmbeddingRequest, Provider};
use cvrag_core::retrieval::{RetrievedFragment, Retriever};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Embeds the query, ranks by cosine similarity, then diversifies with MMR.
pub struct VectorRetriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Provider>,
    model: String,
    top_k: usize,
    fetch_k: usize,
    lambda: f32,
}

impl VectorRetriever {
    /// Create a retriever over `index`, embedding queries with `model`.
    ///
    /// Every entry must carry an embedding.
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Provider>,
        model: impl Into<String>,
    ) -> Result<Self, IndexError> {
        if !index.fully_embedded() {
            return Err(IndexError::Invalid(
                "vector retrieval requires an embedding on every entry".into(),
            ));
        }

        Ok(Self {
            index,
            embedder,
            model: model.into(),
            top_k: 3,
            fetch_k: 4,
            lambda: 0.5,
        })
    }

    /// Set how many fragments are returned and how many candidates MMR sees.
    ///
    /// `fetch_k` is raised to `top_k` if smaller.
    pub fn with_limits(mut self, top_k: usize, fetch_k: usize) -> Self {
        self.top_k = top_k;
        self.fetch_k = fetch_k.max(top_k);
        self
    }

    pub fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = lambda.clamp(0.0, 1.0);
        self
    }

    /// Embed a sample text once and return the vector's dimension.
    ///
    /// Fails when the embedder cannot embed or its vectors do not match the
    /// index. Run at startup, before any question is accepted.
    pub async fn check_embedder(&self) -> Result<usize, RetrievalError> {
        let embedding = self.embed_query("experience").await?;
        debug!(dimensions = embedding.len(), model = %self.model, "Embedder ready");
        Ok(embedding.len())
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, RetrievalError> {
        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: vec![query.to_string()],
            })
            .await?;

        let embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::SearchFailed("embedding response was empty".into()))?;

        if let Some(expected) = self.index.dimensions()
            && expected != embedding.len()
        {
            return Err(RetrievalError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }

        Ok(embedding)
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    fn name(&self) -> &str {
        "vector"
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedFragment>, RetrievalError> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embed_query(query).await?;
        let entries = self.index.entries();

        let candidates = rank_by_similarity(entries, &query_embedding, self.fetch_k);
        let selected = mmr_select(entries, &candidates, self.top_k, self.lambda);

        debug!(
            candidates = candidates.len(),
            selected = selected.len(),
            "Vector retrieval complete"
        );

        Ok(selected
            .into_iter()
            .enumerate()
            .map(|(rank, scored)| {
                let entry = &entries[scored.position];
                RetrievedFragment {
                    text: entry.text.clone(),
                    rank,
                    source: entry.source.clone(),
                    score: Some(scored.score),
                }
            })
            .collect())
    }
}

/// Ranks entries by how often the query's terms occur in them.
///
/// Needs no embeddings and makes no network calls.
pub struct KeywordRetriever {
    index: Arc<VectorIndex>,
    top_k: usize,
}

impl KeywordRetriever {
    pub fn new(index: Arc<VectorIndex>) -> Self {
        Self { index, top_k: 3 }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// Lowercased terms of at least two characters.
fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_lowercase())
        .collect()
}

/// Whole-term occurrences of the query's terms, damped for long fragments.
fn keyword_score(query_terms: &HashSet<String>, text: &str) -> f32 {
    let occurrences = terms(text)
        .iter()
        .filter(|term| query_terms.contains(*term))
        .count();
    let length = text.chars().count() as f32;
    occurrences as f32 / (length / 100.0).max(1.0)
}

#[async_trait]
impl Retriever for KeywordRetriever {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedFragment>, RetrievalError> {
        let query_terms: HashSet<String> = terms(query).into_iter().collect();
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, usize)> = self
            .index
            .entries()
            .iter()
            .enumerate()
            .map(|(position, entry)| (keyword_score(&query_terms, &entry.text), position))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(self.top_k);

        debug!(matched = scored.len(), "Keyword retrieval complete");

        let entries = self.index.entries();
        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, (score, position))| RetrievedFragment {
                text: entries[position].text.clone(),
                rank,
                source: entries[position].source.clone(),
                score: Some(score),
            })
            .collect())
    }
}
