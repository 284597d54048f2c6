//! Read-only fragment index for cvrag.
//!
//! - [`VectorIndex`]: the persisted fragments, loaded once at startup
//! - [`VectorRetriever`]: cosine ranking + MMR selection over query embeddings
//! - [`KeywordRetriever`]: term-overlap ranking for indexes without embeddings

pub mod retriever;
pub mod store;
pub mod vector;

pub use retriever::{KeywordRetriever, VectorRetriever};
pub use store::{INDEX_FILE, IndexEntry, VectorIndex};
