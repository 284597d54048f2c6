//! Persisted index loader.
//!
//! An index directory holds a single `index.json`:
//!
//! ```json
//! {
//!   "embedding_model": "BAAI/bge-m3",
//!   "entries": [
//!     { "id": "chunk-0", "text": "...", "source": "cv.pdf", "embedding": [0.1, 0.2] }
//!   ]
//! }
//! ```
//!
//! The loader never writes. Building an index happens elsewhere.

use cvrag_core::error::IndexError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// File name of the index inside its directory.
pub const INDEX_FILE: &str = "index.json";

/// A single indexed fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl IndexEntry {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source: None,
            embedding: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

#[derive(Debug, Deserialize)]
struct IndexFile {
    #[serde(default)]
    embedding_model: Option<String>,
    entries: Vec<IndexEntry>,
}

/// An immutable, in-memory fragment index.
///
/// Shared read-only across sessions once loaded.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    embedding_model: Option<String>,
    dimensions: Option<usize>,
}

impl VectorIndex {
    /// Load `dir/index.json`.
    ///
    /// Fails if the directory or file is missing, unreadable, not valid JSON,
    /// or if the present embeddings disagree on dimension.
    pub fn load(dir: &Path) -> Result<Self, IndexError> {
        let path = dir.join(INDEX_FILE);
        if !path.is_file() {
            return Err(IndexError::NotFound(path));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| IndexError::ReadError {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let file: IndexFile =
            serde_json::from_str(&content).map_err(|e| IndexError::ParseError {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let index = Self::from_entries(file.entries, file.embedding_model)?;

        info!(
            path = %path.display(),
            entries = index.len(),
            dimensions = index.dimensions.unwrap_or(0),
            "Index loaded"
        );

        Ok(index)
    }

    /// Build an index from entries already in memory.
    pub fn from_entries(
        entries: Vec<IndexEntry>,
        embedding_model: Option<String>,
    ) -> Result<Self, IndexError> {
        let mut dimensions = None;

        for entry in &entries {
            let Some(embedding) = &entry.embedding else {
                continue;
            };
            if embedding.is_empty() {
                return Err(IndexError::Invalid(format!(
                    "entry '{}' has an empty embedding",
                    entry.id
                )));
            }
            match dimensions {
                None => dimensions = Some(embedding.len()),
                Some(expected) if expected != embedding.len() => {
                    return Err(IndexError::Invalid(format!(
                        "entry '{}' has {} dimensions, expected {}",
                        entry.id,
                        embedding.len(),
                        expected
                    )));
                }
                Some(_) => {}
            }
        }

        debug!(count = entries.len(), ?dimensions, "Index entries validated");

        Ok(Self {
            entries,
            embedding_model,
            dimensions,
        })
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The model the stored embeddings were produced with, if recorded.
    pub fn embedding_model(&self) -> Option<&str> {
        self.embedding_model.as_deref()
    }

    /// Embedding dimension shared by every embedded entry.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Whether every entry carries an embedding.
    ///
    /// Vacuously true for an empty index.
    pub fn fully_embedded(&self) -> bool {
        self.entries.iter().all(|e| e.embedding.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_index(dir: &Path, json: &str) {
        std::fs::write(dir.join(INDEX_FILE), json).unwrap();
    }

    #[test]
    fn load_valid_index() {
        let dir = tempfile::tempdir().unwrap();
        write_index(
            dir.path(),
            r#"{
                "embedding_model": "BAAI/bge-m3",
                "entries": [
                    {"id": "a", "text": "Rust developer", "source": "cv.pdf", "embedding": [1.0, 0.0]},
                    {"id": "b", "text": "Python developer", "embedding": [0.0, 1.0]}
                ]
            }"#,
        );

        let index = VectorIndex::load(dir.path()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.embedding_model(), Some("BAAI/bge-m3"));
        assert_eq!(index.dimensions(), Some(2));
        assert!(index.fully_embedded());
        assert_eq!(index.entries()[0].source.as_deref(), Some("cv.pdf"));
    }

    #[test]
    fn load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), r#"{"entries": [{"id": "a", "text": "one"}]}"#);

        let first = VectorIndex::load(dir.path()).unwrap();
        let second = VectorIndex::load(dir.path()).unwrap();
        assert_eq!(first.entries(), second.entries());
    }

    #[test]
    fn keyword_only_index_has_no_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), r#"{"entries": [{"id": "a", "text": "one"}]}"#);

        let index = VectorIndex::load(dir.path()).unwrap();
        assert_eq!(index.dimensions(), None);
        assert!(!index.fully_embedded());
        assert!(index.embedding_model().is_none());
    }

    #[test]
    fn missing_index_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = VectorIndex::load(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, IndexError::NotFound(_)));
    }

    #[test]
    fn corrupt_index_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), "{ not json");

        let err = VectorIndex::load(dir.path()).unwrap_err();
        assert!(matches!(err, IndexError::ParseError { .. }));
    }

    #[test]
    fn mixed_dimensions_rejected() {
        let entries = vec![
            IndexEntry::new("a", "one").with_embedding(vec![1.0, 0.0]),
            IndexEntry::new("b", "two").with_embedding(vec![1.0, 0.0, 0.0]),
        ];
        let err = VectorIndex::from_entries(entries, None).unwrap_err();
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn empty_embedding_rejected() {
        let entries = vec![IndexEntry::new("a", "one").with_embedding(vec![])];
        assert!(VectorIndex::from_entries(entries, None).is_err());
    }

    #[test]
    fn empty_index_is_valid() {
        let index = VectorIndex::from_entries(vec![], None).unwrap();
        assert!(index.is_empty());
        assert!(index.fully_embedded());
    }
}
