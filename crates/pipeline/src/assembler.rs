//! Context assembly: packs ranked fragments under a character budget.
//!
//! # Algorithm
//!
//! Fragments are taken in rank order while the running length (sum of
//! fragment lengths, separators excluded) stays within the budget. The first
//! fragment that would overflow stops assembly: it and everything after it
//! are dropped, even if a later fragment would still fit.
//!
//! # Determinism
//!
//! Identical inputs always produce identical outputs.

use cvrag_core::retrieval::RetrievedFragment;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Delimiter placed between included fragments.
pub const SEPARATOR: &str = "\n\n---\n\n";

/// Default character budget.
pub const DEFAULT_BUDGET_CHARS: usize = 4000;

/// The packed context handed to the answer generator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssembledContext {
    /// Included fragments joined by [`SEPARATOR`]; empty when none fit.
    pub text: String,
    /// How many fragments made it in.
    pub included_count: usize,
    /// Sum of included fragment lengths, in characters. Never above the budget.
    pub total_length: usize,
}

impl AssembledContext {
    /// True when no fragment was included.
    pub fn is_empty(&self) -> bool {
        self.included_count == 0
    }
}

/// Greedy, rank-preserving context packer.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    budget_chars: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET_CHARS)
    }
}

impl ContextAssembler {
    pub fn new(budget_chars: usize) -> Self {
        Self { budget_chars }
    }

    pub fn budget_chars(&self) -> usize {
        self.budget_chars
    }

    /// Pack `fragments` (already in rank order) into one context string.
    pub fn assemble(&self, fragments: &[RetrievedFragment]) -> AssembledContext {
        let mut included: Vec<&str> = Vec::new();
        let mut total_length = 0usize;

        for fragment in fragments {
            let len = fragment.char_len();
            if total_length + len > self.budget_chars {
                debug!(
                    rank = fragment.rank,
                    len,
                    total_length,
                    budget = self.budget_chars,
                    "Fragment exceeds budget, stopping"
                );
                break;
            }
            included.push(&fragment.text);
            total_length += len;
        }

        AssembledContext {
            text: included.join(SEPARATOR),
            included_count: included.len(),
            total_length,
        }
    }
}
