//! Vector similarity and diversity selection.
//!
//! Pure-Rust implementations of:
//! - Cosine similarity
//! - Similarity ranking over embedded entries
//! - Maximal Marginal Relevance (MMR) selection

use crate::store::IndexEntry;
use std::cmp::Ordering;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if the lengths differ or either vector is empty or zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// A candidate picked by similarity search: entry position and score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    pub position: usize,
    pub score: f32,
}

/// Rank embedded entries by cosine similarity to `query`.
///
/// Returns at most `limit` candidates, best first. Ties keep index order so
/// the ranking is deterministic.
pub fn rank_by_similarity(entries: &[IndexEntry], query: &[f32], limit: usize) -> Vec<Scored> {
    let mut scored: Vec<Scored> = entries
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| {
            let embedding = entry.embedding.as_ref()?;
            Some(Scored {
                position,
                score: cosine_similarity(embedding, query),
            })
        })
        .collect();

    // Stable sort: equal scores stay in index order.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(limit);
    scored
}

/// Select `k` of `candidates` by Maximal Marginal Relevance.
///
/// Each step picks the candidate maximising
/// `lambda * sim(query, c) - (1 - lambda) * max(sim(c, selected))`.
/// `lambda = 1.0` is pure relevance; `lambda = 0.0` is pure diversity.
/// The first pick is always the most relevant candidate.
pub fn mmr_select(
    entries: &[IndexEntry],
    candidates: &[Scored],
    k: usize,
    lambda: f32,
) -> Vec<Scored> {
    let mut remaining: Vec<Scored> = candidates.to_vec();
    let mut selected: Vec<Scored> = Vec::with_capacity(k.min(candidates.len()));

    while selected.len() < k && !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_value = f32::NEG_INFINITY;

        for (i, candidate) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|s| pair_similarity(entries, candidate.position, s.position))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if selected.is_empty() { 0.0 } else { redundancy };

            let value = lambda * candidate.score - (1.0 - lambda) * redundancy;
            if value > best_value {
                best_value = value;
                best_idx = i;
            }
        }

        selected.push(remaining.remove(best_idx));
    }

    selected
}

fn pair_similarity(entries: &[IndexEntry], a: usize, b: usize) -> f32 {
    match (&entries[a].embedding, &entries[b].embedding) {
        (Some(x), Some(y)) => cosine_similarity(x, y),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry::new(id, id).with_embedding(embedding)
    }

    #[test]
    fn identical_vectors() {
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors() {
        let sim = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn ranking_orders_by_similarity() {
        let entries = vec![
            entry("far", vec![0.0, 1.0]),
            entry("near", vec![1.0, 0.1]),
            entry("exact", vec![1.0, 0.0]),
            IndexEntry::new("plain", "no embedding"),
        ];

        let ranked = rank_by_similarity(&entries, &[1.0, 0.0], 10);
        let order: Vec<usize> = ranked.iter().map(|s| s.position).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn ranking_respects_limit_and_ties() {
        let entries = vec![
            entry("a", vec![1.0, 0.0]),
            entry("b", vec![1.0, 0.0]),
            entry("c", vec![1.0, 0.0]),
        ];
        let ranked = rank_by_similarity(&entries, &[1.0, 0.0], 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].position, 0);
        assert_eq!(ranked[1].position, 1);
    }

    #[test]
    fn mmr_prefers_diverse_second_pick() {
        // Two near-duplicates pointing at the query and one distinct entry.
        let entries = vec![
            entry("dup1", vec![1.0, 0.0]),
            entry("dup2", vec![0.99, 0.01]),
            entry("other", vec![0.6, 0.8]),
        ];
        let candidates = rank_by_similarity(&entries, &[1.0, 0.2], 3);
        assert_eq!(candidates[0].position, 1);

        let picked = mmr_select(&entries, &candidates, 2, 0.5);
        let order: Vec<usize> = picked.iter().map(|s| s.position).collect();
        assert_eq!(order, vec![1, 2]);
    }

    #[test]
    fn mmr_with_lambda_one_is_pure_relevance() {
        let entries = vec![
            entry("dup1", vec![1.0, 0.0]),
            entry("dup2", vec![0.99, 0.01]),
            entry("other", vec![0.6, 0.8]),
        ];
        let candidates = rank_by_similarity(&entries, &[1.0, 0.2], 3);

        let picked = mmr_select(&entries, &candidates, 2, 1.0);
        let order: Vec<usize> = picked.iter().map(|s| s.position).collect();
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn mmr_returns_fewer_when_candidates_run_out() {
        let entries = vec![entry("only", vec![1.0])];
        let candidates = rank_by_similarity(&entries, &[1.0], 4);
        assert_eq!(mmr_select(&entries, &candidates, 3, 0.5).len(), 1);
        assert!(mmr_select(&entries, &[], 3, 0.5).is_empty());
    }
}
