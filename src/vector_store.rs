//! In-memory nearest-neighbor index over a fixed vector set.
//!
//! Brute-force dot-product scan. Callers are responsible for supplying
//! comparably-scaled vectors (typically outputs of a single embedding
//! model, where dot product approximates cosine similarity). The store is
//! stateless beyond the vectors passed at construction, so per-call
//! instances are cheap and need no locking.

use std::cmp::Ordering;

/// Fixed set of embedding vectors supporting top-k similarity queries.
pub struct VectorStore {
    vectors: Vec<Vec<f32>>,
}

impl VectorStore {
    pub fn new(vectors: Vec<Vec<f32>>) -> Self {
        Self { vectors }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Top-`k` stored vectors by dot product with `query`.
    ///
    /// Returns `(score, original index)` pairs sorted by score descending,
    /// ties broken by ascending index. At most `k` entries; all of them
    /// when `k` exceeds the store size. Pure: repeated calls with the
    /// same inputs return the same ranking.
    pub fn nearest(&self, query: &[f32], k: usize) -> Vec<(f32, usize)> {
        let mut scored: Vec<(f32, usize)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, vector)| (dot(query, vector), index))
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        scored.truncate(k);
        scored
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
