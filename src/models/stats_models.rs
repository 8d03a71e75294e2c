// src/models/stats_models.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionStats {
    pub records: usize,
    /// Always `records * (records - 1) / 2`.
    pub pairs_considered: usize,
    /// Pairs that were actually scored; lower than `pairs_considered` when bucketing.
    pub pairs_scored: usize,
    pub candidates: usize,
    pub postal_buckets: Option<usize>,
    pub avg_name_similarity: f64,
    pub avg_address_similarity: f64,
    pub address_fallbacks: usize,
}

impl DetectionStats {
    pub fn for_records(records: usize) -> Self {
        Self {
            records,
            pairs_considered: total_pairs(records),
            ..Default::default()
        }
    }
}

pub fn total_pairs(n: usize) -> usize {
    if n >= 2 {
        n * (n - 1) / 2
    } else {
        0
    }
}
