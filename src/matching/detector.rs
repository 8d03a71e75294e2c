// src/matching/detector.rs - Pairwise duplicate detection over normalized records
use anyhow::{Context, Result};
use log::warn;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::models::records::{DuplicateCandidate, NormalizedRecord};
use crate::models::stats_models::{total_pairs, DetectionStats};
use crate::utils::detector_config::{DetectorConfig, Threshold};
use crate::utils::progress_bars::logging::{DedupeStage, DetectionLogger};
use crate::utils::progress_bars::progress_callback::ProgressCallback;
use crate::{update_detailed_progress, update_progress};

const PROGRESS_EVERY_ROWS: usize = 1_000;

/// Scores for one pair of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairScore {
    pub name_similarity: u8,
    pub address_similarity: u8,
    pub postal_code_match: bool,
}

impl PairScore {
    pub fn is_match(&self, threshold: Threshold) -> bool {
        let t = threshold.value();
        self.name_similarity >= t && self.address_similarity >= t && self.postal_code_match
    }
}

#[derive(Debug, Clone, Default)]
pub struct DuplicateDetector {
    config: DetectorConfig,
}

impl DuplicateDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config
            .validate()
            .context("Failed to create duplicate detector")?;
        Ok(Self { config })
    }

    pub fn compare(&self, a: &NormalizedRecord, b: &NormalizedRecord) -> PairScore {
        PairScore {
            name_similarity: self.config.scorer.score(&a.normalized_name, &b.normalized_name),
            address_similarity: self
                .config
                .scorer
                .score(&a.normalized_address, &b.normalized_address),
            postal_code_match: a.normalized_postal_code == b.normalized_postal_code,
        }
    }

    /// Every pair (i < j) that clears the threshold, in ascending (i, j) order.
    pub fn find_duplicates(&self, records: &[NormalizedRecord]) -> Vec<DuplicateCandidate> {
        self.detect(records, None).0
    }

    pub fn detect(
        &self,
        records: &[NormalizedRecord],
        progress_callback: Option<ProgressCallback>,
    ) -> (Vec<DuplicateCandidate>, DetectionStats) {
        let logger = DetectionLogger::new(DedupeStage::Detect);
        logger.log_start(records.len(), self.config.threshold.value());

        let mut stats = DetectionStats::for_records(records.len());
        if records.len() < 2 {
            update_progress!(progress_callback, "Completed", "Not enough records to form pairs");
            logger.log_completion(&stats);
            return (Vec::new(), stats);
        }

        logger.log_phase("Generating pairs", None);
        update_progress!(progress_callback, "Generating pairs");
        let plan = PairPlan::build(records, self.config.bucket_by_postal_code);
        if let Some(buckets) = &plan.buckets {
            let largest = buckets.members.iter().map(Vec::len).max().unwrap_or(0);
            logger.log_bucketing(buckets.members.len(), largest);
            stats.postal_buckets = Some(buckets.members.len());
        }
        let pairs_to_score = plan.total_cost();
        logger.log_pair_generation(stats.pairs_considered, pairs_to_score);

        let workers = self.config.effective_workers();
        logger.log_workers(workers);
        logger.log_phase("Scoring pairs", Some(&format!("{} pairs", pairs_to_score)));
        update_progress!(
            progress_callback,
            "Scoring pairs",
            format!("{} pairs on {} workers", pairs_to_score, workers)
        );

        let rows = self.score_all_rows(&plan, workers, progress_callback.as_ref());

        let mut candidates = Vec::new();
        let mut name_sum = 0u64;
        let mut address_sum = 0u64;
        for row in rows {
            stats.pairs_scored += row.pairs_scored;
            name_sum += row.name_sum;
            address_sum += row.address_sum;
            candidates.extend(row.candidates);
        }
        stats.candidates = candidates.len();
        if stats.pairs_scored > 0 {
            stats.avg_name_similarity = name_sum as f64 / stats.pairs_scored as f64;
            stats.avg_address_similarity = address_sum as f64 / stats.pairs_scored as f64;
        }

        update_progress!(
            progress_callback,
            "Completed",
            format!("{} duplicate candidates", candidates.len())
        );
        logger.log_completion(&stats);
        (candidates, stats)
    }

    /// One `RowOutput` per record, in row order. Indexed parallel collect keeps
    /// that order, so the candidates come out exactly as in the sequential scan.
    fn score_all_rows(
        &self,
        plan: &PairPlan<'_>,
        workers: usize,
        progress_callback: Option<&ProgressCallback>,
    ) -> Vec<RowOutput> {
        let total_rows = plan.records.len();
        let rows_done = AtomicUsize::new(0);
        let score = |i: usize| {
            let row = self.score_row(plan, i);
            let done = rows_done.fetch_add(1, Ordering::Relaxed) + 1;
            if done % PROGRESS_EVERY_ROWS == 0 || done == total_rows {
                update_detailed_progress!(progress_callback, "Scoring pairs", done, total_rows);
            }
            row
        };

        if workers <= 1 {
            return (0..total_rows).map(score).collect();
        }
        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(|| (0..total_rows).into_par_iter().map(score).collect()),
            Err(e) => {
                warn!("Failed to create scoring thread pool ({}), scoring sequentially", e);
                (0..total_rows).map(score).collect()
            }
        }
    }

    fn score_row(&self, plan: &PairPlan<'_>, i: usize) -> RowOutput {
        let mut output = RowOutput::default();
        let threshold = self.config.threshold;
        let a = &plan.records[i];
        plan.for_each_partner(i, |j| {
            let b = &plan.records[j];
            let score = self.compare(a, b);
            output.pairs_scored += 1;
            output.name_sum += u64::from(score.name_similarity);
            output.address_sum += u64::from(score.address_similarity);
            if score.is_match(threshold) {
                output.candidates.push(DuplicateCandidate {
                    index_a: i,
                    index_b: j,
                    record_a: a.clone(),
                    record_b: b.clone(),
                    name_similarity: score.name_similarity,
                    address_similarity: score.address_similarity,
                });
            }
        });
        output
    }
}

/// Convenience entry point: default scorer, sequential scan, caller-supplied threshold.
pub fn find_duplicates(records: &[NormalizedRecord], threshold: u8) -> Result<Vec<DuplicateCandidate>> {
    let detector = DuplicateDetector::new(DetectorConfig::with_threshold(threshold)?)?;
    Ok(detector.find_duplicates(records))
}

#[derive(Default)]
struct RowOutput {
    candidates: Vec<DuplicateCandidate>,
    pairs_scored: usize,
    name_sum: u64,
    address_sum: u64,
}

struct PostalBuckets {
    members: Vec<Vec<usize>>,
    /// (bucket, position within bucket) for every record.
    slots: Vec<(usize, usize)>,
}

/// Which j > i each row i is compared against.
struct PairPlan<'a> {
    records: &'a [NormalizedRecord],
    buckets: Option<PostalBuckets>,
}

impl<'a> PairPlan<'a> {
    fn build(records: &'a [NormalizedRecord], bucket_by_postal_code: bool) -> Self {
        let buckets = bucket_by_postal_code.then(|| {
            let mut bucket_ids: HashMap<&str, usize> = HashMap::new();
            let mut members: Vec<Vec<usize>> = Vec::new();
            let mut slots = Vec::with_capacity(records.len());
            for (i, record) in records.iter().enumerate() {
                let bucket = *bucket_ids
                    .entry(record.normalized_postal_code.as_str())
                    .or_insert_with(|| {
                        members.push(Vec::new());
                        members.len() - 1
                    });
                slots.push((bucket, members[bucket].len()));
                members[bucket].push(i);
            }
            PostalBuckets { members, slots }
        });
        Self { records, buckets }
    }

    // Partners are visited in ascending j, so rows scanned in ascending i
    // produce candidates in the same order as the full scan.
    fn for_each_partner(&self, i: usize, mut f: impl FnMut(usize)) {
        match &self.buckets {
            None => (i + 1..self.records.len()).for_each(&mut f),
            Some(buckets) => {
                let (bucket, position) = buckets.slots[i];
                buckets.members[bucket][position + 1..]
                    .iter()
                    .copied()
                    .for_each(&mut f);
            }
        }
    }

    fn total_cost(&self) -> usize {
        match &self.buckets {
            None => total_pairs(self.records.len()),
            Some(buckets) => buckets.members.iter().map(|m| total_pairs(m.len())).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::manager::normalize_record;
    use crate::models::records::RawRecord;
    use std::sync::{Arc, Mutex};

    fn normalized(rows: &[(&str, &str, &str)]) -> Vec<NormalizedRecord> {
        rows.iter()
            .map(|(name, address, zip)| normalize_record(&RawRecord::new(*name, *address, *zip)))
            .collect()
    }

    fn sample_records() -> Vec<NormalizedRecord> {
        normalized(&[
            ("Acme Inc", "123 Main St", "90210"),
            ("Best Services", "500 Oak Ave", "10001"),
            ("Acme", "123 Main Street", "90210"),
            ("Acme", "123 Main St", "10001"),
            ("Best Services LLC", "500 Oak Ave", "10001"),
            ("Acme Corp", "123 Main St.", "90210-4444"),
        ])
    }

    #[test]
    fn test_acme_pair_is_flagged_at_default_threshold() {
        let records = normalized(&[
            ("Acme Inc", "123 Main St", "90210"),
            ("Acme", "123 Main Street", "90210"),
        ]);
        let candidates = DuplicateDetector::default().find_duplicates(&records);
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!((candidate.index_a, candidate.index_b), (0, 1));
        assert_eq!(candidate.name_similarity, 100);
        assert_eq!(candidate.address_similarity, 85);
        assert_eq!(candidate.record_a.original_name, "Acme Inc");
        assert_eq!(candidate.record_b.original_address, "123 Main Street");
    }

    #[test]
    fn test_postal_code_mismatch_is_never_a_candidate() {
        let records = normalized(&[
            ("Acme", "123 Main St", "90210"),
            ("Acme", "123 Main St", "10001"),
        ]);
        let detector = DuplicateDetector::new(DetectorConfig::with_threshold(0).unwrap()).unwrap();
        let score = detector.compare(&records[0], &records[1]);
        assert_eq!(score.name_similarity, 100);
        assert_eq!(score.address_similarity, 100);
        assert!(!score.postal_code_match);
        assert!(detector.find_duplicates(&records).is_empty());
    }

    #[test]
    fn test_output_order_is_enumeration_order() {
        let candidates = DuplicateDetector::default().find_duplicates(&sample_records());
        let pairs: Vec<(usize, usize)> = candidates.iter().map(|c| (c.index_a, c.index_b)).collect();
        assert_eq!(pairs, vec![(0, 2), (0, 5), (1, 4), (2, 5)]);
    }

    #[test]
    fn test_pair_completeness() {
        let detector = DuplicateDetector::default();
        for n in 0..6 {
            let records: Vec<_> = sample_records().into_iter().take(n).collect();
            let (candidates, stats) = detector.detect(&records, None);
            assert_eq!(stats.pairs_considered, n * n.saturating_sub(1) / 2);
            assert_eq!(stats.pairs_scored, stats.pairs_considered);
            if n < 2 {
                assert!(candidates.is_empty());
            }
        }
    }

    #[test]
    fn test_threshold_boundaries() {
        let records = normalized(&[
            ("Acme Inc", "123 Main St", "90210"),
            ("Acme", "123 Main Street", "90210"),
        ]);
        assert_eq!(find_duplicates(&records, 85).unwrap().len(), 1);
        assert!(find_duplicates(&records, 86).unwrap().is_empty());
        assert!(find_duplicates(&records, 101).is_err());
        assert!(DuplicateDetector::new(DetectorConfig {
            threshold: Threshold::default(),
            ..Default::default()
        })
        .is_ok());
    }

    #[test]
    fn test_empty_fields_never_match() {
        let records = normalized(&[("Inc", "", ""), ("LLC", "", "")]);
        let detector = DuplicateDetector::new(DetectorConfig::with_threshold(0).unwrap()).unwrap();
        let score = detector.compare(&records[0], &records[1]);
        assert_eq!(score.name_similarity, 0);
        assert_eq!(score.address_similarity, 0);
        assert!(score.postal_code_match);
        // Threshold 0 still accepts a zero score
        assert_eq!(detector.find_duplicates(&records).len(), 1);
        assert!(DuplicateDetector::default().find_duplicates(&records).is_empty());
    }

    #[test]
    fn test_bucketing_and_parallel_scoring_preserve_output() {
        let records = sample_records();
        let baseline = DuplicateDetector::default().detect(&records, None);

        for (bucket, workers) in [(true, 1), (false, 3), (true, 4), (false, 0)] {
            let config = DetectorConfig {
                bucket_by_postal_code: bucket,
                workers,
                ..Default::default()
            };
            let (candidates, stats) = DuplicateDetector::new(config).unwrap().detect(&records, None);
            assert_eq!(candidates, baseline.0, "bucket={} workers={}", bucket, workers);
            assert_eq!(stats.pairs_considered, 15);
            if bucket {
                // 90210 x3, 10001 x3
                assert_eq!(stats.postal_buckets, Some(2));
                assert_eq!(stats.pairs_scored, 6);
            } else {
                assert_eq!(stats.pairs_scored, 15);
            }
        }
    }

    #[test]
    fn test_parallel_scoring_keeps_row_order() {
        // Enough rows that the pool interleaves work across threads
        let mut rows = Vec::new();
        for i in 0..60 {
            let zip = if i % 3 == 0 { "90210" } else { "10001" };
            rows.push((format!("Acme {}", i % 4), format!("{} Main St", 100 + i % 5), zip));
        }
        let records: Vec<NormalizedRecord> = rows
            .iter()
            .map(|(name, address, zip)| normalize_record(&RawRecord::new(name.as_str(), address.as_str(), *zip)))
            .collect();

        let (baseline, baseline_stats) = DuplicateDetector::default().detect(&records, None);
        assert!(!baseline.is_empty());
        for workers in [2, 4, 8] {
            let config = DetectorConfig {
                workers,
                ..Default::default()
            };
            let (candidates, stats) = DuplicateDetector::new(config).unwrap().detect(&records, None);
            assert_eq!(candidates, baseline, "workers={}", workers);
            assert_eq!(stats.pairs_scored, baseline_stats.pairs_scored);
            assert_eq!(stats.avg_name_similarity, baseline_stats.avg_name_similarity);
        }
    }

    #[test]
    fn test_parallel_progress_reaches_every_row() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |_phase: String, details: Option<String>| {
            if let Some(details) = details {
                seen_clone.lock().unwrap().push(details);
            }
        });
        let records = sample_records();
        let config = DetectorConfig {
            workers: 3,
            ..Default::default()
        };
        DuplicateDetector::new(config).unwrap().detect(&records, Some(callback));
        assert!(seen.lock().unwrap().iter().any(|d| d == "6/6"));
    }
}
