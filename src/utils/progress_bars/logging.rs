// src/utils/progress_bars/logging.rs - Logging helpers for the normalization and detection phases
use log::{info, warn};
use std::time::Instant;

use crate::models::stats_models::DetectionStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DedupeStage {
    Normalize,
    Detect,
}

#[derive(Clone)]
pub struct DetectionLogger {
    stage_name: &'static str,
    stage_emoji: &'static str,
    start_time: Instant,
}

impl DetectionLogger {
    pub fn new(stage: DedupeStage) -> Self {
        let (stage_name, stage_emoji) = match stage {
            DedupeStage::Normalize => ("NORMALIZE", "🧹"),
            DedupeStage::Detect => ("DETECT", "👥"),
        };

        Self {
            stage_name,
            stage_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, record_count: usize, threshold: u8) {
        info!(
            "[{}] {} 🚀 Starting {} over {} records (threshold: {})",
            self.stage_name,
            self.stage_emoji,
            self.stage_name.to_lowercase(),
            record_count,
            threshold
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        let msg = if let Some(details) = details {
            format!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, details, elapsed.as_secs_f32()
            )
        } else {
            format!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, elapsed.as_secs_f32()
            )
        };
        info!("{}", msg);
    }

    pub fn log_pair_generation(&self, pairs_considered: usize, pairs_to_score: usize) {
        info!(
            "[{}] {} 📈 Pairs considered: {} ({} to score)",
            self.stage_name, self.stage_emoji, pairs_considered, pairs_to_score
        );
    }

    pub fn log_bucketing(&self, bucket_count: usize, largest_bucket: usize) {
        info!(
            "[{}] {} 🏷️  Postal buckets: {} unique postal codes, largest: {} records",
            self.stage_name, self.stage_emoji, bucket_count, largest_bucket
        );
    }

    pub fn log_workers(&self, workers: usize) {
        if workers > 1 {
            info!(
                "[{}] {} ⚙️  Scoring pairs on a pool of {} threads",
                self.stage_name, self.stage_emoji, workers
            );
        }
    }

    pub fn log_completion(&self, stats: &DetectionStats) {
        let duration = self.start_time.elapsed();
        info!(
            "[{}] {} 🎉 COMPLETED: {} duplicate candidates in {:.2?}",
            self.stage_name, self.stage_emoji, stats.candidates, duration
        );
        info!(
            "[{}] {} 📊 Results: {} pairs scored, avg name similarity: {:.1}, avg address similarity: {:.1}",
            self.stage_name,
            self.stage_emoji,
            stats.pairs_scored,
            stats.avg_name_similarity,
            stats.avg_address_similarity
        );
    }

    pub fn log_data_quality_issue(&self, issue_type: &str, count: usize) {
        if count > 0 {
            warn!(
                "[{}] {} ⚠️  Data quality: {} instances of {}",
                self.stage_name, self.stage_emoji, count, issue_type
            );
        }
    }
}
