//! Configuration for the duplicate detector.
//! Defaults match the reference behaviour (threshold 80, ratio scorer, sequential scan).

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::env;

use crate::matching::similarity::SimilarityScorer;

pub const DEFAULT_THRESHOLD: u8 = 80;
pub const MAX_THRESHOLD: u8 = 100;

/// Minimum similarity (0-100) both name and address must reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Threshold(u8);

impl Threshold {
    pub fn new(value: u8) -> Result<Self> {
        if value > MAX_THRESHOLD {
            bail!(
                "Similarity threshold must be within 0..={}, got {}",
                MAX_THRESHOLD,
                value
            );
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub threshold: Threshold,
    pub scorer: SimilarityScorer,
    /// Only score pairs sharing a normalized postal code. Output is unchanged.
    pub bucket_by_postal_code: bool,
    /// Scoring threads. 1 scans sequentially, 0 uses every available core.
    pub workers: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            scorer: SimilarityScorer::default(),
            bucket_by_postal_code: false,
            workers: 1,
        }
    }
}

impl DetectorConfig {
    pub fn with_threshold(threshold: u8) -> Result<Self> {
        Ok(Self {
            threshold: Threshold::new(threshold)?,
            ..Default::default()
        })
    }

    /// Create configuration from environment variables.
    /// Malformed values are reported and replaced by their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let threshold = match env::var("DEDUPE_THRESHOLD") {
            Ok(raw) => match raw.trim().parse::<u8>().map_err(anyhow::Error::from).and_then(Threshold::new) {
                Ok(t) => t,
                Err(e) => {
                    warn!("Ignoring DEDUPE_THRESHOLD='{}': {}", raw, e);
                    defaults.threshold
                }
            },
            Err(_) => defaults.threshold,
        };

        let scorer = match env::var("DEDUPE_SCORER") {
            Ok(raw) => SimilarityScorer::parse(&raw).unwrap_or_else(|| {
                warn!("Ignoring unknown DEDUPE_SCORER='{}'", raw);
                defaults.scorer
            }),
            Err(_) => defaults.scorer,
        };

        let bucket_by_postal_code = match env::var("DEDUPE_BUCKET_BY_POSTAL") {
            Ok(raw) => raw.trim().parse::<bool>().unwrap_or_else(|e| {
                warn!("Ignoring DEDUPE_BUCKET_BY_POSTAL='{}': {}", raw, e);
                defaults.bucket_by_postal_code
            }),
            Err(_) => defaults.bucket_by_postal_code,
        };

        let workers = match env::var("DEDUPE_WORKERS") {
            Ok(raw) => raw.trim().parse::<usize>().unwrap_or_else(|e| {
                warn!("Ignoring DEDUPE_WORKERS='{}': {}", raw, e);
                defaults.workers
            }),
            Err(_) => defaults.workers,
        };

        debug!(
            "Detector config: threshold={}, scorer={:?}, bucket_by_postal_code={}, workers={}",
            threshold.value(),
            scorer,
            bucket_by_postal_code,
            workers
        );

        Self {
            threshold,
            scorer,
            bucket_by_postal_code,
            workers,
        }
    }

    pub fn validate(&self) -> Result<()> {
        Threshold::new(self.threshold.value()).context("Invalid detector configuration")?;
        Ok(())
    }

    /// Worker count with `0` resolved to the number of CPUs.
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            0 => num_cpus::get().max(1),
            n => n,
        }
    }

    pub fn log_config(&self) {
        info!(
            "🔍 Duplicate detection: threshold={}, scorer={}",
            self.threshold.value(),
            self.scorer.name()
        );
        if self.bucket_by_postal_code {
            info!("   Postal-code bucketing ENABLED (pairs across postal codes are skipped)");
        }
        if self.effective_workers() > 1 {
            info!("   Scoring pairs on {} worker threads", self.effective_workers());
        }
    }
}
