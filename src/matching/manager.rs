// src/matching/manager.rs - Normalization pass followed by duplicate detection
use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::matching::address::{classify_address, AddressNormalization};
use crate::matching::detector::DuplicateDetector;
use crate::matching::name::normalize_name;
use crate::matching::postal::normalize_postal_code;
use crate::models::records::{DuplicateCandidate, DuplicateReportRow, NormalizedRecord, RawRecord};
use crate::models::stats_models::DetectionStats;
use crate::update_progress;
use crate::utils::detector_config::DetectorConfig;
use crate::utils::progress_bars::logging::{DedupeStage, DetectionLogger};
use crate::utils::progress_bars::progress_callback::ProgressCallback;

pub fn normalize_record(record: &RawRecord) -> NormalizedRecord {
    normalize_with_outcome(record).0
}

fn normalize_with_outcome(record: &RawRecord) -> (NormalizedRecord, AddressNormalization) {
    let address = classify_address(&record.address);
    let normalized = NormalizedRecord {
        original_name: record.name.clone(),
        original_address: record.address.clone(),
        original_postal_code: record.postal_code.clone(),
        normalized_name: normalize_name(&record.name),
        normalized_address: address.normalized(&record.address),
        normalized_postal_code: normalize_postal_code(&record.postal_code),
    };
    (normalized, address)
}

/// One normalized record per input record, in input order.
pub fn normalize_records(records: &[RawRecord]) -> Vec<NormalizedRecord> {
    records.iter().map(normalize_record).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub normalized: Vec<NormalizedRecord>,
    pub candidates: Vec<DuplicateCandidate>,
    pub stats: DetectionStats,
}

impl PipelineOutput {
    pub fn report_rows(&self) -> Vec<DuplicateReportRow> {
        self.candidates.iter().map(DuplicateCandidate::to_report_row).collect()
    }

    pub fn report_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.report_rows())
            .context("Failed to serialize duplicate report")
    }
}

/// Normalizes `records`, then flags duplicate pairs according to `config`.
pub fn run_pipeline(
    records: &[RawRecord],
    config: &DetectorConfig,
    progress_callback: Option<ProgressCallback>,
) -> Result<PipelineOutput> {
    let detector = DuplicateDetector::new(config.clone())
        .context("Duplicate detection pipeline could not start")?;
    config.log_config();

    let logger = DetectionLogger::new(DedupeStage::Normalize);
    logger.log_start(records.len(), config.threshold.value());
    update_progress!(progress_callback, "Normalizing", format!("{} records", records.len()));

    let mut address_fallbacks = 0;
    let normalized: Vec<NormalizedRecord> = records
        .iter()
        .map(|record| {
            let (normalized, address) = normalize_with_outcome(record);
            if !address.is_parsed() {
                address_fallbacks += 1;
            }
            normalized
        })
        .collect();
    logger.log_data_quality_issue("addresses kept in raw form", address_fallbacks);
    logger.log_phase("Normalization complete", Some(&format!("{} records", normalized.len())));

    let (candidates, mut stats) = detector.detect(&normalized, progress_callback);
    stats.address_fallbacks = address_fallbacks;

    info!(
        "Duplicate detection complete: {} records, {} candidates ({} address fallbacks)",
        stats.records, stats.candidates, stats.address_fallbacks
    );

    Ok(PipelineOutput {
        normalized,
        candidates,
        stats,
    })
}
