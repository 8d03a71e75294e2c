// src/lib.rs - Business record normalization and duplicate detection
pub mod matching;
pub mod models;
pub mod utils;

pub use matching::address::{classify_address, normalize_address, AddressNormalization};
pub use matching::detector::DuplicateDetector;
pub use matching::manager::{normalize_record, normalize_records, run_pipeline, PipelineOutput};
pub use matching::name::normalize_name;
pub use matching::postal::{normalize_postal_code, normalize_zip};
pub use matching::similarity::{similarity_ratio, SimilarityScorer};
pub use models::records::{DuplicateCandidate, DuplicateReportRow, NormalizedRecord, RawRecord};
pub use utils::detector_config::{DetectorConfig, Threshold};
