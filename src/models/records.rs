// src/models/records.rs
// Record types flowing through normalization and duplicate detection

use serde::{Deserialize, Serialize};
use std::fmt;

/// A business entry as received from the record source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub name: String,
    pub address: String,
    pub postal_code: String,
}

impl RawRecord {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            postal_code: postal_code.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub original_name: String,
    pub original_address: String,
    pub original_postal_code: String,
    pub normalized_name: String,
    pub normalized_address: String,
    pub normalized_postal_code: String,
}

impl NormalizedRecord {
    /// "name | address | postal" built from the original, pre-normalization values.
    pub fn summary(&self) -> String {
        format!(
            "{} | {} | {}",
            self.original_name, self.original_address, self.original_postal_code
        )
    }
}

impl fmt::Display for NormalizedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// A pair of records (index_a < index_b) that cleared the match predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub index_a: usize,
    pub index_b: usize,
    pub record_a: NormalizedRecord,
    pub record_b: NormalizedRecord,
    pub name_similarity: u8,
    pub address_similarity: u8,
}

impl DuplicateCandidate {
    pub fn to_report_row(&self) -> DuplicateReportRow {
        DuplicateReportRow {
            business_1: self.record_a.summary(),
            business_2: self.record_b.summary(),
            name_similarity: self.name_similarity,
            address_similarity: self.address_similarity,
        }
    }
}

/// One line of the potential-duplicates report handed to the report writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReportRow {
    #[serde(rename = "Business 1")]
    pub business_1: String,
    #[serde(rename = "Business 2")]
    pub business_2: String,
    #[serde(rename = "Name Similarity")]
    pub name_similarity: u8,
    #[serde(rename = "Address Similarity")]
    pub address_similarity: u8,
}
