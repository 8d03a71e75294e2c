// src/matching/postal.rs - Postal code normalization
use once_cell::sync::Lazy;
use regex::Regex;

// The surrounding groups stand in for digit-boundary lookarounds, which `regex` lacks.
static FIVE_DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^0-9])([0-9]{5})(?:[^0-9]|$)").expect("valid postal pattern"));

/// Returns the first standalone run of exactly five ASCII digits, or the raw
/// input unchanged when there is none.
pub fn normalize_postal_code(raw: &str) -> String {
    match FIVE_DIGIT_RUN.captures(raw).and_then(|caps| caps.get(1)) {
        Some(m) => m.as_str().to_string(),
        None => raw.to_string(),
    }
}

/// Alias kept for callers that think in US ZIP terms.
pub fn normalize_zip(raw: &str) -> String {
    normalize_postal_code(raw)
}
