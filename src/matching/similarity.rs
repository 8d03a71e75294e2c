// src/matching/similarity.rs - 0-100 string similarity scoring
use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};

/// Scoring function used to compare normalized fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityScorer {
    /// Indel-normalized Levenshtein ratio, the scale `fuzz.ratio` reports.
    #[default]
    Ratio,
    /// `1 - levenshtein / max_len`.
    Levenshtein,
    JaroWinkler,
}

impl SimilarityScorer {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "ratio" | "indel" => Some(Self::Ratio),
            "levenshtein" => Some(Self::Levenshtein),
            "jaro_winkler" | "jaro-winkler" | "jarowinkler" => Some(Self::JaroWinkler),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ratio => "ratio",
            Self::Levenshtein => "levenshtein",
            Self::JaroWinkler => "jaro_winkler",
        }
    }

    /// Scores two strings on the 0-100 scale. If either side is empty the score is 0.
    pub fn score(&self, a: &str, b: &str) -> u8 {
        if a.is_empty() || b.is_empty() {
            return 0;
        }
        let fraction = match self {
            Self::Ratio => indel_ratio(a, b),
            Self::Levenshtein => normalized_levenshtein(a, b),
            Self::JaroWinkler => jaro_winkler(a, b),
        };
        to_percent(fraction)
    }
}

/// Default similarity ratio between two strings, 0-100.
pub fn similarity_ratio(a: &str, b: &str) -> u8 {
    SimilarityScorer::Ratio.score(a, b)
}

/// `(len_a + len_b - indel_distance) / (len_a + len_b)` over chars, where the
/// indel distance counts insertions and deletions only (`len_a + len_b - 2 * lcs`).
fn indel_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let len_sum = a_chars.len() + b_chars.len();
    if len_sum == 0 {
        return 1.0;
    }
    let distance = len_sum - 2 * lcs_length(&a_chars, &b_chars);
    (len_sum - distance) as f64 / len_sum as f64
}

fn lcs_length(a: &[char], b: &[char]) -> usize {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];

    for &lc in long {
        for (j, &sc) in short.iter().enumerate() {
            curr[j + 1] = if lc == sc {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[short.len()]
}

// Half-to-even rounding keeps boundary scores (e.g. 87.5) on the reference scale.
fn to_percent(fraction: f64) -> u8 {
    (100.0 * fraction).round_ties_even().clamp(0.0, 100.0) as u8
}
