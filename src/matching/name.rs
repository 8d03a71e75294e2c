// src/matching/name.rs - Business name normalization
use once_cell::sync::Lazy;
use regex::Regex;

pub const BUSINESS_SUFFIXES: [&str; 4] = ["inc", "llc", "ltd", "corp"];

static NON_WORD_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\p{Alphabetic}\p{Nd}\p{Nl}\p{No}\s]").expect("valid punctuation pattern")
});

static SUFFIX_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?:{})\b", BUSINESS_SUFFIXES.join("|"))).expect("valid suffix pattern")
});

/// Lowercases, strips punctuation, collapses whitespace and drops the
/// whole-word business suffixes. Never fails; `""` maps to `""`.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = NON_WORD_CHARS.replace_all(&lowered, "");
    let collapsed = collapse_whitespace(&stripped);
    let without_suffixes = SUFFIX_TOKENS.replace_all(&collapsed, "");
    // Suffix removal can leave a double space behind ("acme inc co")
    collapse_whitespace(&without_suffixes)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
