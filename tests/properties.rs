use dedupe_lib::{normalize_address, normalize_name, normalize_zip, similarity_ratio};
use proptest::prelude::*;

const SUFFIXES: &[&str] = &["inc", "llc", "ltd", "corp"];

/// Business-name-like text: words, suffixes in assorted casing, punctuation,
/// digit runs and non-ASCII letters, glued together without fixed spacing.
fn business_name() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        "[a-zA-Z]{1,8}",
        Just("Inc.".to_string()),
        Just("LLC".to_string()),
        Just("ltd".to_string()),
        Just("Corp,".to_string()),
        Just("incline".to_string()),
        "[éüßñøçÅ日本]{1,4}",
        "[0-9]{1,6}",
        "[ ,.&!'_/()-]{1,3}",
        "[ \t]{1,2}",
    ];
    prop::collection::vec(piece, 0..10).prop_map(|parts| parts.concat())
}

fn postal_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof!["[0-9]{1,10}", "[a-zA-Z :-]{1,4}", "[٣٤]{1,5}"], 0..5)
        .prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn test_name_normalization_is_idempotent(raw in business_name()) {
        let once = normalize_name(&raw);
        prop_assert_eq!(normalize_name(&once), once.clone());
    }

    #[test]
    fn test_normalized_name_has_no_punctuation_or_suffixes(raw in business_name()) {
        let normalized = normalize_name(&raw);
        prop_assert!(normalized.chars().all(|c| c.is_alphanumeric() || c == ' '), "{:?}", normalized);
        prop_assert!(!normalized.contains("  "));
        prop_assert_eq!(normalized.trim(), normalized.as_str());
        for word in normalized.split(' ') {
            prop_assert!(!SUFFIXES.contains(&word), "{:?} kept suffix {:?}", normalized, word);
        }
    }

    #[test]
    fn test_zip_is_five_digits_or_raw(raw in postal_text()) {
        let zip = normalize_zip(&raw);
        let five_digits = zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit());
        prop_assert!(five_digits || zip == raw, "{:?} -> {:?}", raw, zip);
        if five_digits {
            prop_assert!(raw.contains(zip.as_str()));
        }
    }

    #[test]
    fn test_ratio_is_symmetric_and_bounded(a in business_name(), b in business_name()) {
        let ab = similarity_ratio(&a, &b);
        prop_assert_eq!(ab, similarity_ratio(&b, &a));
        prop_assert!(ab <= 100);
    }

    #[test]
    fn test_ratio_of_text_with_itself_is_100(a in business_name()) {
        prop_assume!(!a.is_empty());
        prop_assert_eq!(similarity_ratio(&a, &a), 100);
    }

    #[test]
    fn test_address_with_content_never_normalizes_to_empty(
        raw in "[0-9]{0,4}( [A-Za-z#]{1,6}){0,5}( [0-9]{1,5})?"
    ) {
        prop_assume!(raw.chars().any(char::is_alphanumeric));
        prop_assert!(!normalize_address(&raw).is_empty(), "{:?}", raw);
    }
}
