//! Fuzzy matching utilities for utterance comparison

use strsim::normalized_levenshtein;

/// Normalize text for duplicate detection:
/// lowercase, internal whitespace collapsed to single spaces, trimmed.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Length in characters, not bytes
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Whether either string contains the other, provided the contained one
/// is at least `min_chars` long.
pub fn contains_either(a: &str, b: &str, min_chars: usize) -> bool {
    let (shorter, longer) = if char_len(a) <= char_len(b) {
        (a, b)
    } else {
        (b, a)
    };

    char_len(shorter) >= min_chars && longer.contains(shorter)
}

/// Calculate similarity score between two already-normalized strings
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}
