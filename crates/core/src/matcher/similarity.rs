use std::collections::BTreeSet;

use super::normalize::query_words;

/// Overlap at or above which two queries count as similar.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

/// Words at least this long also match by containment.
const PARTIAL_WORD_LEN: usize = 5;

fn word_set(s: &str) -> BTreeSet<String> {
    query_words(s).into_iter().collect()
}

fn words_related(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    a.chars().count() >= PARTIAL_WORD_LEN
        && b.chars().count() >= PARTIAL_WORD_LEN
        && (a.contains(b) || b.contains(a))
}

/// Word overlap between two queries, in `0.0..=1.0`.
///
/// Counts the words of `query` that have a related word in `existing`, and
/// divides by the size of the smaller word set. Returns `None` when either
/// side has no significant words.
pub fn overlap(query: &str, existing: &str) -> Option<f64> {
    let query_set = word_set(query);
    let existing_set = word_set(existing);
    if query_set.is_empty() || existing_set.is_empty() {
        return None;
    }

    let common = query_set
        .iter()
        .filter(|q| existing_set.iter().any(|e| words_related(q, e)))
        .count();
    let denominator = query_set.len().min(existing_set.len());

    Some((common as f64 / denominator as f64).min(1.0))
}

/// Whether two queries are close enough to warrant a confirmation prompt.
pub fn is_similar(query: &str, existing: &str) -> bool {
    overlap(query, existing).is_some_and(|score| score >= SIMILARITY_THRESHOLD)
}
