/// Query words shorter than this are ignored.
pub const MIN_WORD_LEN: usize = 3;

/// Canonical query text: lowercase with whitespace runs collapsed to one space.
pub fn canonical(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Storage-key form: lowercase with whitespace runs collapsed to one `+`.
pub fn storage_key(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join("+")
}

/// Matching form: lowercase, with `.`, `-`, `_` and whitespace runs collapsed
/// to one space and trimmed.
pub fn match_form(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| c.is_whitespace() || matches!(c, '.' | '-' | '_'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Significant words of a query in matching form.
pub fn query_words(s: &str) -> Vec<String> {
    match_form(s)
        .split(' ')
        .filter(|word| word.chars().count() >= MIN_WORD_LEN)
        .map(str::to_string)
        .collect()
}

/// Whether `release_name` satisfies `query`.
///
/// Every significant query word must appear as a substring of the release
/// name in matching form. Order does not matter. A query with no significant
/// words matches nothing.
pub fn matches(query: &str, release_name: &str) -> bool {
    let words = query_words(query);
    if words.is_empty() {
        return false;
    }

    let name = match_form(release_name);
    words.iter().all(|word| name.contains(word.as_str()))
}
