//! Query normalization and lexical tokenization

use regex::Regex;
use std::sync::OnceLock;

/// Word runs, or runs of punctuation. Unicode-aware, so Cyrillic words
/// are single tokens.
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w+|[^\w\s]+").expect("token pattern is valid"))
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\w+$").expect("word pattern is valid"))
}

/// Generic word tokenization used by the BM25 index and lexical queries.
///
/// Punctuation is kept as separate tokens; callers lowercase first.
pub fn tokenize(text: &str) -> Vec<String> {
    token_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Lowercase, tokenize and keep only word/number tokens, joined by single
/// spaces. Empty input yields an empty string.
pub fn normalize(query: &str) -> String {
    let lowered = query.to_lowercase();
    tokenize(&lowered)
        .into_iter()
        .filter(|token| word_pattern().is_match(token))
        .collect::<Vec<_>>()
        .join(" ")
}
