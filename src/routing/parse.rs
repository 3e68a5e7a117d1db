//! Lenient parsing of free-text model replies
//!
//! Models answer routing prompts in prose, so parsing never fails: a
//! boolean is true only when the reply starts with "true", and list items
//! are taken one per line.

use regex::Regex;
use std::sync::OnceLock;

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "- ", "* ", "• ", "1. ", "2) "
    RE.get_or_init(|| Regex::new(r"^(?:[-*•–—]+|\d+[.)])\s*").expect("valid bullet regex"))
}

/// True only when the lowercased, trimmed reply starts with `true`
pub fn parse_lenient_bool(reply: &str) -> bool {
    reply.trim().to_lowercase().starts_with("true")
}

/// One item per non-blank line, bullet markers and surrounding whitespace
/// removed. May return an empty list.
pub fn parse_subqueries(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .map(|line| bullet_re().replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
