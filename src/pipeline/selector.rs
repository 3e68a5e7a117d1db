//! Picks the one authoritative reply among the branch exits

/// Response selector
///
/// Precedence: multi (non-empty) > rag > chat > "".
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseSelector;

impl ResponseSelector {
    pub fn new() -> Self {
        Self
    }

    pub fn select(&self, chat: Option<String>, rag: Option<String>, multi: Option<String>) -> String {
        multi
            .filter(|reply| !reply.is_empty())
            .or(rag)
            .or(chat)
            .unwrap_or_default()
    }
}
