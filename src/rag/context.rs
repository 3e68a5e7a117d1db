// Prompt assembly for conversational, grounded and synthesis generation calls
use crate::types::{ChatMessage, Document};

/// Returned when no sub-query produced an answer
pub const NO_RESULTS_MESSAGE: &str = "Извините, по вашему запросу ничего не найдено.";

const CONVERSATIONAL_SYSTEM: &str = "Ты — дружелюбный помощник.";
const EXPERT_SYSTEM: &str = "Ты — эксперт по базе знаний.";
const ANSWER_INSTRUCTION: &str = "Ответь подробно и укажи источники:";
const EMPTY_CONTEXT: &str = "- (в базе знаний ничего не найдено)";

/// Default cap on context characters
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 12_000;

/// Builds role-tagged message lists for the generation backend
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_context_chars: usize,
}

impl PromptBuilder {
    pub fn new(max_context_chars: usize) -> Self {
        Self { max_context_chars }
    }

    pub fn max_context_chars(&self) -> usize {
        self.max_context_chars
    }

    /// Plain chat, no retrieval
    pub fn conversational(&self, query: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(CONVERSATIONAL_SYSTEM),
            ChatMessage::user(query),
        ]
    }

    /// Question plus retrieved context, one bullet per document
    pub fn grounded(&self, query: &str, documents: &[Document]) -> Vec<ChatMessage> {
        let context = self.context_block(documents);
        vec![
            ChatMessage::system(EXPERT_SYSTEM),
            ChatMessage::user(format!(
                "Вопрос: {}\n\nКонтекст:\n{}\n\n{}",
                query, context, ANSWER_INSTRUCTION
            )),
        ]
    }

    /// Combine partial answers. `parts` holds (1-based sub-query position,
    /// sub-query, answer) for the sub-queries that succeeded.
    pub fn synthesis(&self, original_query: &str, parts: &[(usize, &str, &str)]) -> Vec<ChatMessage> {
        let mut prompt = format!(
            "На основе ответов на части вопроса «{}» собери единый связный ответ:\n",
            original_query
        );
        for (position, subquery, answer) in parts {
            prompt.push_str(&format!("Часть {} ({}): {}\n", position, subquery, answer));
        }
        vec![ChatMessage::user(prompt)]
    }

    /// Format documents until the character budget runs out.
    ///
    /// The first document is always present, cut to the budget if it is
    /// larger on its own.
    fn context_block(&self, documents: &[Document]) -> String {
        if documents.is_empty() {
            return EMPTY_CONTEXT.to_string();
        }

        let mut lines: Vec<String> = Vec::new();
        let mut used = 0;

        for doc in documents {
            let line = Self::format_document(doc);
            let len = line.chars().count();

            if used + len > self.max_context_chars {
                if lines.is_empty() {
                    lines.push(line.chars().take(self.max_context_chars).collect());
                }
                break;
            }

            used += len + 1;
            lines.push(line);
        }

        lines.join("\n")
    }

    fn format_document(doc: &Document) -> String {
        match doc.source() {
            Some(source) => format!("- {} (источник: {})", doc.content.trim(), source),
            None => format!("- {}", doc.content.trim()),
        }
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTEXT_CHARS)
    }
}
