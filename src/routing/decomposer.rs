//! Splits compound queries into independent sub-queries
//!
//! Two sequential calls: a yes/no check, then the split itself. Only the
//! check can short-circuit; the split runs only after a "true".

use crate::llm::Generator;
use crate::routing::parse::{parse_lenient_bool, parse_subqueries};
use crate::telemetry::{Stage, TelemetryCollector};
use crate::types::{ChatMessage, SubqueryList};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

const CHECK_TEMPLATE: &str = r#"Ты — эксперт по обработке запросов.
Если запрос сложный и стоит разбить его на под‑вопросы — 'true', иначе — 'false'.

Примеры:
Запрос: "Расскажи о новых политиках отпуска и сколько дней теперь положено?"
Ответ: true

Запрос: "Что такое GDPR?"
Ответ: false

Теперь оцени:
Запрос: "{query}"
Ответ:"#;

const DECOMPOSE_TEMPLATE: &str = r#"Ты — специалист по декомпозиции.
Разбей запрос на короткие независимые под‑вопросы, каждый на новой строке.

Примеры:
Оригинал: "Расскажи о новых политиках отпуска и сколько дней теперь положено?"
- Расскажи о новых политиках отпуска.
- Сколько дней отпуска теперь положено?

Теперь разбей:
Оригинал: "{query}""#;

/// LLM query decomposer
pub struct QueryDecomposer {
    generator: Arc<dyn Generator>,
    telemetry: TelemetryCollector,
}

impl QueryDecomposer {
    pub fn new(generator: Arc<dyn Generator>, telemetry: TelemetryCollector) -> Self {
        Self {
            generator,
            telemetry,
        }
    }

    pub fn check_prompt(query: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::user(CHECK_TEMPLATE.replace("{query}", query))]
    }

    pub fn decompose_prompt(query: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::user(DECOMPOSE_TEMPLATE.replace("{query}", query))]
    }

    /// Sub-queries for `query`, never empty.
    ///
    /// A negative or ambiguous check, a blank split, or a failed call all
    /// yield `[query]`; the query can still be answered as a whole.
    pub async fn decompose(&self, query: &str) -> SubqueryList {
        let started = Instant::now();
        let list = self.split(query).await;
        self.telemetry.stage(Stage::Decomposition, list.len(), started);
        debug!(subqueries = list.len(), "query decomposed");
        list
    }

    async fn split(&self, query: &str) -> SubqueryList {
        let check = match self.generator.generate(&Self::check_prompt(query)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "decomposition check failed, answering as one query");
                return SubqueryList::single(query);
            }
        };

        if !parse_lenient_bool(&check) {
            return SubqueryList::single(query);
        }

        match self.generator.generate(&Self::decompose_prompt(query)).await {
            Ok(reply) => SubqueryList::from_parts(query, parse_subqueries(&reply)),
            Err(e) => {
                warn!(error = %e, "decomposition failed, answering as one query");
                SubqueryList::single(query)
            }
        }
    }
}
