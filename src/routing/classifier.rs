//! Decides whether a query needs the knowledge base at all

use crate::errors::Result;
use crate::llm::Generator;
use crate::routing::parse::parse_lenient_bool;
use crate::telemetry::{Stage, TelemetryCollector};
use crate::types::ChatMessage;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

const CLASSIFY_TEMPLATE: &str = r#"Ты — классификатор запросов по базе знаний.
Если запрос требует поиска — ответь 'true'. Если можно ответить без поиска — 'false'.

Примеры:
Запрос: "Привет"
Ответ: false

Запрос: "Как дела?"
Ответ: false

Запрос: "Что такое GDPR?"
Ответ: true

Запрос: "Сколько дней отпуска положено сотрудникам?"
Ответ: true

Теперь классифицируй:
Запрос: "{query}"
Ответ:"#;

/// Few-shot search classifier
pub struct QueryClassifier {
    generator: Arc<dyn Generator>,
    telemetry: TelemetryCollector,
}

impl QueryClassifier {
    pub fn new(generator: Arc<dyn Generator>, telemetry: TelemetryCollector) -> Self {
        Self {
            generator,
            telemetry,
        }
    }

    pub fn prompt(query: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::user(CLASSIFY_TEMPLATE.replace("{query}", query))]
    }

    /// One generation call. Anything but a reply starting with "true" means
    /// no search; a failed call is returned as an error.
    pub async fn needs_search(&self, query: &str) -> Result<bool> {
        let started = Instant::now();
        let reply = self.generator.generate(&Self::prompt(query)).await?;
        let needs_search = parse_lenient_bool(&reply);

        self.telemetry.stage(Stage::Classification, 1, started);
        debug!(needs_search, reply = %reply.trim(), "query classified");
        Ok(needs_search)
    }
}
