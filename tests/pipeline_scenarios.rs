//! End-to-end routing scenarios over scripted backends

mod common;

use chathrd::rag::NO_RESULTS_MESSAGE;
use chathrd::retrieval::{
    Bm25Params, LexicalIndex, LexicalRetriever, RetrievalSource, SemanticRetriever,
};
use chathrd::{Branch, RagError};
use common::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

fn counting_pair() -> (Arc<CountingRetriever>, Arc<CountingRetriever>) {
    (
        CountingRetriever::new(RetrievalSource::Lexical, corpus()),
        CountingRetriever::new(RetrievalSource::Semantic, corpus()),
    )
}

#[tokio::test]
async fn test_greeting_skips_retrieval() {
    let generator = ScriptedGenerator::new()
        .reply(CLASSIFY, "false")
        .reply(CHAT, "Здравствуйте! Чем могу помочь?")
        .build();
    let (lexical, semantic) = counting_pair();
    let (pipeline, telemetry) = pipeline(generator.clone(), lexical.clone(), semantic.clone());

    let result = pipeline.process("Привет").await.unwrap();

    assert_eq!(result.answer, "Здравствуйте! Чем могу помочь?");
    assert_eq!(result.branch, Branch::NoSearch);
    assert!(result.subqueries.is_empty());
    assert_eq!(lexical.calls(), 0);
    assert_eq!(semantic.calls(), 0);
    assert_eq!(generator.calls(), 2);
    assert!(generator.prompts_with(DECOMPOSE).is_empty());

    let stats = telemetry.get_stats();
    assert_eq!(stats.no_search_answers, 1);
    assert_eq!(stats.fusions, 0);
}

#[tokio::test]
async fn test_simple_question_runs_one_retrieval_pass() {
    let generator = ScriptedGenerator::new()
        .reply(CLASSIFY, "true")
        .reply(CHECK, "false")
        .reply(grounded("Что такое GDPR?"), "GDPR — регламент ЕС о персональных данных.")
        .build();
    let (lexical, semantic) = counting_pair();
    let (pipeline, telemetry) = pipeline(generator.clone(), lexical.clone(), semantic.clone());

    let result = pipeline.process("Что такое GDPR?").await.unwrap();

    assert_eq!(result.answer, "GDPR — регламент ЕС о персональных данных.");
    assert_eq!(result.branch, Branch::Single);
    assert_eq!(result.subqueries, vec!["Что такое GDPR?".to_string()]);

    assert_eq!(lexical.calls(), 1);
    assert_eq!(semantic.calls(), 1);
    assert_eq!(lexical.queries(), semantic.queries());
    assert!(generator.prompts_with(DECOMPOSE).is_empty());

    let grounded_prompts = generator.prompts_with("Вопрос: Что такое GDPR?");
    assert_eq!(grounded_prompts.len(), 1);
    assert!(grounded_prompts[0].contains("(источник: gdpr.pdf)"));

    let stats = telemetry.get_stats();
    assert_eq!(stats.lexical_retrievals, 1);
    assert_eq!(stats.semantic_retrievals, 1);
    assert_eq!(stats.fusions, 1);
    assert_eq!(stats.reranks, 1);
    assert_eq!(stats.generations, 1);
    assert_eq!(stats.single_answers, 1);
    assert_eq!(stats.syntheses, 0);
}

#[tokio::test]
async fn test_compound_question_with_one_failed_part() {
    let generator = ScriptedGenerator::new()
        .reply(CLASSIFY, "true")
        .reply(CHECK, "true")
        .reply(DECOMPOSE, "- A?\n- B?")
        .fail(grounded("A?"))
        .reply(grounded("B?"), "X")
        .reply(SYNTHESIS, "Сводный ответ")
        .build();
    let (lexical, semantic) = counting_pair();
    let (pipeline, telemetry) = pipeline(generator.clone(), lexical, semantic);

    let result = pipeline.process("A и B?").await.unwrap();

    assert_eq!(result.branch, Branch::Multi);
    assert_eq!(result.answer, "Сводный ответ");
    assert_eq!(result.subqueries, vec!["A?".to_string(), "B?".to_string()]);

    let synthesis = generator.prompts_with(SYNTHESIS);
    assert_eq!(synthesis.len(), 1);
    assert!(synthesis[0].contains("Часть 2 (B?): X"));
    assert!(!synthesis[0].contains("Часть 1"));

    let stats = telemetry.get_stats();
    assert_eq!(stats.failed_subqueries, 1);
    assert_eq!(stats.syntheses, 1);
}

#[tokio::test]
async fn test_all_parts_failing_returns_apology() {
    let generator = ScriptedGenerator::new()
        .reply(CLASSIFY, "true")
        .reply(CHECK, "true")
        .reply(DECOMPOSE, "1. A?\n2. B?")
        .fail(grounded("A?"))
        .fail(grounded("B?"))
        .build();
    let lexical = CountingRetriever::failing(RetrievalSource::Lexical);
    let semantic = CountingRetriever::failing(RetrievalSource::Semantic);
    let (pipeline, telemetry) = pipeline(generator.clone(), lexical, semantic);

    let answer = pipeline.answer("A и B?").await.unwrap();

    assert_eq!(answer, NO_RESULTS_MESSAGE);
    assert!(generator.prompts_with(SYNTHESIS).is_empty());

    let stats = telemetry.get_stats();
    assert_eq!(stats.failed_subqueries, 2);
    assert_eq!(stats.degraded_retrievals, 4);
}

#[tokio::test]
async fn test_fan_out_is_capped_at_three() {
    let generator = ScriptedGenerator::new()
        .reply(CLASSIFY, "true")
        .reply(CHECK, "true")
        .reply(DECOMPOSE, "- a1?\n- a2?\n- a3?\n- a4?\n- a5?")
        .reply(SYNTHESIS, "итог")
        .build();
    let (lexical, semantic) = counting_pair();
    let (pipeline, _telemetry) = pipeline(generator.clone(), lexical.clone(), semantic.clone());

    let result = pipeline.process("пять вопросов сразу").await.unwrap();

    assert_eq!(result.answer, "итог");
    assert_eq!(result.subqueries.len(), 5);
    assert_eq!(lexical.calls(), 3);
    assert_eq!(semantic.calls(), 3);
    assert_eq!(generator.prompts_with("Вопрос: a").len(), 3);
    assert!(generator.prompts_with("Вопрос: a4?").is_empty());
}

#[tokio::test]
async fn test_blank_query_is_rejected_before_backends() {
    let generator = ScriptedGenerator::new().build();
    let (lexical, semantic) = counting_pair();
    let (pipeline, _telemetry) = pipeline(generator.clone(), lexical.clone(), semantic);

    let err = pipeline.process("   \n").await.unwrap_err();

    assert!(matches!(err, RagError::InvalidQuery(_)));
    assert_eq!(generator.calls(), 0);
    assert_eq!(lexical.calls(), 0);
}

#[tokio::test]
async fn test_classifier_failure_propagates() {
    let generator = ScriptedGenerator::new().fail(CLASSIFY).build();
    let (lexical, semantic) = counting_pair();
    let (pipeline, _telemetry) = pipeline(generator, lexical.clone(), semantic);

    let err = pipeline.process("Что такое GDPR?").await.unwrap_err();

    assert!(matches!(err, RagError::GenerationFailure(_)));
    assert_eq!(lexical.calls(), 0);
}

#[tokio::test]
async fn test_decomposer_failure_falls_back_to_single() {
    let generator = ScriptedGenerator::new()
        .reply(CLASSIFY, "true")
        .fail(CHECK)
        .reply(grounded("Что такое GDPR?"), "ответ")
        .build();
    let (lexical, semantic) = counting_pair();
    let (pipeline, _telemetry) = pipeline(generator, lexical, semantic);

    let result = pipeline.process("Что такое GDPR?").await.unwrap();

    assert_eq!(result.branch, Branch::Single);
    assert_eq!(result.answer, "ответ");
}

#[tokio::test]
async fn test_single_branch_generation_failure_propagates() {
    let generator = ScriptedGenerator::new()
        .reply(CLASSIFY, "true")
        .reply(CHECK, "false")
        .fail(grounded("Что такое GDPR?"))
        .build();
    let (lexical, semantic) = counting_pair();
    let (pipeline, _telemetry) = pipeline(generator, lexical, semantic);

    let err = pipeline.process("Что такое GDPR?").await.unwrap_err();
    assert!(matches!(err, RagError::GenerationFailure(_)));
}

#[tokio::test]
async fn test_retrieval_outage_still_answers() {
    let generator = ScriptedGenerator::new()
        .reply(CLASSIFY, "true")
        .reply(CHECK, "false")
        .reply(grounded("Что такое GDPR?"), "не знаю")
        .build();
    let lexical = CountingRetriever::failing(RetrievalSource::Lexical);
    let semantic = CountingRetriever::failing(RetrievalSource::Semantic);
    let (pipeline, telemetry) = pipeline(generator.clone(), lexical, semantic);

    let answer = pipeline.answer("Что такое GDPR?").await.unwrap();

    assert_eq!(answer, "не знаю");
    let prompt = &generator.prompts_with("Вопрос: Что такое GDPR?")[0];
    assert!(prompt.contains("ничего не найдено"));
    assert_eq!(telemetry.get_stats().degraded_retrievals, 2);
}

#[tokio::test]
async fn test_deadline_expiry_is_timeout() {
    let generator = ScriptedGenerator::new()
        .reply(CLASSIFY, "false")
        .delay(Duration::from_secs(5))
        .build();
    let (lexical, semantic) = counting_pair();
    let (pipeline, _telemetry) = pipeline(generator, lexical, semantic);

    let err = pipeline
        .answer_with_timeout("Привет", Duration::from_millis(50))
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::Timeout { duration_ms: 50 }));
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let generator = ScriptedGenerator::new()
        .reply(CLASSIFY, "true")
        .reply(CHECK, "false")
        .reply(grounded("Что такое GDPR?"), "про GDPR")
        .reply(grounded("Сколько дней отпуска?"), "28 дней")
        .build();
    let (lexical, semantic) = counting_pair();
    let (pipeline, telemetry) = pipeline(generator, lexical.clone(), semantic);

    let (gdpr, vacation) = tokio::join!(
        pipeline.answer("Что такое GDPR?"),
        pipeline.answer("Сколько дней отпуска?"),
    );

    assert_eq!(gdpr.unwrap(), "про GDPR");
    assert_eq!(vacation.unwrap(), "28 дней");
    assert_eq!(lexical.calls(), 2);
    assert_eq!(telemetry.get_stats().single_answers, 2);
}

#[tokio::test]
async fn test_real_indexes_ground_the_prompt() {
    let documents = corpus();
    let store = InMemoryStore::new(documents.clone());
    let index = LexicalIndex::build(&documents, Bm25Params::default());
    let lexical = Arc::new(LexicalRetriever::new(index, documents));
    let semantic = Arc::new(SemanticRetriever::new(store));

    let generator = ScriptedGenerator::new()
        .reply(CLASSIFY, "true")
        .reply(CHECK, "false")
        .reply(grounded("Сколько дней длится отпуск?"), "28 календарных дней")
        .build();
    let (pipeline, _telemetry) = pipeline(generator.clone(), lexical, semantic);

    let answer = pipeline.answer("Сколько дней длится отпуск?").await.unwrap();

    assert_eq!(answer, "28 календарных дней");
    let prompt = &generator.prompts_with("Вопрос: Сколько дней длится отпуск?")[0];
    assert!(prompt.contains("28 календарных дней (источник: leave_policy.docx)"));
}

#[tokio::test]
async fn test_sub_queries_and_their_retrievals_overlap() {
    let generator = ScriptedGenerator::new()
        .reply(CLASSIFY, "true")
        .reply(CHECK, "true")
        .reply(DECOMPOSE, "- A?\n- B?\n- C?")
        .reply(SYNTHESIS, "итог")
        .build();
    // 3 sub-queries x 2 retrievers must all be waiting at once
    let gate = Arc::new(Barrier::new(6));
    let lexical = CountingRetriever::gated(RetrievalSource::Lexical, corpus(), gate.clone());
    let semantic = CountingRetriever::gated(RetrievalSource::Semantic, corpus(), gate);
    let (pipeline, _telemetry) = pipeline(generator, lexical.clone(), semantic.clone());

    let answer = tokio::time::timeout(Duration::from_secs(5), pipeline.answer("A, B и C?"))
        .await
        .expect("retrievals of all sub-queries in flight together")
        .unwrap();

    assert_eq!(answer, "итог");
    assert_eq!(lexical.calls(), 3);
    assert_eq!(semantic.calls(), 3);
}
