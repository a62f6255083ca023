//! Startup seeding and the end-to-end sample-data scenario.

mod common;

use common::{assistant_with, memory_assistant, spawn_server, FailingIndex, CountingLlm};
use jarvis::models::Document;
use jarvis::seed::{seed_if_empty, SeedOutcome};
use serde_json::{json, Value};
use std::sync::Arc;

#[tokio::test]
async fn test_seed_empty_index_adds_four_samples() {
    let (assistant, index, _) = memory_assistant();

    let outcome = seed_if_empty(&assistant).await.unwrap();
    assert_eq!(outcome, SeedOutcome::Seeded(4));

    let stats = assistant.stats().await.unwrap();
    assert_eq!(stats.total_vectors, 4);
    assert_eq!(
        index.ids(),
        vec!["sample_0", "sample_1", "sample_2", "sample_3"]
    );

    let refund = index.metadata("sample_1").unwrap();
    assert_eq!(refund["category"], json!("billing"));
    assert!(refund["text"].as_str().unwrap().contains("money-back guarantee"));
}

#[tokio::test]
async fn test_seed_populated_index_adds_nothing() {
    let (assistant, index, _) = memory_assistant();
    assistant
        .ingest(vec![Document::new("existing document")])
        .await
        .unwrap();

    let outcome = seed_if_empty(&assistant).await.unwrap();
    assert_eq!(outcome, SeedOutcome::AlreadyPopulated(1));
    assert_eq!(assistant.stats().await.unwrap().total_vectors, 1);
    assert!(index.metadata("sample_0").is_none());
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let (assistant, _, _) = memory_assistant();

    seed_if_empty(&assistant).await.unwrap();
    let second = seed_if_empty(&assistant).await.unwrap();

    assert_eq!(second, SeedOutcome::AlreadyPopulated(4));
    assert_eq!(assistant.stats().await.unwrap().total_vectors, 4);
}

#[tokio::test]
async fn test_seed_surfaces_index_failure() {
    let assistant = assistant_with(Arc::new(FailingIndex), Arc::new(CountingLlm::default()));
    let err = seed_if_empty(&assistant).await.unwrap_err();
    assert!(format!("{:#}", err).contains("index unreachable"));
}

#[tokio::test]
async fn test_refund_question_cites_billing_sample() {
    let (assistant, _, llm) = memory_assistant();
    seed_if_empty(&assistant).await.unwrap();
    let base = spawn_server(assistant).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{}/query", base))
        .json(&json!({ "question": "What is your refund policy?" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let sources = body["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 3);
    assert_eq!(sources[0]["id"], "sample_1");

    let refund_text = sources[0]["text"].as_str().unwrap();
    assert!(body["context_used"].as_str().unwrap().contains(refund_text));
    assert!(body["response"].as_str().unwrap().starts_with("answered with"));
    assert_eq!(llm.calls(), 1);
}
