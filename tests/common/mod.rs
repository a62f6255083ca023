//! Test doubles for the assistant's collaborators.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use jarvis::embedding::Embedder;
use jarvis::index::{MemoryIndex, VectorIndex};
use jarvis::llm::LanguageModel;
use jarvis::models::{IndexEntry, IndexStats, Match};
use jarvis::rag::{Assistant, AssistantSettings};
use jarvis::server::router;
use jarvis::config::ServerConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Keyword vocabularies for each concept axis.
const CONCEPTS: [&[&str]; 4] = [
    &["support", "contact", "email", "chat", "help"],
    &["refund", "refunds", "money-back", "guarantee", "billing", "money"],
    &["premium", "plan", "features", "api", "analytics"],
    &["security", "secure", "encryption", "gdpr", "soc", "compliance"],
];

/// A tiny "semantic" embedder: one axis per concept plus a constant bias,
/// so related words land near each other without a real model.
pub struct ConceptEmbedder;

impl ConceptEmbedder {
    fn vectorize(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '-'))
            .filter(|t| !t.is_empty())
            .collect();

        let mut v: Vec<f32> = CONCEPTS
            .iter()
            .map(|words| tokens.iter().filter(|t| words.contains(*t)).count() as f32)
            .collect();
        v.push(0.1);
        v
    }
}

#[async_trait]
impl Embedder for ConceptEmbedder {
    fn model_name(&self) -> &str {
        "concept"
    }

    fn dims(&self) -> usize {
        CONCEPTS.len() + 1
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }
}

/// Language model that counts calls and summarizes its prompt.
#[derive(Default)]
pub struct CountingLlm {
    pub calls: AtomicUsize,
}

impl CountingLlm {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for CountingLlm {
    fn model_name(&self) -> &str {
        "counting"
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("answered with {} prompt bytes, budget {}", prompt.len(), max_tokens))
    }
}

pub struct FailingLlm;

#[async_trait]
impl LanguageModel for FailingLlm {
    fn model_name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
        bail!("rate limit exceeded")
    }
}

pub struct FailingIndex;

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn upsert(&self, _entries: Vec<IndexEntry>) -> Result<()> {
        bail!("index unreachable")
    }

    async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<Match>> {
        bail!("index unreachable")
    }

    async fn describe_stats(&self) -> Result<IndexStats> {
        bail!("index unreachable")
    }
}

pub fn assistant_with(index: Arc<dyn VectorIndex>, llm: Arc<dyn LanguageModel>) -> Assistant {
    Assistant::new(
        Arc::new(ConceptEmbedder),
        index,
        llm,
        AssistantSettings::default(),
    )
}

/// Assistant over a fresh in-memory index. Returns the handles for inspection.
pub fn memory_assistant() -> (Assistant, Arc<MemoryIndex>, Arc<CountingLlm>) {
    let index = Arc::new(MemoryIndex::default());
    let llm = Arc::new(CountingLlm::default());
    let assistant = assistant_with(index.clone(), llm.clone());
    (assistant, index, llm)
}

/// Serve `assistant` on an ephemeral local port and return its base URL.
pub async fn spawn_server(assistant: Assistant) -> String {
    spawn_server_with(assistant, ServerConfig::default()).await
}

pub async fn spawn_server_with(assistant: Assistant, server: ServerConfig) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(assistant, &server).unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{}", addr)
}
