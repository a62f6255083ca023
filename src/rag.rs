//! Retrieval orchestration.
//!
//! [`Assistant`] ties the three external collaborators together:
//!
//! ```text
//! question ──▶ Embedder ──▶ VectorIndex::query ──▶ context ──▶ LanguageModel ──▶ answer
//! documents ─▶ Embedder ──▶ VectorIndex::upsert
//! ```
//!
//! The collaborators are injected as trait objects, created once at startup
//! and shared by every request. The assistant itself holds no mutable state.
//!
//! Failures from any collaborator are returned as-is (with context) and are
//! never retried. An empty retrieval is not an error: [`Assistant::answer`]
//! returns [`NO_CONTEXT_RESPONSE`] without calling the language model.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::embedding::{create_embedder, embed_one, Embedder};
use crate::index::{create_index, VectorIndex};
use crate::llm::{create_language_model, LanguageModel};
use crate::models::{Document, IndexEntry, IndexStats, Match, QueryResponse, Source};

/// Returned when retrieval finds nothing to ground an answer in.
pub const NO_CONTEXT_RESPONSE: &str =
    "I couldn't find relevant information to answer your question.";

/// Tunables for [`Assistant`].
#[derive(Debug, Clone, Copy)]
pub struct AssistantSettings {
    /// Matches retrieved when a query does not specify `top_k`.
    pub default_top_k: usize,
    /// Output budget passed to the language model.
    pub max_tokens: u32,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            default_top_k: 3,
            max_tokens: 1024,
        }
    }
}

impl AssistantSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_top_k: config.retrieval.default_top_k,
            max_tokens: config.llm.max_tokens,
        }
    }
}

/// The retrieval-augmented question answering pipeline.
#[derive(Clone)]
pub struct Assistant {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn LanguageModel>,
    settings: AssistantSettings,
}

impl Assistant {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LanguageModel>,
        settings: AssistantSettings,
    ) -> Self {
        Self {
            embedder,
            index,
            llm,
            settings,
        }
    }

    /// Build every collaborator from configuration and environment.
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let index = create_index(&config.index)?;
        let llm = create_language_model(&config.llm)?;

        info!(
            embedder = embedder.model_name(),
            index = %config.index.provider,
            llm = llm.model_name(),
            "assistant initialized"
        );

        Ok(Self::new(
            embedder,
            index,
            llm,
            AssistantSettings::from_config(config),
        ))
    }

    /// Embed a single text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        embed_one(self.embedder.as_ref(), text)
            .await
            .context("embedding failed")
    }

    /// Fetch the `top_k` entries nearest to `question`.
    ///
    /// Returns the context block (retrieved texts joined by a blank line) and
    /// the cited sources, both in the index's rank order.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<(String, Vec<Source>)> {
        if top_k == 0 {
            bail!("top_k must be >= 1");
        }

        let vector = self.embed(question).await?;
        let matches = self
            .index
            .query(&vector, top_k)
            .await
            .context("vector query failed")?;

        debug!(top_k, matches = matches.len(), "retrieved matches");

        let sources: Vec<Source> = matches.into_iter().map(to_source).collect();
        let context = sources
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok((context, sources))
    }

    /// Answer `question` from retrieved context.
    ///
    /// `top_k` falls back to [`AssistantSettings::default_top_k`].
    pub async fn answer(&self, question: &str, top_k: Option<usize>) -> Result<QueryResponse> {
        let top_k = top_k.unwrap_or(self.settings.default_top_k);
        let (context, sources) = self.retrieve(question, top_k).await?;

        if context.is_empty() {
            debug!("no context retrieved, skipping generation");
            return Ok(QueryResponse {
                response: NO_CONTEXT_RESPONSE.to_string(),
                sources: Vec::new(),
                context_used: String::new(),
            });
        }

        let prompt = build_prompt(&context, question);
        let response = self
            .llm
            .complete(&prompt, self.settings.max_tokens)
            .await
            .context("generation failed")?;

        Ok(QueryResponse {
            response,
            sources,
            context_used: context,
        })
    }

    /// Embed and upsert `documents` in one batch. Returns the number submitted.
    ///
    /// Each entry's metadata is the caller's metadata with `text` set to the
    /// document text. Entries without an explicit id get
    /// [`document_id`]`(position, text)`.
    pub async fn ingest(&self, documents: Vec<Document>) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await.context("embedding failed")?;

        if vectors.len() != documents.len() {
            bail!(
                "embedding failed: expected {} vectors, got {}",
                documents.len(),
                vectors.len()
            );
        }

        let entries: Vec<IndexEntry> = documents
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(position, (doc, values))| {
                let id = doc
                    .id
                    .unwrap_or_else(|| document_id(position, &doc.text));
                let mut metadata = doc.metadata;
                metadata.insert("text".to_string(), Value::String(doc.text));
                IndexEntry {
                    id,
                    values,
                    metadata,
                }
            })
            .collect();

        let count = entries.len();
        self.index
            .upsert(entries)
            .await
            .context("vector upsert failed")?;

        info!(count, "ingested documents");
        Ok(count)
    }

    /// Current size of the vector index.
    pub async fn stats(&self) -> Result<IndexStats> {
        self.index
            .describe_stats()
            .await
            .context("reading index stats failed")
    }
}

fn to_source(m: Match) -> Source {
    let text = m
        .metadata
        .get("text")
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string();

    Source {
        id: m.id,
        score: m.score,
        text,
        metadata: m.metadata,
    }
}

/// Derived entry id: `doc_{position}_{first 16 hex chars of sha256(text)}`.
///
/// Stable across restarts. Collisions are not detected.
pub fn document_id(position: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    format!("doc_{}_{}", position, &hash[..16])
}

/// Assemble the generation prompt.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful AI assistant. Use the following context to answer the user's question accurately and concisely.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Provide a clear, helpful answer based on the context provided. If the context doesn't contain relevant information, say so politely."
    )
}
