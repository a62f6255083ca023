//! Core data models used throughout Jarvis.
//!
//! These types represent the requests, index entries, and responses that flow
//! through the ingestion and retrieval pipeline. All of them are (de)serialized
//! as the JSON bodies of the HTTP API.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata attached to an index entry.
pub type Metadata = Map<String, Value>;

/// A question submitted to `POST /query`.
#[derive(Debug, Clone, Deserialize)]
pub struct Query {
    pub question: String,
    /// Number of matches to retrieve. Zero is rejected at parse time.
    #[serde(default)]
    pub top_k: Option<NonZeroUsize>,
}

/// A document submitted for ingestion via `POST /upsert`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Document {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Explicit entry id. When absent, one is derived from the batch
    /// position and a hash of the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// An (id, vector, metadata) triple as stored in the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Metadata,
}

/// A single nearest-neighbor hit returned by the index.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: String,
    pub score: f32,
    pub metadata: Metadata,
}

/// Index size summary, as reported by `GET /stats`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_vectors: u64,
    pub dimension: usize,
    pub index_fullness: f32,
}

/// A retrieved snippet cited in a [`QueryResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub metadata: Metadata,
}

/// The answer to a [`Query`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
    pub sources: Vec<Source>,
    pub context_used: String,
}
