//! Vector index abstraction.
//!
//! The [`VectorIndex`] trait covers the three operations the assistant needs
//! from a vector database: batched upsert, nearest-neighbor query, and a
//! size summary. Implementations:
//!
//! | Config Value | Implementation | Notes |
//! |-------------|----------------|-------|
//! | `"pinecone"` | [`PineconeIndex`] | Hosted; requires `PINECONE_API_KEY` |
//! | `"memory"` | [`MemoryIndex`] | In-process, lost on exit |
//!
//! The similarity metric is whatever the index is configured with; callers
//! only consume the scores and rank order it returns.

pub mod memory;
pub mod pinecone;

pub use memory::MemoryIndex;
pub use pinecone::PineconeIndex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::IndexConfig;
use crate::models::{IndexEntry, IndexStats, Match};

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite entries, keyed by id, in a single call.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Return up to `top_k` entries nearest to `vector`, best first, with metadata.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<Match>>;

    /// Report the index's current size.
    async fn describe_stats(&self) -> Result<IndexStats>;
}

/// Create the [`VectorIndex`] named by `index.provider`.
pub fn create_index(config: &IndexConfig) -> Result<Arc<dyn VectorIndex>> {
    match config.provider.as_str() {
        "pinecone" => {
            let api_key = std::env::var("PINECONE_API_KEY")
                .map_err(|_| anyhow::anyhow!("PINECONE_API_KEY environment variable not set"))?;
            Ok(Arc::new(PineconeIndex::new(config, api_key)?))
        }
        "memory" => Ok(Arc::new(MemoryIndex::new(config.dims))),
        other => bail!("Unknown index provider: {}", other),
    }
}
