//! In-memory [`VectorIndex`] for local development and tests.
//!
//! Entries live in a `HashMap` behind `std::sync::RwLock`. Queries are
//! brute-force cosine similarity over every stored vector.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::VectorIndex;
use crate::embedding::cosine_similarity;
use crate::models::{IndexEntry, IndexStats, Match, Metadata};

struct StoredVector {
    values: Vec<f32>,
    metadata: Metadata,
}

pub struct MemoryIndex {
    dims: Option<usize>,
    entries: RwLock<HashMap<String, StoredVector>>,
}

impl MemoryIndex {
    /// Create an empty index. `dims`, when set, is enforced on upsert and
    /// reported by [`describe_stats`](VectorIndex::describe_stats).
    pub fn new(dims: Option<usize>) -> Self {
        Self {
            dims,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Ids of all stored entries, sorted.
    pub fn ids(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Metadata stored for `id`, if any.
    pub fn metadata(&self, id: &str) -> Option<Metadata> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(id).map(|sv| sv.metadata.clone())
    }

    fn current_dims(&self, entries: &HashMap<String, StoredVector>) -> usize {
        self.dims
            .or_else(|| entries.values().next().map(|sv| sv.values.len()))
            .unwrap_or(0)
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, new_entries: Vec<IndexEntry>) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // An empty, unsized index takes its dimension from the first entry.
        let expected = self
            .dims
            .or_else(|| entries.values().next().map(|sv| sv.values.len()))
            .or_else(|| new_entries.first().map(|e| e.values.len()));

        if let Some(dims) = expected {
            if let Some(bad) = new_entries.iter().find(|e| e.values.len() != dims) {
                bail!(
                    "Vector dimension {} does not match index dimension {} (id {})",
                    bad.values.len(),
                    dims,
                    bad.id
                );
            }
        }

        for entry in new_entries {
            entries.insert(
                entry.id,
                StoredVector {
                    values: entry.values,
                    metadata: entry.metadata,
                },
            );
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<Match>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut matches: Vec<Match> = entries
            .iter()
            .map(|(id, sv)| Match {
                id: id.clone(),
                score: cosine_similarity(vector, &sv.values),
                metadata: sv.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn describe_stats(&self) -> Result<IndexStats> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(IndexStats {
            total_vectors: entries.len() as u64,
            dimension: self.current_dims(&entries),
            index_fullness: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, values: Vec<f32>, text: &str) -> IndexEntry {
        let mut metadata = Metadata::new();
        metadata.insert("text".to_string(), json!(text));
        IndexEntry {
            id: id.to_string(),
            values,
            metadata,
        }
    }

    #[tokio::test]
    async fn test_empty_stats() {
        let index = MemoryIndex::default();
        let stats = index.describe_stats().await.unwrap();
        assert_eq!(stats.total_vectors, 0);
        assert_eq!(stats.dimension, 0);
        assert_eq!(stats.index_fullness, 0.0);
    }

    #[tokio::test]
    async fn test_query_ranks_by_similarity() {
        let index = MemoryIndex::default();
        index
            .upsert(vec![
                entry("a", vec![1.0, 0.0], "alpha"),
                entry("b", vec![0.0, 1.0], "beta"),
                entry("c", vec![0.7, 0.7], "gamma"),
            ])
            .await
            .unwrap();

        let matches = index.query(&[1.0, 0.1], 2).await.unwrap();
        let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(matches[0].score >= matches[1].score);
        assert_eq!(matches[0].metadata["text"], json!("alpha"));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_id() {
        let index = MemoryIndex::default();
        index.upsert(vec![entry("a", vec![1.0, 0.0], "old")]).await.unwrap();
        index.upsert(vec![entry("a", vec![0.0, 1.0], "new")]).await.unwrap();

        let stats = index.describe_stats().await.unwrap();
        assert_eq!(stats.total_vectors, 1);
        assert_eq!(stats.dimension, 2);
        assert_eq!(index.metadata("a").unwrap()["text"], json!("new"));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let index = MemoryIndex::new(Some(3));
        let err = index
            .upsert(vec![entry("a", vec![1.0, 0.0], "short")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dimension"));
        assert_eq!(index.describe_stats().await.unwrap().total_vectors, 0);
    }

    #[tokio::test]
    async fn test_mixed_dimension_batch_rejected_on_empty_index() {
        let index = MemoryIndex::default();
        let err = index
            .upsert(vec![
                entry("a", vec![1.0, 0.0], "two"),
                entry("b", vec![1.0, 0.0, 0.0], "three"),
            ])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("id b"), "{}", err);
        assert_eq!(index.describe_stats().await.unwrap().total_vectors, 0);

        index.upsert(vec![entry("c", vec![0.0, 1.0], "two")]).await.unwrap();
        assert!(index.upsert(vec![entry("d", vec![1.0], "one")]).await.is_err());
        assert_eq!(index.describe_stats().await.unwrap().dimension, 2);
    }
}
