//! Pinecone data-plane client.
//!
//! Talks to a serverless or pod index through its REST API on the index
//! host (`index.host` in the config):
//!
//! | Operation | Request |
//! |-----------|---------|
//! | upsert | `POST /vectors/upsert` |
//! | query | `POST /query` with `includeMetadata: true` |
//! | stats | `POST /describe_index_stats` |
//!
//! Every request carries the `Api-Key` header. An optional namespace is sent
//! with upserts and queries.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::VectorIndex;
use crate::config::IndexConfig;
use crate::models::{IndexEntry, IndexStats, Match, Metadata};

const API_VERSION: &str = "2024-07";

pub struct PineconeIndex {
    client: reqwest::Client,
    host: String,
    api_key: String,
    namespace: Option<String>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [IndexEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResult {
    #[serde(default)]
    matches: Vec<ScoredVector>,
}

#[derive(Deserialize)]
struct ScoredVector {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeStatsResponse {
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    index_fullness: f32,
    #[serde(default)]
    total_vector_count: u64,
    #[serde(default)]
    namespaces: HashMap<String, NamespaceSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceSummary {
    #[serde(default)]
    vector_count: u64,
}

impl PineconeIndex {
    pub fn new(config: &IndexConfig, api_key: String) -> Result<Self> {
        let host = config
            .host
            .clone()
            .ok_or_else(|| anyhow::anyhow!("index.host required for Pinecone provider"))?;
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{}", host)
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            api_key,
            namespace: config.namespace.clone(),
        })
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Pinecone request to {} failed", path))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Pinecone API error {}: {}", status, body_text);
        }
        Ok(response)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()> {
        let request = UpsertRequest {
            vectors: &entries,
            namespace: self.namespace.as_deref(),
        };
        self.post("/vectors/upsert", &request).await?;
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<Match>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };
        let response: QueryResult = self
            .post("/query", &request)
            .await?
            .json()
            .await
            .context("Invalid Pinecone query response")?;

        Ok(response
            .matches
            .into_iter()
            .map(|m| Match {
                id: m.id,
                score: m.score,
                metadata: m.metadata.unwrap_or_default(),
            })
            .collect())
    }

    async fn describe_stats(&self) -> Result<IndexStats> {
        let stats: DescribeStatsResponse = self
            .post("/describe_index_stats", &serde_json::json!({}))
            .await?
            .json()
            .await
            .context("Invalid Pinecone stats response")?;

        // A namespace missing from the summary holds no vectors yet.
        let total_vectors = match &self.namespace {
            Some(ns) => stats.namespaces.get(ns).map_or(0, |s| s.vector_count),
            None => stats.total_vector_count,
        };

        Ok(IndexStats {
            total_vectors,
            dimension: stats.dimension,
            index_fullness: stats.index_fullness,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_gets_scheme() {
        let config = IndexConfig {
            provider: "pinecone".to_string(),
            host: Some("quickstart-abc.svc.pinecone.io/".to_string()),
            ..IndexConfig::default()
        };
        let index = PineconeIndex::new(&config, "pc-key".to_string()).unwrap();
        assert_eq!(index.host, "https://quickstart-abc.svc.pinecone.io");
    }

    #[test]
    fn test_query_request_is_camel_case() {
        let request = QueryRequest {
            vector: &[0.5],
            top_k: 3,
            include_metadata: true,
            include_values: false,
            namespace: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["topK"], 3);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("namespace").is_none());
    }

    #[test]
    fn test_stats_response_parses() {
        let stats: DescribeStatsResponse = serde_json::from_value(serde_json::json!({
            "namespaces": { "": { "vectorCount": 4 } },
            "dimension": 384,
            "indexFullness": 0.0,
            "totalVectorCount": 4
        }))
        .unwrap();
        assert_eq!(stats.total_vector_count, 4);
        assert_eq!(stats.dimension, 384);
        assert_eq!(stats.namespaces[""].vector_count, 4);
    }
}
