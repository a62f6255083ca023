//! Sample knowledge base for empty deployments.
//!
//! [`seed_if_empty`] inserts four built-in documents (`sample_0`..`sample_3`)
//! when, and only when, the index reports zero vectors. The check and the
//! insert are separate calls, so two instances starting at the same moment
//! may both seed; the fixed ids make that harmless.

use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::models::{Document, Metadata};
use crate::rag::Assistant;

/// What [`seed_if_empty`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The index was empty; this many sample documents were added.
    Seeded(usize),
    /// The index already held this many vectors; nothing was added.
    AlreadyPopulated(u64),
}

const SAMPLES: [(&str, &str, &str); 4] = [
    (
        "Our company offers 24/7 customer support via email at support@company.com and live chat on our website.",
        "support",
        "contact",
    ),
    (
        "We provide a 30-day money-back guarantee on all products. No questions asked.",
        "billing",
        "refund",
    ),
    (
        "Our premium plan includes unlimited API calls, priority support, advanced analytics, and dedicated account manager.",
        "features",
        "premium",
    ),
    (
        "Data security is our top priority. We use end-to-end encryption, regular security audits, and comply with SOC 2 and GDPR standards.",
        "security",
        "compliance",
    ),
];

/// The built-in sample documents, with ids `sample_0`..`sample_3`.
pub fn sample_documents() -> Vec<Document> {
    SAMPLES
        .iter()
        .enumerate()
        .map(|(i, (text, category, topic))| {
            let mut metadata = Metadata::new();
            metadata.insert("category".to_string(), json!(category));
            metadata.insert("topic".to_string(), json!(topic));
            Document::new(*text)
                .with_metadata(metadata)
                .with_id(format!("sample_{}", i))
        })
        .collect()
}

/// Insert the sample documents if the index is empty.
pub async fn seed_if_empty(assistant: &Assistant) -> Result<SeedOutcome> {
    let stats = assistant.stats().await?;

    if stats.total_vectors > 0 {
        info!(
            total_vectors = stats.total_vectors,
            "knowledge base already populated, skipping sample data"
        );
        return Ok(SeedOutcome::AlreadyPopulated(stats.total_vectors));
    }

    info!("adding sample documents to knowledge base");
    let added = assistant.ingest(sample_documents()).await?;
    info!(added, "sample documents added");

    Ok(SeedOutcome::Seeded(added))
}
