use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Permit any origin, method, and header. Not suitable for production.
    #[serde(default = "default_true")]
    pub cors_allow_any: bool,
    /// Allowed origins when `cors_allow_any` is off. Empty disables CORS.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_allow_any: true,
            cors_origins: Vec::new(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL override (OpenAI-compatible endpoint or Ollama host).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_provider")]
    pub provider: String,
    /// Data-plane host of the Pinecone index, e.g.
    /// `https://quickstart-abc123.svc.us-east-1.pinecone.io`.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    /// Reported dimension for the in-memory index.
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            provider: default_index_provider(),
            host: None,
            namespace: None,
            dims: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_index_provider() -> String {
    "memory".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: None,
            max_tokens: default_max_tokens(),
            url: None,
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_llm_provider() -> String {
    "anthropic".to_string()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_llm_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// A configuration that runs entirely on the local machine: local
    /// embeddings, an in-memory index, and an Ollama model for generation.
    pub fn minimal() -> Self {
        Self {
            server: ServerConfig::default(),
            embedding: EmbeddingConfig::default(),
            index: IndexConfig::default(),
            llm: LlmConfig {
                provider: "ollama".to_string(),
                model: Some("llama2".to_string()),
                ..LlmConfig::default()
            },
            retrieval: RetrievalConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.retrieval.default_top_k == 0 {
        anyhow::bail!("retrieval.default_top_k must be >= 1");
    }

    if config.llm.max_tokens == 0 {
        anyhow::bail!("llm.max_tokens must be > 0");
    }

    match config.embedding.provider.as_str() {
        "local" => {}
        "openai" | "ollama" => {
            if config.embedding.model.is_none() {
                anyhow::bail!(
                    "embedding.model must be specified when provider is '{}'",
                    config.embedding.provider
                );
            }
        }
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be openai, ollama, or local.",
            other
        ),
    }

    match config.index.provider.as_str() {
        "memory" => {}
        "pinecone" => {
            if config.index.host.is_none() {
                anyhow::bail!("index.host must be specified when provider is 'pinecone'");
            }
        }
        other => anyhow::bail!(
            "Unknown index provider: '{}'. Must be pinecone or memory.",
            other
        ),
    }

    match config.llm.provider.as_str() {
        "anthropic" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown llm provider: '{}'. Must be anthropic, openai, or ollama.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:8000");
        assert!(cfg.server.cors_allow_any);
        assert_eq!(cfg.embedding.provider, "local");
        assert_eq!(cfg.index.provider, "memory");
        assert_eq!(cfg.llm.provider, "anthropic");
        assert_eq!(cfg.llm.max_tokens, 1024);
        assert_eq!(cfg.retrieval.default_top_k, 3);
        assert!(cfg.seed.enabled);
    }

    #[test]
    fn test_full_config() {
        let cfg = parse_config(
            r#"
[server]
bind = "127.0.0.1:9000"
cors_allow_any = false
cors_origins = ["https://app.example.com"]

[embedding]
provider = "openai"
model = "text-embedding-3-small"
dims = 1536

[index]
provider = "pinecone"
host = "https://quickstart.svc.pinecone.io"
namespace = "docs"

[llm]
provider = "openai"
model = "gpt-4o-mini"
max_tokens = 512

[retrieval]
default_top_k = 5

[seed]
enabled = false
"#,
        )
        .unwrap();
        assert_eq!(cfg.server.cors_origins, vec!["https://app.example.com"]);
        assert_eq!(cfg.embedding.dims, Some(1536));
        assert_eq!(cfg.index.namespace.as_deref(), Some("docs"));
        assert_eq!(cfg.llm.max_tokens, 512);
        assert_eq!(cfg.retrieval.default_top_k, 5);
        assert!(!cfg.seed.enabled);
    }

    #[test]
    fn test_minimal_is_local_and_valid() {
        let cfg = Config::minimal();
        validate(&cfg).unwrap();
        assert_eq!(cfg.embedding.provider, "local");
        assert_eq!(cfg.index.provider, "memory");
        assert_eq!(cfg.llm.provider, "ollama");
    }

    #[test]
    fn test_pinecone_requires_host() {
        let err = parse_config("[index]\nprovider = \"pinecone\"\n").unwrap_err();
        assert!(err.to_string().contains("index.host"));
    }

    #[test]
    fn test_openai_embedding_requires_model() {
        let err = parse_config("[embedding]\nprovider = \"openai\"\n").unwrap_err();
        assert!(err.to_string().contains("embedding.model"));
    }

    #[test]
    fn test_unknown_llm_provider_rejected() {
        let err = parse_config("[llm]\nprovider = \"gpt\"\n").unwrap_err();
        assert!(err.to_string().contains("Unknown llm provider"));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        assert!(parse_config("[retrieval]\ndefault_top_k = 0\n").is_err());
    }
}
