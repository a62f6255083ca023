//! Language-model clients.
//!
//! [`LanguageModel`] takes a fully-assembled prompt and an output budget and
//! returns the generated text verbatim. Implementations:
//!
//! | Config Value | Client | Endpoint | Credentials |
//! |-------------|--------|----------|-------------|
//! | `"anthropic"` | [`AnthropicClient`] | `POST /v1/messages` | `ANTHROPIC_API_KEY` |
//! | `"openai"` | [`OpenAIChat`] | `POST /v1/chat/completions` | `OPENAI_API_KEY` |
//! | `"ollama"` | [`OllamaChat`] | `POST /api/generate` | none |
//!
//! Requests are sent once; any failure is returned with the provider's message.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

fn http_client(config: &LlmConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

async fn send_json(request: reqwest::RequestBuilder, provider: &str) -> Result<Value> {
    let response = request
        .send()
        .await
        .with_context(|| format!("{} request failed", provider))?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("{} API error {}: {}", provider, status, body_text);
    }

    response
        .json()
        .await
        .with_context(|| format!("Invalid {} response body", provider))
}

// ============ Anthropic ============

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            base_url: trimmed_url(config.url.as_deref(), "https://api.anthropic.com"),
            api_key,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| "claude-sonnet-4-20250514".to_string()),
        })
    }
}

#[async_trait]
impl LanguageModel for AnthropicClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let body = json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let request = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);

        let json = send_json(request, "Anthropic").await?;
        parse_anthropic_response(&json)
    }
}

/// Returns the first `text` block of `content`.
fn parse_anthropic_response(json: &Value) -> Result<String> {
    json.get("content")
        .and_then(|c| c.as_array())
        .and_then(|blocks| {
            blocks
                .iter()
                .find(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
        })
        .and_then(|b| b.get("text"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid Anthropic response: no text content block"))
}

// ============ OpenAI ============

pub struct OpenAIChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAIChat {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            base_url: trimmed_url(config.url.as_deref(), "https://api.openai.com"),
            api_key,
            model: config.model.clone().unwrap_or_else(|| "gpt-4".to_string()),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAIChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let body = json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "messages": [
                { "role": "system", "content": "You are a helpful AI assistant." },
                { "role": "user", "content": prompt }
            ],
        });

        let request = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);

        let json = send_json(request, "OpenAI").await?;
        json.pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content"))
    }
}

// ============ Ollama ============

pub struct OllamaChat {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaChat {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            url: trimmed_url(config.url.as_deref(), "http://localhost:11434"),
            model: config.model.clone().unwrap_or_else(|| "llama2".to_string()),
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "num_predict": max_tokens },
        });

        let request = self.client.post(format!("{}/api/generate", self.url)).json(&body);

        let json = send_json(request, "Ollama").await?;
        json.get("response")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing response field"))
    }
}

fn trimmed_url(configured: Option<&str>, default: &str) -> String {
    configured.unwrap_or(default).trim_end_matches('/').to_string()
}

/// Create the [`LanguageModel`] named by `llm.provider`.
pub fn create_language_model(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>> {
    match config.provider.as_str() {
        "anthropic" => {
            let api_key = std::env::var("ANTHROPIC_API_KEY")
                .map_err(|_| anyhow::anyhow!("ANTHROPIC_API_KEY environment variable not set"))?;
            Ok(Arc::new(AnthropicClient::new(config, api_key)?))
        }
        "openai" => {
            let api_key = std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
            Ok(Arc::new(OpenAIChat::new(config, api_key)?))
        }
        "ollama" => Ok(Arc::new(OllamaChat::new(config)?)),
        other => bail!("Unknown llm provider: {}", other),
    }
}
