//! Embedding Client
//!
//! Turns text into vectors through an OpenAI-compatible embeddings
//! endpoint. Both query-time search and ingest-time upserts go through
//! this client so the index always holds vectors from one model.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};

/// Embedding endpoint configuration
#[derive(Clone, Debug)]
pub struct EmbeddingConfig {
    /// API base URL, without the endpoint path
    pub base_url: String,

    /// Bearer token
    pub api_key: String,

    /// Embedding model identifier
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            model: "text-embedding-3-small".into(),
        }
    }
}

impl EmbeddingConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".into()),
        }
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct WireResponse {
    data: Vec<WireEmbedding>,
}

#[derive(Deserialize)]
struct WireEmbedding {
    index: usize,
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible embeddings endpoint
pub struct EmbeddingClient {
    http: reqwest::Client,
    config: EmbeddingConfig,
}

impl EmbeddingClient {
    pub fn from_config(config: EmbeddingConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    pub fn from_env() -> Self {
        Self::from_config(EmbeddingConfig::from_env())
    }

    /// Embed a batch of texts, preserving input order
    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/embeddings",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&WireRequest {
                model: &self.config.model,
                input: inputs,
            })
            .send()
            .await
            .map_err(|e| AdvisorError::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail: String = body.chars().take(300).collect();
            return Err(AdvisorError::Embedding(format!("HTTP {status}: {detail}")));
        }

        let mut parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| AdvisorError::Embedding(e.to_string()))?;

        if parsed.data.len() != inputs.len() {
            return Err(AdvisorError::Embedding(format!(
                "expected {} vectors, got {}",
                inputs.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|e| e.index);
        Ok(parsed.data.into_iter().map(|e| e.embedding).collect())
    }

    /// Embed a single text
    pub async fn embed_one(&self, input: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[input.to_owned()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AdvisorError::Embedding("empty embedding response".into()))
    }
}
