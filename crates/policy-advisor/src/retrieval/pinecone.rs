//! Pinecone Knowledge Index
//!
//! REST client for a serverless Pinecone index. Queries and upserts embed
//! their text through the shared `EmbeddingClient` first.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{DocumentChunk, EmbeddingClient, KnowledgeIndex, Snippet};
use crate::error::{AdvisorError, Result};

/// Pinecone index configuration
#[derive(Clone, Debug)]
pub struct PineconeConfig {
    /// Index host URL (e.g. `https://policies-xxxx.svc.region.pinecone.io`)
    pub index_host: String,

    /// API key
    pub api_key: String,

    /// Optional namespace within the index
    pub namespace: Option<String>,
}

impl PineconeConfig {
    /// Read from `PINECONE_INDEX_HOST`, `PINECONE_API_KEY` and the
    /// optional `PINECONE_NAMESPACE`. Fails fast when the index is not
    /// configured so a half-wired service never starts.
    pub fn from_env() -> Result<Self> {
        let index_host = std::env::var("PINECONE_INDEX_HOST")
            .map_err(|_| AdvisorError::Config("PINECONE_INDEX_HOST not set".into()))?;
        let api_key = std::env::var("PINECONE_API_KEY")
            .map_err(|_| AdvisorError::Config("PINECONE_API_KEY not set".into()))?;
        let namespace = std::env::var("PINECONE_NAMESPACE").ok();

        Ok(Self {
            index_host,
            api_key,
            namespace,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    score: f32,
    #[serde(default)]
    metadata: Option<ChunkMetadata>,
}

#[derive(Serialize, Deserialize)]
struct ChunkMetadata {
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chunk_index: Option<usize>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Serialize)]
struct UpsertVector {
    id: String,
    values: Vec<f32>,
    metadata: ChunkMetadata,
}

#[derive(Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    upserted_count: usize,
}

/// Pinecone-backed knowledge index
pub struct PineconeIndex {
    http: reqwest::Client,
    config: PineconeConfig,
    embedder: Arc<EmbeddingClient>,
}

impl PineconeIndex {
    pub fn new(config: PineconeConfig, embedder: Arc<EmbeddingClient>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            http,
            config,
            embedder,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.index_host.trim_end_matches('/'), path)
    }

    async fn post_json<T: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R> {
        let response = self
            .http
            .post(self.endpoint(path))
            .header("Api-Key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AdvisorError::Index(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail: String = body.chars().take(300).collect();
            return Err(AdvisorError::Index(format!("HTTP {status}: {detail}")));
        }

        response
            .json()
            .await
            .map_err(|e| AdvisorError::Index(e.to_string()))
    }
}

#[async_trait]
impl KnowledgeIndex for PineconeIndex {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Snippet>> {
        let vector = self.embedder.embed_one(query).await?;

        let request = QueryRequest {
            vector: &vector,
            top_k,
            include_metadata: true,
            namespace: self.config.namespace.as_deref(),
        };
        let response: QueryResponse = self.post_json("query", &request).await?;

        tracing::debug!(
            matches = response.matches.len(),
            "knowledge index query returned"
        );

        Ok(response
            .matches
            .into_iter()
            .filter_map(|m| {
                m.metadata.map(|meta| Snippet {
                    text: meta.text,
                    score: m.score,
                    source: meta.source,
                })
            })
            .collect())
    }

    async fn upsert(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;

        let request = UpsertRequest {
            vectors: chunks
                .iter()
                .zip(vectors)
                .map(|(chunk, values)| UpsertVector {
                    id: chunk.id.clone(),
                    values,
                    metadata: ChunkMetadata {
                        text: chunk.text.clone(),
                        source: Some(chunk.source.clone()),
                        chunk_index: Some(chunk.chunk_index),
                    },
                })
                .collect(),
            namespace: self.config.namespace.as_deref(),
        };
        let response: UpsertResponse = self.post_json("vectors/upsert", &request).await?;

        Ok(response.upserted_count)
    }

    async fn health_check(&self) -> bool {
        let body = serde_json::json!({});
        self.post_json::<_, serde_json::Value>("describe_index_stats", &body)
            .await
            .is_ok()
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}
