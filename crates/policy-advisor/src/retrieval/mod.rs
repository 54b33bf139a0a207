//! Retrieval Backends
//!
//! Abstractions and implementations for the persistent knowledge base.

mod embedding;
mod mock;
mod pinecone;

pub use embedding::{EmbeddingClient, EmbeddingConfig};
pub use mock::MockKnowledgeIndex;
pub use pinecone::{PineconeConfig, PineconeIndex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One retrieved text snippet
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snippet {
    /// Snippet text
    pub text: String,

    /// Similarity score reported by the index
    pub score: f32,

    /// Originating document, if recorded at ingest time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One chunk of an ingested document
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Index-wide unique id
    pub id: String,

    /// Chunk text
    pub text: String,

    /// Originating document locator
    pub source: String,

    /// Position of this chunk within the source document
    pub chunk_index: usize,
}

/// Knowledge index trait (Strategy pattern)
///
/// Implement this for each vector store backend.
#[async_trait]
pub trait KnowledgeIndex: Send + Sync {
    /// Similarity search returning the top-k snippets
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Snippet>>;

    /// Add document chunks to the index, returning how many were written
    async fn upsert(&self, chunks: &[DocumentChunk]) -> Result<usize>;

    /// Check if the index is reachable
    async fn health_check(&self) -> bool;

    /// Backend name
    fn name(&self) -> &str;
}
