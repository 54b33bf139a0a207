//! Error Types for the Policy Domain

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Knowledge index error: {0}")]
    Index(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Document download failed: {0}")]
    Download(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Document contains no extractable text")]
    EmptyDocument,

    #[error("Web search error: {0}")]
    WebSearch(String),

    #[error("Ingestion error: {0}")]
    Ingest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
