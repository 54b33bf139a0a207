//! Bulk Document Ingestion
//!
//! Sweeps PDF documents from an S3 bucket into the knowledge index:
//! download, extract text, split into overlapping chunks, upsert.

use std::sync::Arc;

use aws_config::BehaviorVersion;
use serde::Serialize;

use crate::document::extract_pdf_text;
use crate::error::{AdvisorError, Result};
use crate::retrieval::{DocumentChunk, KnowledgeIndex};

/// Text chunking parameters
#[derive(Clone, Debug)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Characters of overlap between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Natural break points tried inside a chunk window, strongest first
const BREAKPOINTS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Split text into overlapping chunks, preferring to break at paragraph,
/// line, sentence or word boundaries within the window.
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || config.chunk_size == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let hard_end = (start + config.chunk_size).min(chars.len());
        let mut end = hard_end;

        if hard_end < chars.len() {
            let window: String = chars[start..hard_end].iter().collect();
            // Only accept a break point past the middle of the window so
            // chunks keep a useful size
            let floor = config.chunk_size / 2;
            for sep in BREAKPOINTS {
                if let Some(byte_pos) = window.rfind(sep) {
                    let char_pos = window[..byte_pos].chars().count();
                    if char_pos >= floor {
                        end = start + char_pos + sep.chars().count();
                        break;
                    }
                }
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_owned());
        }

        if end >= chars.len() {
            break;
        }
        let next = end.saturating_sub(config.chunk_overlap);
        // Overlap must never stall the sweep
        start = if next > start { next } else { end };
    }

    chunks
}

/// Outcome of one ingestion sweep
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct IngestReport {
    /// PDF files successfully indexed
    pub files_processed: usize,

    /// Objects skipped (non-PDF keys or per-file failures)
    pub files_skipped: usize,

    /// Total chunks written to the index
    pub chunks_indexed: usize,
}

/// S3 ingestion pipeline
pub struct S3Ingestor {
    s3: aws_sdk_s3::Client,
    bucket: String,
    prefix: String,
    index: Arc<dyn KnowledgeIndex>,
    chunking: ChunkingConfig,
}

impl S3Ingestor {
    /// Build from `S3_BUCKET_NAME` / `S3_PREFIX` and the ambient AWS
    /// credential chain. `None`-equivalent: returns a config error when
    /// the bucket is not set, so the caller can leave ingestion disabled.
    pub async fn from_env(index: Arc<dyn KnowledgeIndex>) -> Result<Self> {
        let bucket = std::env::var("S3_BUCKET_NAME")
            .map_err(|_| AdvisorError::Config("S3_BUCKET_NAME not set".into()))?;
        let prefix = std::env::var("S3_PREFIX").unwrap_or_default();

        let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;

        Ok(Self {
            s3: aws_sdk_s3::Client::new(&aws),
            bucket,
            prefix,
            index,
            chunking: ChunkingConfig::default(),
        })
    }

    /// Sweep the configured bucket/prefix. Per-file failures are logged
    /// and counted as skipped; the sweep continues.
    pub async fn run(&self) -> Result<IngestReport> {
        tracing::info!(
            bucket = %self.bucket,
            prefix = %self.prefix,
            index = self.index.name(),
            "starting S3 document ingestion"
        );

        let mut report = IngestReport::default();
        let mut pages = self
            .s3
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&self.prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| AdvisorError::Ingest(e.to_string()))?;

            for object in page.contents() {
                let Some(key) = object.key() else { continue };

                if !key.to_lowercase().ends_with(".pdf") {
                    tracing::debug!(%key, "skipping non-PDF object");
                    report.files_skipped += 1;
                    continue;
                }

                match self.ingest_object(key).await {
                    Ok(chunks) => {
                        report.files_processed += 1;
                        report.chunks_indexed += chunks;
                    }
                    Err(e) => {
                        tracing::warn!(%key, error = %e, "failed to ingest object");
                        report.files_skipped += 1;
                    }
                }
            }
        }

        tracing::info!(
            processed = report.files_processed,
            skipped = report.files_skipped,
            chunks = report.chunks_indexed,
            "finished S3 document ingestion"
        );
        Ok(report)
    }

    async fn ingest_object(&self, key: &str) -> Result<usize> {
        tracing::info!(%key, "ingesting object");

        let object = self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AdvisorError::Ingest(e.to_string()))?;

        let bytes = object
            .body
            .collect()
            .await
            .map_err(|e| AdvisorError::Ingest(e.to_string()))?
            .into_bytes();

        let text = extract_pdf_text(&bytes)?;
        let source = format!("s3://{}/{}", self.bucket, key);

        let chunks: Vec<DocumentChunk> = split_text(&text, &self.chunking)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| DocumentChunk {
                id: format!("{key}::{chunk_index}"),
                text,
                source: source.clone(),
                chunk_index,
            })
            .collect();

        if chunks.is_empty() {
            return Err(AdvisorError::Ingest(format!("no chunks produced from {key}")));
        }

        self.index.upsert(&chunks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        }
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = split_text("A short clause.", &ChunkingConfig::default());
        assert_eq!(chunks, vec!["A short clause.".to_string()]);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(split_text("", &ChunkingConfig::default()).is_empty());
        assert!(split_text("   \n  ", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn test_chunks_respect_size_bound() {
        let text = "word ".repeat(500);
        let cfg = config(100, 20);
        let chunks = split_text(&text, &cfg);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100, "oversized chunk: {chunk:?}");
        }
    }

    #[test]
    fn test_chunks_overlap() {
        let text = "abcde ".repeat(100);
        let cfg = config(60, 12);
        let chunks = split_text(&text, &cfg);

        // The tail of each chunk reappears at the head of the next
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().rev().take(6).collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            assert!(
                pair[1].starts_with(tail.trim_start()),
                "no overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let mut text = String::new();
        text.push_str(&"a".repeat(80));
        text.push_str("\n\n");
        text.push_str(&"b".repeat(80));
        let cfg = config(100, 0);
        let chunks = split_text(&text, &cfg);

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].chars().all(|c| c == 'a'));
        assert!(chunks[1].chars().all(|c| c == 'b'));
    }

    #[test]
    fn test_progress_with_overlap_larger_than_step() {
        // Pathological config must still terminate
        let text = "x".repeat(50);
        let cfg = config(10, 10);
        let chunks = split_text(&text, &cfg);
        assert!(!chunks.is_empty());
    }
}
