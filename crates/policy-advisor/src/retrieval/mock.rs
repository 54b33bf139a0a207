//! Mock Knowledge Index
//!
//! For testing and demo purposes. Serves canned policy snippets and
//! accepts upserts into memory.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DocumentChunk, KnowledgeIndex, Snippet};
use crate::error::Result;

/// In-memory knowledge index with keyword-overlap scoring
pub struct MockKnowledgeIndex {
    snippets: RwLock<Vec<Snippet>>,
}

impl Default for MockKnowledgeIndex {
    fn default() -> Self {
        Self::with_sample_policies()
    }
}

impl MockKnowledgeIndex {
    /// Empty index (searches return nothing)
    pub fn empty() -> Self {
        Self {
            snippets: RwLock::new(Vec::new()),
        }
    }

    /// Index seeded with a small set of sample policy clauses
    pub fn with_sample_policies() -> Self {
        let canned = [
            (
                "Cobertura contra robo: la póliza de hogar cubre el robo de \
                 bienes dentro de la vivienda asegurada hasta un límite de \
                 15.000 EUR por siniestro, con un deducible de 300 EUR. El robo \
                 de efectivo está cubierto hasta 500 EUR.",
                "policies/hogar-2024.pdf",
            ),
            (
                "Exclusiones de la cobertura de robo: no se cubren los bienes \
                 dejados en zonas comunes ni los siniestros sin signos de \
                 fuerza en accesos. Las joyas deben declararse expresamente.",
                "policies/hogar-2024.pdf",
            ),
            (
                "Auto policy collision coverage applies a 500 USD deductible \
                 per incident; glass damage is covered without deductible once \
                 per policy year.",
                "policies/auto-standard.pdf",
            ),
        ];

        Self {
            snippets: RwLock::new(
                canned
                    .into_iter()
                    .map(|(text, source)| Snippet {
                        text: text.into(),
                        score: 1.0,
                        source: Some(source.into()),
                    })
                    .collect(),
            ),
        }
    }

    fn overlap_score(query: &str, text: &str) -> f32 {
        let text = text.to_lowercase();
        let mut hits = 0usize;
        let mut total = 0usize;
        for word in query
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 3)
        {
            total += 1;
            if text.contains(word) {
                hits += 1;
            }
        }
        if total == 0 {
            0.0
        } else {
            hits as f32 / total as f32
        }
    }
}

#[async_trait]
impl KnowledgeIndex for MockKnowledgeIndex {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Snippet>> {
        let snippets = self.snippets.read().await;
        let mut scored: Vec<Snippet> = snippets
            .iter()
            .map(|s| Snippet {
                score: Self::overlap_score(query, &s.text),
                ..s.clone()
            })
            .filter(|s| s.score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn upsert(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        let mut snippets = self.snippets.write().await;
        for chunk in chunks {
            snippets.push(Snippet {
                text: chunk.text.clone(),
                score: 1.0,
                source: Some(chunk.source.clone()),
            });
        }
        Ok(chunks.len())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_matches_spanish_theft_query() {
        let index = MockKnowledgeIndex::with_sample_policies();
        let hits = index
            .search("¿Qué cubre la póliza contra robos?", 3)
            .await
            .unwrap();
        assert!(!hits.is_empty());
        assert!(hits[0].text.contains("robo"));
    }

    #[tokio::test]
    async fn test_empty_index_returns_nothing() {
        let index = MockKnowledgeIndex::empty();
        let hits = index.search("robo", 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_becomes_searchable() {
        let index = MockKnowledgeIndex::empty();
        index
            .upsert(&[DocumentChunk {
                id: "doc#0".into(),
                text: "Waiting period for dental coverage is ninety days.".into(),
                source: "s3://bucket/dental.pdf".into(),
                chunk_index: 0,
            }])
            .await
            .unwrap();

        let hits = index.search("dental waiting period", 3).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source.as_deref(), Some("s3://bucket/dental.pdf"));
    }
}
