//! Internal Knowledge Search Tool
//!
//! Similarity search over the persistent policy knowledge base.

use std::sync::Arc;

use agent_core::{
    tool::{ParameterSchema, Tool, ToolSchema},
    AgentError, Result as CoreResult, ToolCall,
};
use async_trait::async_trait;

use crate::retrieval::KnowledgeIndex;

const TOP_K: usize = 3;

/// Tool searching the internal policy knowledge base
pub struct KnowledgeSearchTool {
    index: Arc<dyn KnowledgeIndex>,
}

impl KnowledgeSearchTool {
    pub fn new(index: Arc<dyn KnowledgeIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "policy_knowledge_search".into(),
            description: "Searches the company's internal knowledge base of insurance \
                          policies and answers questions about coverage, deductibles and \
                          terms. Do NOT use this tool when a specific policy document URL \
                          is available in the conversation; use specific_document_qa \
                          instead."
                .into(),
            parameters: vec![ParameterSchema::required_string(
                "query",
                "The question or search terms to look up in the knowledge base",
            )],
        }
    }

    async fn invoke(&self, call: &ToolCall) -> CoreResult<String> {
        let query = call
            .arg_str("query")
            .ok_or_else(|| AgentError::ToolValidation("Missing query".into()))?;

        tracing::info!(%query, "executing knowledge search");

        let snippets = match self.index.search(query, TOP_K).await {
            Ok(snippets) => snippets,
            Err(e) => {
                tracing::error!(error = %e, "knowledge search failed");
                return Ok(format!("Error searching the internal knowledge base: {e}"));
            }
        };

        if snippets.is_empty() {
            return Ok(
                "No relevant policy information found in the internal knowledge base.".into(),
            );
        }

        tracing::info!(count = snippets.len(), "knowledge search returned snippets");

        let context = snippets
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(format!("Retrieved context:\n{context}"))
    }
}
