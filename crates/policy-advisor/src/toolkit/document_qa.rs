//! Specific Document QA Tool
//!
//! Answers questions about one referenced policy document: downloads it,
//! extracts the text and returns a bounded context prefix for the model to
//! reason over.

use std::sync::Arc;

use agent_core::{
    tool::{ParameterSchema, Tool, ToolSchema},
    AgentError, Result as CoreResult, ToolCall,
};
use async_trait::async_trait;

use crate::document::{truncate_to_context, DocumentFetcher};
use crate::error::AdvisorError;

/// Tool answering questions about a specific referenced document
pub struct DocumentQaTool {
    fetcher: Arc<DocumentFetcher>,
}

impl DocumentQaTool {
    pub fn new(fetcher: Arc<DocumentFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Tool for DocumentQaTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "specific_document_qa".into(),
            description: "Answers questions about one specific insurance policy document \
                          referenced by URL. This tool MUST be used whenever a policy \
                          document URL is available in the conversation: it downloads the \
                          document, extracts its text and provides it as context for the \
                          answer."
                .into(),
            parameters: vec![
                ParameterSchema::required_string("query", "The user's question about the document"),
                ParameterSchema::required_string(
                    "document_url",
                    "HTTP(S) URL of the PDF document to read",
                ),
            ],
        }
    }

    async fn invoke(&self, call: &ToolCall) -> CoreResult<String> {
        let _query = call
            .arg_str("query")
            .ok_or_else(|| AgentError::ToolValidation("Missing query".into()))?;
        let url = call
            .arg_str("document_url")
            .ok_or_else(|| AgentError::ToolValidation("Missing document_url".into()))?;

        tracing::info!(%url, "executing specific-document QA");

        let text = match self.fetcher.fetch_text(url).await {
            Ok(text) => text,
            Err(AdvisorError::Download(e)) => {
                tracing::warn!(%url, error = %e, "document download failed");
                return Ok(
                    "Failed to download the specified document. Please check the URL or network."
                        .into(),
                );
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "document text extraction failed");
                return Ok("Failed to extract text from the specified document. It might be \
                           empty, corrupted, or a scanned PDF without a text layer."
                    .into());
            }
        };

        let snippet = truncate_to_context(&text);
        Ok(format!(
            "Context from the referenced document ({url}):\n\n{snippet}"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_url_is_validation_error() {
        let tool = DocumentQaTool::new(Arc::new(DocumentFetcher::new()));
        let call = ToolCall::new("call_1", "specific_document_qa").with_arg("query", "deducible");
        assert!(tool.invoke(&call).await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_url_degrades_to_error_string() {
        let tool = DocumentQaTool::new(Arc::new(DocumentFetcher::new()));
        let call = ToolCall::new("call_1", "specific_document_qa")
            .with_arg("query", "deducible")
            .with_arg("document_url", "http://127.0.0.1:9/policy.pdf");

        let output = tool.invoke(&call).await.unwrap();
        assert!(output.starts_with("Failed to download"));
    }
}
