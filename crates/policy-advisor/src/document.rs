//! Policy Document Handling
//!
//! Download of externally referenced PDF documents, text extraction and
//! the bounded context prefix handed to the model.

use std::time::Duration;

use crate::error::{AdvisorError, Result};

/// Maximum number of characters of extracted document text used as model
/// context
pub const DOCUMENT_CONTEXT_LIMIT: usize = 12_000;

/// Whether the bytes look like a PDF (magic prefix, not the client's
/// content-type header)
pub fn sniff_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

/// Extract plain text from PDF bytes
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AdvisorError::Extraction(e.to_string()))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(AdvisorError::EmptyDocument);
    }
    Ok(text.to_owned())
}

/// Truncate extracted text to the bounded context prefix, on a char
/// boundary
pub fn truncate_to_context(text: &str) -> &str {
    match text.char_indices().nth(DOCUMENT_CONTEXT_LIMIT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Downloads referenced policy documents and extracts their text
pub struct DocumentFetcher {
    http: reqwest::Client,
}

impl Default for DocumentFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentFetcher {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { http }
    }

    /// Download the document at `url` and return its extracted text,
    /// untruncated. Callers bound it with [`truncate_to_context`].
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AdvisorError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdvisorError::Download(format!("HTTP {status} from {url}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AdvisorError::Download(e.to_string()))?;

        extract_pdf_text(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_pdf() {
        assert!(sniff_pdf(b"%PDF-1.7 rest of file"));
        assert!(!sniff_pdf(b"<html>not a pdf</html>"));
        assert!(!sniff_pdf(b""));
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        let text = "short policy text";
        assert_eq!(truncate_to_context(text), text);
    }

    #[test]
    fn test_truncate_bounds_by_chars_not_bytes() {
        // Multibyte chars: á is 2 bytes; the bound must count characters
        // and cut on a valid boundary
        let text = "á".repeat(DOCUMENT_CONTEXT_LIMIT + 100);
        let truncated = truncate_to_context(&text);
        assert_eq!(truncated.chars().count(), DOCUMENT_CONTEXT_LIMIT);
        assert_eq!(truncated.len(), DOCUMENT_CONTEXT_LIMIT * 2);
    }

    #[test]
    fn test_truncate_exact_limit() {
        let text = "x".repeat(DOCUMENT_CONTEXT_LIMIT);
        assert_eq!(truncate_to_context(&text).len(), DOCUMENT_CONTEXT_LIMIT);
    }
}
