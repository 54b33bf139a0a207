//! Chat Provider Strategy Pattern
//!
//! Defines a common interface for model backends so the agent can work
//! with any chat-completion API that supports tool calling.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{ChatProvider, GenerationOptions};
//!
//! let turn = provider.chat(messages, &schemas, &options).await?;
//! if turn.message.requests_tools() { /* run the acting step */ }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::tool::ToolSchema;

/// Configuration for model generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gpt-4o")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic)
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens to generate, provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Top-p nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_top_p() -> f32 {
    1.0
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o".into(),
            temperature: 0.0,
            max_tokens: None,
            top_p: default_top_p(),
        }
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason the model stopped generating
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Error,
}

/// One model response within a reasoning cycle
#[derive(Clone, Debug)]
pub struct ChatTurn {
    /// The assistant message, possibly carrying tool calls
    pub message: Message,

    /// Token usage statistics (if reported)
    pub usage: Option<TokenUsage>,

    /// Why generation stopped
    pub finish_reason: Option<FinishReason>,
}

/// Strategy trait for chat model backends
///
/// Implement this trait to add support for a new backend. The agent works
/// exclusively through this interface and never retries on its own;
/// upstream failures surface as provider errors.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Check if the provider is reachable and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Generate the next assistant message. `tools` is the schema set the
    /// model may route to; pass an empty slice for plain completion.
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<ChatTurn>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert_eq!(opts.model, "gpt-4o");
        assert_eq!(opts.temperature, 0.0);
        assert_eq!(opts.top_p, 1.0);
        assert!(opts.max_tokens.is_none());
    }
}
