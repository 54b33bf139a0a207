//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Model provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool validation failed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Reasoning/acting round trips exceeded the configured cap
    #[error("Cycle limit ({0}) exceeded without a final answer")]
    CycleLimit(usize),

    /// The run terminated but no assistant message without tool calls exists
    #[error("No extractable final answer in the message sequence")]
    NoFinalAnswer,

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Convert to a caller-safe message (no internal detail)
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Provider(_) | AgentError::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            AgentError::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            AgentError::ToolValidation(msg) => format!("Invalid tool input: {msg}"),
            AgentError::ToolExecution(_) => "A tool failed while processing the request.".into(),
            AgentError::CycleLimit(_) => {
                "The request took too many reasoning steps. Please try a simpler query.".into()
            }
            AgentError::NoFinalAnswer => {
                "The agent finished without producing an answer. Please rephrase the query.".into()
            }
            AgentError::Session(_) => "The conversation could not be resumed.".into(),
            AgentError::Config(_) => "The service is misconfigured.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}
