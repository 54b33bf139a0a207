//! # agent-runtime
//!
//! Model providers for the policy agent.
//!
//! ## Providers
//!
//! - **OpenAI-compatible** (default): any chat-completions endpoint with
//!   native function calling (OpenAI, Azure OpenAI, self-hosted proxies)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env();
//! let agent = Agent::with_defaults(Arc::new(provider), tools);
//! ```

pub mod openai;

pub use openai::{OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, ChatProvider, Conversation, Message, Result, Role, Tool, ToolRegistry,
};
