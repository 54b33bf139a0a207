//! # agent-core
//!
//! Core agent logic: conversation model with tool-call correlation, an
//! extensible tool system and the reasoning cycle that drives a turn.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Agent                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Reasoning  │  │    Tools    │  │   ChatProvider      │  │
//! │  │    Cycle    │──│   Registry  │──│   (Strategy)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ChatProvider` trait enables swapping model backends without
//! changing agent logic; the registry is the only tool dispatch path, so an
//! unknown tool name requested by the model always degrades to an error
//! result instead of a crash.

pub mod error;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role, ToolCall};
pub use provider::{ChatProvider, ChatTurn, GenerationOptions};
pub use reasoning::{Agent, AgentConfig, final_answer};
pub use session::{MemorySessionStore, SessionStore, Thread, ThreadGuard, ThreadId};
pub use tool::{Tool, ToolRegistry, ToolSchema};
