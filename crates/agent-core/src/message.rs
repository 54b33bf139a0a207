//! Conversation Messages
//!
//! Message format used across the agent system. Assistant messages may
//! carry tool calls; tool messages answer them, correlated by `call_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result, answering one tool call
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A tool invocation requested by the model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier, unique within the emitting message. Tool result
    /// messages echo it back; correlation is by id, not position.
    pub id: String,

    /// Tool identifier (must match a registered tool name)
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, serde_json::Value>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: HashMap::new(),
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// Fetch a string argument by name
    pub fn arg_str(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).and_then(|v| v.as_str())
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content (may be empty on tool-calling assistant messages)
    pub content: String,

    /// Tool calls requested by this message, in emission order.
    /// Only ever non-empty on assistant messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// For tool messages: id of the call this message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message with plain content
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant message carrying tool calls
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let mut msg = Self::new(Role::Assistant, content);
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create a tool result message answering `call_id`
    pub fn tool(content: impl Into<String>, call_id: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, content);
        msg.tool_call_id = Some(call_id.into());
        msg
    }

    /// Whether this message requests tool execution
    pub fn requests_tools(&self) -> bool {
        self.role == Role::Assistant && !self.tool_calls.is_empty()
    }
}

/// Ordered, append-only message history for one run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let mut conv = Self::new();
        conv.push(Message::system(prompt));
        conv
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Insert a system message at the front unless one already leads
    pub fn ensure_system_prompt(&mut self, prompt: &str) {
        if self.messages.first().map(|m| m.role) != Some(Role::System) {
            self.messages.insert(0, Message::system(prompt));
        }
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(!msg.requests_tools());
    }

    #[test]
    fn test_tool_call_correlation_fields() {
        let call = ToolCall::new("call_1", "web_search").with_arg("query", "insurance");
        let msg = Message::assistant_with_calls("", vec![call]);
        assert!(msg.requests_tools());

        let reply = Message::tool("results", "call_1");
        assert_eq!(reply.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(reply.role, Role::Tool);
    }

    #[test]
    fn test_arg_str() {
        let call = ToolCall::new("c", "t")
            .with_arg("query", "robo")
            .with_arg("top_k", 3);
        assert_eq!(call.arg_str("query"), Some("robo"));
        assert_eq!(call.arg_str("top_k"), None);
        assert_eq!(call.arg_str("missing"), None);
    }

    #[test]
    fn test_serde_skips_empty_tool_fields() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert!(json.get("tool_calls").is_none());
        assert!(json.get("tool_call_id").is_none());

        let call = ToolCall::new("call_9", "policy_knowledge_search");
        let json = serde_json::to_value(Message::assistant_with_calls("", vec![call])).unwrap();
        assert_eq!(json["tool_calls"][0]["id"], "call_9");
    }

    #[test]
    fn test_ensure_system_prompt() {
        let mut conv = Conversation::new();
        conv.push(Message::user("Hi"));
        conv.ensure_system_prompt("You are helpful.");
        assert_eq!(conv.messages()[0].role, Role::System);
        assert_eq!(conv.len(), 2);

        // A second call must not stack another system message
        conv.ensure_system_prompt("You are helpful.");
        assert_eq!(conv.len(), 2);
    }
}
