//! Tool System
//!
//! Extensible tool framework for agent capabilities. Tools are registered
//! at startup and invoked by the reasoning cycle; dispatch goes through the
//! registry only, so the model can never name its way into arbitrary code.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::ToolCall;

/// Parameter definition for a tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

impl ParameterSchema {
    /// A required string parameter
    pub fn required_string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: "string".into(),
            description: description.into(),
            required: true,
        }
    }
}

/// Tool definition schema (consumed by the model for routing)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Natural-language description, read by the model to decide when to
    /// invoke the tool — never by dispatch logic
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// Render the parameter list as a JSON Schema object, the shape
    /// function-calling APIs expect
    pub fn parameters_json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.param_type,
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(serde_json::Value::String(param.name.clone()));
            }
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Tool trait - implement to add new capabilities
///
/// `invoke` returns the tool's string output. Implementations should catch
/// their own failure modes and return descriptive text where the model can
/// still act on the outcome; errors that do escape are converted to error
/// strings by the reasoning cycle, never surfaced as a crashed turn.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for model-side routing
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with the call's arguments
    async fn invoke(&self, call: &ToolCall) -> Result<String>;

    /// Validate arguments before execution (optional)
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            if param.required && !call.arguments.contains_key(&param.name) {
                return Err(AgentError::ToolValidation(format!(
                    "Missing required parameter: {}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// Registry for available tools
///
/// Built once at startup; insertion order is preserved so the schema list
/// handed to the model is deterministic.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_boxed(Arc::new(tool));
    }

    /// Register a boxed tool; re-registering a name replaces the tool in
    /// place
    pub fn register_boxed(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        let existing = self.by_name.get(&name).copied();
        match existing {
            Some(idx) => self.tools[idx] = tool,
            None => {
                self.by_name.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.by_name.get(name).map(|&idx| self.tools[idx].clone())
    }

    /// Execute a tool call, returning the tool's string output
    pub async fn execute(&self, call: &ToolCall) -> Result<String> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        tool.validate(call)?;
        tool.invoke(call).await
    }

    /// Get all tool schemas, in registration order
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Get tool names, in registration order
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.schema().name).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "upper".into(),
                description: "Uppercases the input text".into(),
                parameters: vec![ParameterSchema::required_string("text", "Text to transform")],
            }
        }

        async fn invoke(&self, call: &ToolCall) -> Result<String> {
            let text = call
                .arg_str("text")
                .ok_or_else(|| AgentError::ToolValidation("Missing text".into()))?;
            Ok(text.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_registry_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(UpperTool);

        let call = ToolCall::new("call_1", "upper").with_arg("text", "hola");
        assert_eq!(registry.execute(&call).await.unwrap(), "HOLA");
    }

    #[tokio::test]
    async fn test_registry_unknown_tool() {
        let registry = ToolRegistry::new();
        let call = ToolCall::new("call_1", "nope");
        let err = registry.execute(&call).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolNotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_registry_validates_required_params() {
        let mut registry = ToolRegistry::new();
        registry.register(UpperTool);

        let call = ToolCall::new("call_1", "upper");
        let err = registry.execute(&call).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolValidation(_)));
    }

    #[test]
    fn test_parameters_json_schema() {
        let schema = UpperTool.schema();
        let json = schema.parameters_json_schema();
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["text"]["type"], "string");
        assert_eq!(json["required"][0], "text");
    }

    #[test]
    fn test_reregistering_replaces() {
        let mut registry = ToolRegistry::new();
        registry.register(UpperTool);
        registry.register(UpperTool);
        assert_eq!(registry.len(), 1);
    }
}
