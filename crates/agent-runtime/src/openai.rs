//! OpenAI-compatible Chat Provider
//!
//! Implementation of `ChatProvider` for chat-completions endpoints with
//! native function calling.

use std::collections::HashMap;
use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role, ToolCall},
    provider::{ChatProvider, ChatTurn, FinishReason, GenerationOptions, TokenUsage},
    tool::ToolSchema,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// OpenAI provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API base URL, without the endpoint path
    pub base_url: String,

    /// Bearer token
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            timeout_secs: 120,
        }
    }
}

impl OpenAiConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();

        Self {
            base_url,
            api_key,
            ..Default::default()
        }
    }

    /// Whether an API key is configured
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// OpenAI-compatible chat provider
pub struct OpenAiProvider {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create from configuration
    pub fn from_config(config: OpenAiConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self { http, config }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_config(OpenAiConfig::from_env())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// The API transports arguments as a JSON-encoded string
    arguments: String,
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionDef,
}

#[derive(Serialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

fn wire_messages(messages: &[Message]) -> Vec<WireMessage> {
    messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::Tool => "tool",
            };
            let tool_calls = m
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: call.id.clone(),
                    kind: "function".into(),
                    function: WireFunctionCall {
                        name: call.name.clone(),
                        arguments: serde_json::to_string(&call.arguments)
                            .unwrap_or_else(|_| "{}".into()),
                    },
                })
                .collect::<Vec<_>>();

            // Tool-calling assistant messages often have no text; the API
            // wants null content there, not an empty string
            let content = if m.content.is_empty() && !tool_calls.is_empty() {
                None
            } else {
                Some(m.content.clone())
            };

            WireMessage {
                role: role.into(),
                content,
                tool_calls,
                tool_call_id: m.tool_call_id.clone(),
            }
        })
        .collect()
}

fn wire_tools(tools: &[ToolSchema]) -> Vec<WireTool> {
    tools
        .iter()
        .map(|schema| WireTool {
            kind: "function",
            function: WireFunctionDef {
                name: schema.name.clone(),
                description: schema.description.clone(),
                parameters: schema.parameters_json_schema(),
            },
        })
        .collect()
}

fn parse_message(wire: WireMessage) -> Message {
    let tool_calls = wire
        .tool_calls
        .into_iter()
        .map(|call| {
            let arguments: HashMap<String, serde_json::Value> =
                serde_json::from_str(&call.function.arguments).unwrap_or_else(|e| {
                    tracing::warn!(
                        tool = %call.function.name,
                        error = %e,
                        "unparseable tool-call arguments, passing empty map"
                    );
                    HashMap::new()
                });
            ToolCall {
                id: call.id,
                name: call.function.name,
                arguments,
            }
        })
        .collect();

    Message {
        tool_calls,
        ..Message::assistant(wire.content.unwrap_or_default())
    }
}

fn parse_finish_reason(reason: Option<&str>) -> Option<FinishReason> {
    match reason {
        Some("stop") => Some(FinishReason::Stop),
        Some("length") => Some(FinishReason::Length),
        Some("tool_calls") => Some(FinishReason::ToolCalls),
        Some("content_filter") => Some(FinishReason::ContentFilter),
        _ => None,
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn health_check(&self) -> Result<bool> {
        let response = self
            .http
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => {
                tracing::warn!("provider health check failed: {e}");
                Ok(false)
            }
        }
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<ChatTurn> {
        let request = WireRequest {
            model: &options.model,
            messages: wire_messages(messages),
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
            tools: wire_tools(tools),
        };

        let response = self
            .http
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail: String = body.chars().take(300).collect();
            return Err(AgentError::Provider(format!("HTTP {status}: {detail}")));
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("invalid response body: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("response carried no choices".into()))?;

        Ok(ChatTurn {
            finish_reason: parse_finish_reason(choice.finish_reason.as_deref()),
            message: parse_message(choice.message),
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::tool::ParameterSchema;

    #[test]
    fn test_wire_messages_roles_and_correlation() {
        let messages = vec![
            Message::system("be helpful"),
            Message::user("hola"),
            Message::assistant_with_calls(
                "",
                vec![ToolCall::new("call_1", "web_search").with_arg("query", "seguros")],
            ),
            Message::tool("results", "call_1"),
        ];

        let wire = wire_messages(&messages);
        assert_eq!(wire[0].role, "system");
        assert_eq!(wire[1].role, "user");
        assert_eq!(wire[2].role, "assistant");
        // Tool-calling message with no text serializes null content
        assert!(wire[2].content.is_none());
        assert_eq!(wire[2].tool_calls[0].id, "call_1");
        assert!(wire[2].tool_calls[0].function.arguments.contains("seguros"));
        assert_eq!(wire[3].role, "tool");
        assert_eq!(wire[3].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_wire_tools_shape() {
        let schema = ToolSchema {
            name: "policy_knowledge_search".into(),
            description: "Searches internal policies".into(),
            parameters: vec![ParameterSchema::required_string("query", "Search query")],
        };

        let wire = wire_tools(&[schema]);
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json[0]["type"], "function");
        assert_eq!(json[0]["function"]["name"], "policy_knowledge_search");
        assert_eq!(
            json[0]["function"]["parameters"]["properties"]["query"]["type"],
            "string"
        );
    }

    #[test]
    fn test_parse_tool_calling_response() {
        let body = serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "specific_document_qa",
                            "arguments": "{\"query\": \"deducible\", \"document_url\": \"https://x/p.pdf\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });

        let parsed: WireResponse = serde_json::from_value(body).unwrap();
        let choice = parsed.choices.into_iter().next().unwrap();
        let message = parse_message(choice.message);

        assert!(message.requests_tools());
        assert_eq!(message.tool_calls[0].id, "call_abc");
        assert_eq!(message.tool_calls[0].name, "specific_document_qa");
        assert_eq!(message.tool_calls[0].arg_str("query"), Some("deducible"));
        assert_eq!(
            parse_finish_reason(choice.finish_reason.as_deref()),
            Some(FinishReason::ToolCalls)
        );
    }

    #[test]
    fn test_parse_plain_answer() {
        let body = serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": "La póliza cubre robos."},
                "finish_reason": "stop"
            }]
        });

        let parsed: WireResponse = serde_json::from_value(body).unwrap();
        let message = parse_message(parsed.choices.into_iter().next().unwrap().message);
        assert_eq!(message.content, "La póliza cubre robos.");
        assert!(message.tool_calls.is_empty());
    }

    #[test]
    fn test_bad_arguments_degrade_to_empty_map() {
        let wire = WireMessage {
            role: "assistant".into(),
            content: None,
            tool_calls: vec![WireToolCall {
                id: "call_1".into(),
                kind: "function".into(),
                function: WireFunctionCall {
                    name: "web_search".into(),
                    arguments: "not json".into(),
                },
            }],
            tool_call_id: None,
        };

        let message = parse_message(wire);
        assert!(message.tool_calls[0].arguments.is_empty());
    }
}
