//! Reasoning Cycle
//!
//! The two-state machine that drives a turn: REASONING asks the model for
//! the next message, ACTING resolves every tool call that message emitted.
//! The cycle repeats until the model answers without tool calls or the
//! configured cycle cap is hit.

use std::sync::Arc;

use futures::future;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message, Role, ToolCall};
use crate::provider::{ChatProvider, GenerationOptions};
use crate::tool::ToolRegistry;

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt template
    pub system_prompt: String,

    /// Maximum REASONING ⇄ ACTING round trips before the turn fails
    pub max_cycles: usize,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_cycles: 15,
            generation: GenerationOptions::default(),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. \
Use the available tools when they can ground your answer in real data; \
answer directly when they cannot. Be concise and accurate.";

/// Orchestration state. Termination is a transition out of `Reasoning`,
/// not a stored state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Reasoning,
    Acting,
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn ChatProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(provider: Arc<dyn ChatProvider>, tools: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn ChatProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Drive the cycle over `conversation` until the model produces a
    /// final answer.
    ///
    /// Every tool call the model emits is resolved exactly once and its
    /// result appended before the next reasoning step. Exceeding
    /// `max_cycles` fails the turn; it never truncates silently.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<String> {
        conversation.ensure_system_prompt(&self.config.system_prompt);

        let schemas = self.tools.schemas();
        let mut cycles = 0usize;
        let mut step = Step::Reasoning;

        loop {
            match step {
                Step::Reasoning => {
                    cycles += 1;
                    if cycles > self.config.max_cycles {
                        tracing::warn!(max = self.config.max_cycles, "cycle limit exceeded");
                        return Err(AgentError::CycleLimit(self.config.max_cycles));
                    }

                    let turn = self
                        .provider
                        .chat(conversation.messages(), &schemas, &self.config.generation)
                        .await?;

                    let done = !turn.message.requests_tools();
                    conversation.push(turn.message);

                    if done {
                        break;
                    }
                    step = Step::Acting;
                }
                Step::Acting => {
                    let calls: Vec<ToolCall> = conversation
                        .last()
                        .map(|m| m.tool_calls.clone())
                        .unwrap_or_default();

                    // Calls are independent reads; run them concurrently.
                    // join_all yields results in input order, which keeps
                    // the appended sequence deterministic regardless of
                    // completion order.
                    let results = future::join_all(calls.iter().map(|c| self.dispatch(c))).await;
                    for message in results {
                        conversation.push(message);
                    }
                    step = Step::Reasoning;
                }
            }
        }

        Ok(final_answer(conversation.messages())?.to_owned())
    }

    /// Resolve one tool call into a tool message. Unknown tools and tool
    /// failures become error strings the model can reason about; they
    /// never abort the turn.
    async fn dispatch(&self, call: &ToolCall) -> Message {
        tracing::debug!(tool = %call.name, call_id = %call.id, "executing tool call");

        match self.tools.execute(call).await {
            Ok(output) => Message::tool(output, call.id.clone()),
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                Message::tool(format!("Tool '{}' failed: {e}", call.name), call.id.clone())
            }
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Locate the final answer of a completed run: the last assistant message
/// that carries no tool calls. Pure function of the sequence.
pub fn final_answer(messages: &[Message]) -> Result<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant && m.tool_calls.is_empty())
        .map(|m| m.content.as_str())
        .ok_or(AgentError::NoFinalAnswer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ChatTurn;
    use crate::tool::{ParameterSchema, Tool, ToolSchema};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Provider that replays a scripted sequence of assistant messages
    struct ScriptedProvider {
        script: Mutex<VecDeque<Message>>,
    }

    impl ScriptedProvider {
        fn new(messages: Vec<Message>) -> Self {
            Self {
                script: Mutex::new(messages.into()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn chat(
            &self,
            _messages: &[Message],
            _tools: &[ToolSchema],
            _options: &GenerationOptions,
        ) -> Result<ChatTurn> {
            let message = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AgentError::Provider("script exhausted".into()))?;
            Ok(ChatTurn {
                message,
                usage: None,
                finish_reason: None,
            })
        }
    }

    /// Tool that records invocation order and optionally sleeps first
    struct RecordingTool {
        name: String,
        delay: Duration,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.name.clone(),
                description: "Echoes its query".into(),
                parameters: vec![ParameterSchema::required_string("query", "Echo input")],
            }
        }

        async fn invoke(&self, call: &ToolCall) -> Result<String> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.log.lock().unwrap().push(self.name.clone());
            Ok(format!("{}:{}", self.name, call.arg_str("query").unwrap_or("")))
        }
    }

    fn recording_registry(log: &Arc<Mutex<Vec<String>>>, slow_first: bool) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(RecordingTool {
            name: "alpha".into(),
            delay: if slow_first {
                Duration::from_millis(50)
            } else {
                Duration::ZERO
            },
            log: log.clone(),
        });
        registry.register(RecordingTool {
            name: "beta".into(),
            delay: Duration::ZERO,
            log: log.clone(),
        });
        registry
    }

    fn agent(provider: ScriptedProvider, registry: ToolRegistry, max_cycles: usize) -> Agent {
        Agent::new(
            Arc::new(provider),
            Arc::new(registry),
            AgentConfig {
                max_cycles,
                ..AgentConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_direct_answer_terminates() {
        let provider = ScriptedProvider::new(vec![Message::assistant("All good.")]);
        let agent = agent(provider, ToolRegistry::new(), 15);

        let mut conv = Conversation::new();
        conv.push(Message::user("Anything to report?"));

        let answer = agent.run(&mut conv).await.unwrap();
        assert_eq!(answer, "All good.");
        assert_eq!(conv.last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_tool_call_resolved_then_answer() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let provider = ScriptedProvider::new(vec![
            Message::assistant_with_calls(
                "",
                vec![ToolCall::new("call_1", "alpha").with_arg("query", "deducible")],
            ),
            Message::assistant("Synthesized answer."),
        ]);
        let agent = agent(provider, recording_registry(&log, false), 15);

        let mut conv = Conversation::new();
        conv.push(Message::user("¿Cuál es el deducible?"));

        let answer = agent.run(&mut conv).await.unwrap();
        assert_eq!(answer, "Synthesized answer.");

        // system, user, assistant(tool call), tool, assistant
        let messages = conv.messages();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[3].role, Role::Tool);
        assert_eq!(messages[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(messages[3].content, "alpha:deducible");
    }

    #[tokio::test]
    async fn test_parallel_calls_append_in_emission_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let provider = ScriptedProvider::new(vec![
            Message::assistant_with_calls(
                "",
                vec![
                    ToolCall::new("call_a", "alpha").with_arg("query", "1"),
                    ToolCall::new("call_b", "beta").with_arg("query", "2"),
                ],
            ),
            Message::assistant("done"),
        ]);
        // alpha sleeps, so beta COMPLETES first - appended order must still
        // be emission order
        let agent = agent(provider, recording_registry(&log, true), 15);

        let mut conv = Conversation::new();
        conv.push(Message::user("compare"));
        agent.run(&mut conv).await.unwrap();

        let completion_order = log.lock().unwrap().clone();
        assert_eq!(completion_order, vec!["beta".to_string(), "alpha".to_string()]);

        let tool_messages: Vec<_> = conv
            .messages()
            .iter()
            .filter(|m| m.role == Role::Tool)
            .collect();
        assert_eq!(tool_messages.len(), 2);
        assert_eq!(tool_messages[0].tool_call_id.as_deref(), Some("call_a"));
        assert_eq!(tool_messages[1].tool_call_id.as_deref(), Some("call_b"));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_error_message() {
        let provider = ScriptedProvider::new(vec![
            Message::assistant_with_calls("", vec![ToolCall::new("call_x", "imaginary")]),
            Message::assistant("Recovered."),
        ]);
        let agent = agent(provider, ToolRegistry::new(), 15);

        let mut conv = Conversation::new();
        conv.push(Message::user("go"));

        let answer = agent.run(&mut conv).await.unwrap();
        assert_eq!(answer, "Recovered.");

        let tool_msg = conv
            .messages()
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_x"));
        assert!(tool_msg.content.contains("imaginary"));
        assert!(tool_msg.content.contains("failed"));
    }

    #[tokio::test]
    async fn test_cycle_limit_is_fatal() {
        // The model never stops calling tools
        let looping: Vec<Message> = (0..10)
            .map(|i| {
                Message::assistant_with_calls(
                    "",
                    vec![ToolCall::new(format!("call_{i}"), "alpha").with_arg("query", "again")],
                )
            })
            .collect();
        let log = Arc::new(Mutex::new(Vec::new()));
        let agent = agent(ScriptedProvider::new(looping), recording_registry(&log, false), 3);

        let mut conv = Conversation::new();
        conv.push(Message::user("loop"));

        let err = agent.run(&mut conv).await.unwrap_err();
        assert!(matches!(err, AgentError::CycleLimit(3)));
    }

    #[test]
    fn test_final_answer_extraction() {
        let messages = vec![
            Message::user("q"),
            Message::assistant_with_calls("", vec![ToolCall::new("c1", "alpha")]),
            Message::tool("out", "c1"),
            Message::assistant("the answer"),
        ];
        assert_eq!(final_answer(&messages).unwrap(), "the answer");
        // Idempotent: pure function of the sequence
        assert_eq!(final_answer(&messages).unwrap(), "the answer");
    }

    #[test]
    fn test_final_answer_missing_is_distinct_error() {
        let only_tool_callers = vec![
            Message::user("q"),
            Message::assistant_with_calls("", vec![ToolCall::new("c1", "alpha")]),
            Message::tool("out", "c1"),
        ];
        assert!(matches!(
            final_answer(&only_tool_callers),
            Err(AgentError::NoFinalAnswer)
        ));
        assert!(matches!(final_answer(&[]), Err(AgentError::NoFinalAnswer)));
    }

    #[test]
    fn test_final_answer_allows_empty_content() {
        // A successful empty answer is not the same as "no answer"
        let messages = vec![Message::user("q"), Message::assistant("")];
        assert_eq!(final_answer(&messages).unwrap(), "");
    }
}
