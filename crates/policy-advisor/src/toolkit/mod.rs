//! Agent Toolkit
//!
//! Domain tools implementing `agent_core::Tool` for the policy agent, and
//! the per-turn registry builder.

mod document_qa;
mod knowledge_search;
mod web_search;

pub use document_qa::DocumentQaTool;
pub use knowledge_search::KnowledgeSearchTool;
pub use web_search::WebSearchTool;

use std::sync::Arc;

use agent_core::ToolRegistry;

use crate::document::DocumentFetcher;
use crate::retrieval::KnowledgeIndex;

/// Build the two tool registries used per turn.
///
/// The general registry serves turns without a document reference. The
/// document registry serves turns where a `document_url` accompanies the
/// query: it deliberately omits the internal knowledge search so those
/// turns can only be answered from the referenced document (plus the web,
/// when configured).
pub fn build_registries(
    index: Arc<dyn KnowledgeIndex>,
    fetcher: Arc<DocumentFetcher>,
    web_search: Option<WebSearchTool>,
) -> (ToolRegistry, ToolRegistry) {
    let mut general = ToolRegistry::new();
    general.register(KnowledgeSearchTool::new(index));
    general.register(DocumentQaTool::new(fetcher.clone()));

    let mut document = ToolRegistry::new();
    document.register(DocumentQaTool::new(fetcher));

    if let Some(tool) = web_search {
        general.register(tool.clone());
        document.register(tool);
    }

    (general, document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::MockKnowledgeIndex;
    use agent_core::{
        error::{AgentError, Result as CoreResult},
        provider::{ChatProvider, ChatTurn, GenerationOptions},
        tool::ToolSchema,
        Agent, AgentConfig, Conversation, Message, Role, ToolCall,
    };
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn registries(web: bool) -> (ToolRegistry, ToolRegistry) {
        build_registries(
            Arc::new(MockKnowledgeIndex::empty()),
            Arc::new(DocumentFetcher::new()),
            web.then(|| WebSearchTool::new("test-key")),
        )
    }

    #[test]
    fn test_document_registry_excludes_knowledge_search() {
        let (general, document) = registries(true);

        assert!(general.get("policy_knowledge_search").is_some());
        assert!(general.get("specific_document_qa").is_some());
        assert!(general.get("web_search").is_some());

        assert!(document.get("policy_knowledge_search").is_none());
        assert!(document.get("specific_document_qa").is_some());
        assert!(document.get("web_search").is_some());
    }

    #[test]
    fn test_web_search_only_registered_when_configured() {
        let (general, document) = registries(false);
        assert!(general.get("web_search").is_none());
        assert!(document.get("web_search").is_none());
        assert_eq!(general.len(), 2);
        assert_eq!(document.len(), 1);
    }

    /// Provider replaying scripted assistant messages
    struct ScriptedProvider {
        script: Mutex<VecDeque<Message>>,
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn health_check(&self) -> CoreResult<bool> {
            Ok(true)
        }

        async fn chat(
            &self,
            _messages: &[Message],
            _tools: &[ToolSchema],
            _options: &GenerationOptions,
        ) -> CoreResult<ChatTurn> {
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

    #[tokio::test]
    async fn test_knowledge_query_round_trip() {
        // Model asks for internal knowledge, gets the retrieved snippet
        // back, then answers without tool calls
        let provider = Arc::new(ScriptedProvider {
            script: Mutex::new(
                vec![
                    Message::assistant_with_calls(
                        "",
                        vec![ToolCall::new("call_1", "policy_knowledge_search")
                            .with_arg("query", "cobertura de la póliza contra robos")],
                    ),
                    Message::assistant(
                        "La póliza de hogar cubre el robo hasta 15.000 EUR con un deducible \
                         de 300 EUR.",
                    ),
                ]
                .into(),
            ),
        });

        let (general, _) = build_registries(
            Arc::new(MockKnowledgeIndex::with_sample_policies()),
            Arc::new(DocumentFetcher::new()),
            None,
        );
        let agent = Agent::new(provider, Arc::new(general), AgentConfig::default());

        let mut conversation = Conversation::new();
        conversation.push(Message::user("¿Qué cubre la póliza contra robos?"));

        let answer = agent.run(&mut conversation).await.unwrap();
        assert!(answer.contains("15.000 EUR"));

        // The tool result fed back into the loop carried the retrieved
        // snippet, correlated to the emitted call
        let tool_message = conversation
            .messages()
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
        assert!(tool_message.content.starts_with("Retrieved context:"));
        assert!(tool_message.content.contains("robo"));
    }
}
