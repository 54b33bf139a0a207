//! Policy Drafting and Editing
//!
//! Stateless single-shot operations, deliberately outside the agent's
//! reasoning cycle: draft new policy markup from a prompt, or revise
//! existing markup following an instruction. Revisions always come back as
//! a visual diff against the original; failures degrade to a fixed
//! placeholder in the same markup format.

mod diff;
mod html;

pub use diff::html_diff;
pub use html::normalize_fragment;

use std::sync::Arc;

use agent_core::{ChatProvider, GenerationOptions, Message};

/// Placeholder returned when drafting fails
pub const DRAFT_ERROR_PLACEHOLDER: &str =
    "<p>Unable to generate the policy draft at this time. Please try again.</p>";

/// Placeholder returned when editing fails
pub const EDIT_ERROR_PLACEHOLDER: &str =
    "<p>Unable to apply the requested edit at this time. Please try again.</p>";

const DRAFT_SYSTEM_PROMPT: &str = "You are an insurance policy drafting assistant. Respond \
with the policy text as clean HTML only, using headings, paragraphs and lists. Do not wrap \
the output in markdown code fences and do not add commentary outside the policy text.";

const EDIT_SYSTEM_PROMPT: &str = "You are an insurance policy editor. Apply the user's \
instruction to the provided policy text and respond with the complete revised policy as \
clean HTML only. Keep everything the instruction does not touch unchanged. Do not wrap the \
output in markdown code fences and do not add commentary.";

/// One-shot policy drafting/editing against a chat provider
pub struct PolicyDrafter {
    provider: Arc<dyn ChatProvider>,
    options: GenerationOptions,
}

impl PolicyDrafter {
    pub fn new(provider: Arc<dyn ChatProvider>, options: GenerationOptions) -> Self {
        Self { provider, options }
    }

    /// Draft policy markup from a free-text prompt.
    ///
    /// When `current` is supplied and the draft differs from it, the
    /// returned value is the visual diff of old vs new; otherwise the raw
    /// (normalized) draft.
    pub async fn draft(&self, prompt: &str, current: Option<&str>) -> String {
        let user = match current {
            Some(text) => format!(
                "Existing policy text:\n{text}\n\nDrafting request:\n{prompt}"
            ),
            None => prompt.to_owned(),
        };

        match self.complete(DRAFT_SYSTEM_PROMPT, &user).await {
            Some(draft) => match current {
                Some(prior) if prior != draft => html_diff(prior, &draft),
                _ => draft,
            },
            None => DRAFT_ERROR_PLACEHOLDER.into(),
        }
    }

    /// Revise policy markup following a natural-language instruction.
    ///
    /// The returned value is ALWAYS the visual diff against `current`,
    /// never the raw revised markup.
    pub async fn edit(&self, current: &str, instruction: &str) -> String {
        let user = format!(
            "Current policy text:\n{current}\n\nEdit instruction:\n{instruction}\n\n\
             Return the fully revised policy text."
        );

        match self.complete(EDIT_SYSTEM_PROMPT, &user).await {
            Some(revised) => html_diff(current, &revised),
            None => EDIT_ERROR_PLACEHOLDER.into(),
        }
    }

    async fn complete(&self, system: &str, user: &str) -> Option<String> {
        let messages = [Message::system(system), Message::user(user)];

        match self.provider.chat(&messages, &[], &self.options).await {
            Ok(turn) => {
                let fragment = normalize_fragment(&turn.message.content);
                if fragment.is_empty() {
                    tracing::error!("drafting model returned empty markup");
                    None
                } else {
                    Some(fragment)
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "drafting completion failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{
        error::{AgentError, Result as CoreResult},
        provider::ChatTurn,
        tool::ToolSchema,
    };
    use async_trait::async_trait;

    /// Provider returning one fixed reply, or failing
    struct FixedProvider {
        reply: Option<String>,
    }

    #[async_trait]
    impl ChatProvider for FixedProvider {
        async fn health_check(&self) -> CoreResult<bool> {
            Ok(true)
        }

        async fn chat(
            &self,
            _messages: &[Message],
            _tools: &[ToolSchema],
            _options: &GenerationOptions,
        ) -> CoreResult<ChatTurn> {
            match &self.reply {
                Some(content) => Ok(ChatTurn {
                    message: Message::assistant(content.clone()),
                    usage: None,
                    finish_reason: None,
                }),
                None => Err(AgentError::Provider("model offline".into())),
            }
        }
    }

    fn drafter(reply: Option<&str>) -> PolicyDrafter {
        PolicyDrafter::new(
            Arc::new(FixedProvider {
                reply: reply.map(str::to_owned),
            }),
            GenerationOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_draft_without_prior_text_returns_markup() {
        let drafter = drafter(Some("```html\n<h1>Home Policy</h1><p>Terms.</p>\n```"));
        let result = drafter.draft("draft a home policy", None).await;
        assert_eq!(result, "<h1>Home Policy</h1><p>Terms.</p>");
    }

    #[tokio::test]
    async fn test_draft_with_prior_text_returns_diff() {
        let drafter = drafter(Some("<p>New terms.</p>"));
        let result = drafter
            .draft("rework the terms", Some("<p>Old terms.</p>"))
            .await;
        assert!(result.contains("<del>"));
        assert!(result.contains("<ins>"));
    }

    #[tokio::test]
    async fn test_draft_with_identical_prior_text_returns_raw() {
        let drafter = drafter(Some("<p>Same.</p>"));
        let result = drafter.draft("no-op", Some("<p>Same.</p>")).await;
        assert_eq!(result, "<p>Same.</p>");
    }

    #[tokio::test]
    async fn test_edit_always_returns_diff() {
        let drafter = drafter(Some("<p><strong>Old</strong></p>"));
        let result = drafter.edit("<p>Old</p>", "make it bold").await;
        // The revised markup only ever appears inside diff spans
        assert!(result.contains("<ins>"));
        assert!(result.contains("<strong>"));
        assert_ne!(result, "<p><strong>Old</strong></p>");
    }

    #[tokio::test]
    async fn test_draft_failure_degrades_to_placeholder() {
        let drafter = drafter(None);
        let result = drafter.draft("anything", None).await;
        assert_eq!(result, DRAFT_ERROR_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_edit_failure_degrades_to_placeholder() {
        let drafter = drafter(None);
        let result = drafter.edit("<p>Old</p>", "anything").await;
        assert_eq!(result, EDIT_ERROR_PLACEHOLDER);
    }
}
