//! Application State

use std::sync::Arc;

use agent_core::{AgentConfig, ChatProvider, MemorySessionStore, ToolRegistry};
use agent_identity::{IdentityClient, StorageClient};
use policy_advisor::{KnowledgeIndex, PolicyDrafter, S3Ingestor};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Chat model provider
    pub provider: Arc<dyn ChatProvider>,

    /// Tool set for turns without a document reference
    pub general_tools: Arc<ToolRegistry>,

    /// Tool set for turns carrying a document_url; deliberately has no
    /// internal knowledge search
    pub document_tools: Arc<ToolRegistry>,

    /// Per-thread conversation store
    pub sessions: Arc<MemorySessionStore>,

    /// Agent configuration applied to every query turn
    pub agent_config: AgentConfig,

    /// One-shot policy drafting/editing
    pub drafter: Arc<PolicyDrafter>,

    /// Knowledge index (for health reporting)
    pub index: Arc<dyn KnowledgeIndex>,

    /// Identity provider (None if not configured - auth endpoints answer 503)
    pub identity: Option<Arc<IdentityClient>>,

    /// Document storage (None if not configured - uploads answer 503)
    pub storage: Option<Arc<StorageClient>>,

    /// S3 ingestion pipeline (None if not configured)
    pub ingestor: Option<Arc<S3Ingestor>>,
}

impl AppState {
    /// Pick the tool registry for a turn. A turn with a document reference
    /// must answer from that document, never from the internal knowledge
    /// base.
    pub fn tools_for(&self, document_url: Option<&str>) -> Arc<ToolRegistry> {
        if document_url.is_some() {
            self.document_tools.clone()
        } else {
            self.general_tools.clone()
        }
    }
}
