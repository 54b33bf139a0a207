//! # policy-advisor
//!
//! Insurance policy domain for the agent service: retrieval backends, the
//! agent's tool set, policy drafting/editing with visual diffing, and the
//! S3 bulk-ingestion pipeline.
//!
//! ## Capabilities
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        policy-advisor                        │
//! │  ┌─────────────────┐  ┌──────────────┐  ┌────────────────┐   │
//! │  │  KnowledgeIndex │  │  Toolkit     │  │  PolicyDrafter │   │
//! │  │  (Pinecone/mock)│──│  (3 tools)   │  │  (draft/edit)  │   │
//! │  └─────────────────┘  └──────────────┘  └────────────────┘   │
//! │  ┌─────────────────┐  ┌──────────────┐                       │
//! │  │ DocumentFetcher │  │  S3Ingestor  │                       │
//! │  └─────────────────┘  └──────────────┘                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod document;
pub mod drafting;
pub mod error;
pub mod ingest;
pub mod retrieval;
pub mod toolkit;

pub use document::{DocumentFetcher, DOCUMENT_CONTEXT_LIMIT};
pub use drafting::PolicyDrafter;
pub use error::{AdvisorError, Result};
pub use ingest::{ChunkingConfig, IngestReport, S3Ingestor};
pub use retrieval::{DocumentChunk, KnowledgeIndex, MockKnowledgeIndex, PineconeIndex, Snippet};
pub use toolkit::{build_registries, DocumentQaTool, KnowledgeSearchTool, WebSearchTool};

/// System prompt for the policy agent
pub const POLICY_AGENT_PROMPT: &str = r#"You are an insurance policy assistant for a policy management platform.

## Answering questions

1. For questions about coverage, deductibles, exclusions or terms of the
   company's policies, use `policy_knowledge_search` to retrieve context
   from the internal knowledge base before answering.
2. If a specific policy document URL appears in the conversation, you MUST
   answer from that document using `specific_document_qa` and you must NOT
   use `policy_knowledge_search` for that question.
3. For current regulations, market practice or general insurance knowledge
   not covered by internal documents, use `web_search`.

## Style

- Answer in the language of the user's question.
- Quote concrete figures (deductibles, limits, waiting periods) from the
  retrieved context; never invent them.
- If the retrieved context does not answer the question, say so and suggest
  what the user could provide.
"#;
