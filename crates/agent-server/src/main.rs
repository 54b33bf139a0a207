//! Policy Agent HTTP Server
//!
//! Axum-based service exposing the conversational policy agent, policy
//! drafting/editing, document upload and S3 bulk ingestion.

mod auth;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentConfig, ChatProvider, GenerationOptions, MemorySessionStore};
use agent_identity::{IdentityClient, StorageClient};
use agent_runtime::OpenAiProvider;
use policy_advisor::{
    build_registries,
    document::DocumentFetcher,
    retrieval::{EmbeddingClient, MockKnowledgeIndex, PineconeConfig, PineconeIndex},
    KnowledgeIndex, PolicyDrafter, S3Ingestor, WebSearchTool, POLICY_AGENT_PROMPT,
};

use crate::handlers::{
    answer_query, edit_policy, generate_policy_draft, health_check, load_documents_from_s3,
    upload_pdf, MAX_UPLOAD_BYTES,
};
use crate::state::AppState;

fn generation_from_env() -> GenerationOptions {
    let mut generation = GenerationOptions::default();
    if let Ok(model) = std::env::var("OPENAI_MODEL") {
        generation.model = model;
    }
    generation
}

fn agent_config_from_env() -> AgentConfig {
    let max_cycles = std::env::var("AGENT_MAX_CYCLES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(15);

    AgentConfig {
        system_prompt: POLICY_AGENT_PROMPT.into(),
        max_cycles,
        generation: generation_from_env(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Initialize the model provider
    let provider = Arc::new(OpenAiProvider::from_env());
    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to the model provider"),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Model provider not reachable - agent turns will fail");
            tracing::warn!("  Check OPENAI_API_KEY / OPENAI_BASE_URL");
        }
    }

    // Knowledge index: Pinecone when configured, otherwise an in-memory
    // index with sample policies so the service stays usable in dev
    let index: Arc<dyn KnowledgeIndex> = match PineconeConfig::from_env() {
        Ok(config) => {
            let embedder = Arc::new(EmbeddingClient::from_env());
            Arc::new(PineconeIndex::new(config, embedder))
        }
        Err(e) => {
            tracing::warn!("⚠ Knowledge index not configured ({e}); using in-memory samples");
            Arc::new(MockKnowledgeIndex::with_sample_policies())
        }
    };
    if index.health_check().await {
        tracing::info!("✓ Knowledge index '{}' reachable", index.name());
    } else {
        tracing::warn!("⚠ Knowledge index '{}' not reachable", index.name());
    }

    // Tool registries: the document-turn registry must not contain the
    // internal knowledge search
    let fetcher = Arc::new(DocumentFetcher::new());
    let web_search = WebSearchTool::from_env();
    let (general_tools, document_tools) = build_registries(index.clone(), fetcher, web_search);

    tracing::info!("Registered {} general tools:", general_tools.len());
    for name in general_tools.names() {
        tracing::info!("  • {name}");
    }
    tracing::info!("Registered {} document-turn tools:", document_tools.len());
    for name in document_tools.names() {
        tracing::info!("  • {name}");
    }

    // One-shot drafting shares the provider with the agent
    let drafter = Arc::new(PolicyDrafter::new(provider.clone(), generation_from_env()));

    // Identity & storage are optional: without them auth/upload answer 503
    let identity = match IdentityClient::from_env() {
        Ok(client) => {
            tracing::info!("✓ Identity provider configured");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!("⚠ Identity provider not configured ({e}); auth endpoints disabled");
            None
        }
    };
    let storage = match StorageClient::from_env() {
        Ok(client) => {
            tracing::info!("✓ Document storage configured");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!("⚠ Document storage not configured ({e}); uploads disabled");
            None
        }
    };

    // S3 ingestion is optional as well
    let ingestor = match S3Ingestor::from_env(index.clone()).await {
        Ok(ingestor) => {
            tracing::info!("✓ S3 ingestion configured");
            Some(Arc::new(ingestor))
        }
        Err(e) => {
            tracing::warn!("⚠ S3 ingestion not configured ({e})");
            None
        }
    };

    // Build application state
    let state = AppState {
        provider,
        general_tools: Arc::new(general_tools),
        document_tools: Arc::new(document_tools),
        sessions: Arc::new(MemorySessionStore::new()),
        agent_config: agent_config_from_env(),
        drafter,
        index,
        identity,
        storage,
        ingestor,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health
        .route("/health", get(health_check))
        // Agent API
        .route("/api/internal/v1/answer_query", post(answer_query))
        .route(
            "/api/internal/v1/load-documents-from-s3",
            post(load_documents_from_s3),
        )
        .route("/api/internal/v1/upload_pdf", post(upload_pdf))
        // Policy drafting/editing
        .route(
            "/api/internal/v1/generate-policy-draft",
            post(generate_policy_draft),
        )
        .route("/api/internal/v1/edit-policy", post(edit_policy))
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/token", post(auth::token))
        .route("/api/auth/me", get(auth::me))
        // Allow the 10 MB document plus multipart overhead
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Policy agent server running on http://{addr}");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                                  - Health check");
    tracing::info!("  POST /api/internal/v1/answer_query            - Conversational query");
    tracing::info!("  POST /api/internal/v1/generate-policy-draft   - Draft policy markup");
    tracing::info!("  POST /api/internal/v1/edit-policy             - Edit policy markup (diffed)");
    tracing::info!("  POST /api/internal/v1/upload_pdf              - Upload a policy PDF");
    tracing::info!("  POST /api/internal/v1/load-documents-from-s3  - Bulk-ingest from S3");
    tracing::info!("  POST /api/auth/register|login|token, GET /api/auth/me");

    axum::serve(listener, app).await?;

    Ok(())
}
