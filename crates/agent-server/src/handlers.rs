//! HTTP Handlers

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use agent_core::{Agent, AgentError, Message, SessionStore, ThreadId};
use policy_advisor::document::sniff_pdf;

use crate::state::AppState;

/// Upload size cap for policy PDFs
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider_connected: bool,
    pub index_connected: bool,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub document_url: Option<String>,
    #[serde(default)]
    pub current_policy_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub thread_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub prompt: String,
    #[serde(default)]
    pub current_policy_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub draft_text: String,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub current_policy_text: String,
    pub edit_instruction: String,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub edited_policy_text: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct IngestAccepted {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: code.into(),
        }),
    )
}

/// Map agent failures to caller-safe responses. Cycle-limit and
/// no-extractable-answer are distinct failure codes, never silent
/// truncations.
fn agent_error_response(e: &AgentError) -> ApiError {
    let code = match e {
        AgentError::CycleLimit(_) => "CYCLE_LIMIT_EXCEEDED",
        AgentError::NoFinalAnswer => "NO_FINAL_ANSWER",
        AgentError::Provider(_) | AgentError::ProviderUnavailable(_) => "PROVIDER_ERROR",
        _ => "AGENT_ERROR",
    };
    error_response(StatusCode::INTERNAL_SERVER_ERROR, code, e.user_message())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider.health_check().await.unwrap_or(false);
    let index_connected = state.index.health_check().await;

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider_connected,
        index_connected,
    })
}

/// Use the provided thread id, or mint a fresh one so unrelated anonymous
/// callers never share history
pub fn resolve_thread_id(explicit: Option<String>) -> ThreadId {
    match explicit {
        Some(id) if !id.trim().is_empty() => ThreadId::from_string(id),
        _ => ThreadId::generate(),
    }
}

/// Compose the turn's user message from the query and optional context
pub fn compose_query(payload: &QueryRequest) -> String {
    let mut query = payload.query.clone();

    if let Some(url) = payload.document_url.as_deref().filter(|u| !u.is_empty()) {
        query.push_str(&format!("\n\n[Policy document to consult: {url}]"));
    }
    if let Some(text) = payload
        .current_policy_text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
    {
        query.push_str(&format!("\n\nCurrent policy text:\n{text}"));
    }

    query
}

/// Conversational query endpoint
pub async fn answer_query(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if payload.query.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "EMPTY_QUERY",
            "Query must not be empty.",
        ));
    }

    let thread_id = resolve_thread_id(payload.thread_id.clone());
    let registry = state.tools_for(payload.document_url.as_deref());

    let agent = Agent::new(state.provider.clone(), registry, state.agent_config.clone());

    // The guard is held across the whole turn: one read-then-append per
    // thread at a time
    let mut thread = state.sessions.checkout(&thread_id).await;
    thread.conversation.push(Message::user(compose_query(&payload)));

    let outcome = agent.run(&mut thread.conversation).await;
    thread.touch();
    drop(thread);

    match outcome {
        Ok(answer) => Ok(Json(QueryResponse {
            answer,
            thread_id: thread_id.to_string(),
        })),
        Err(e) => {
            tracing::error!(thread = %thread_id, error = %e, "query turn failed");
            Err(agent_error_response(&e))
        }
    }
}

/// One-shot policy drafting
pub async fn generate_policy_draft(
    State(state): State<AppState>,
    Json(payload): Json<DraftRequest>,
) -> Result<Json<DraftResponse>, ApiError> {
    if payload.prompt.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "EMPTY_PROMPT",
            "Prompt must not be empty.",
        ));
    }

    let current = payload
        .current_policy_text
        .as_deref()
        .filter(|t| !t.trim().is_empty());

    let draft_text = state.drafter.draft(&payload.prompt, current).await;
    Ok(Json(DraftResponse { draft_text }))
}

/// One-shot policy editing; the response is always a diff against the
/// submitted text
pub async fn edit_policy(
    State(state): State<AppState>,
    Json(payload): Json<EditRequest>,
) -> Result<Json<EditResponse>, ApiError> {
    if payload.current_policy_text.trim().is_empty() || payload.edit_instruction.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "MISSING_FIELDS",
            "Current policy text and edit instruction are required.",
        ));
    }

    let edited_policy_text = state
        .drafter
        .edit(&payload.current_policy_text, &payload.edit_instruction)
        .await;
    Ok(Json(EditResponse { edited_policy_text }))
}

/// Strip any path components and unsafe characters from a client filename
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or(raw)
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches(&['.', '_'][..]).is_empty() {
        "document.pdf".into()
    } else {
        cleaned
    }
}

/// PDF upload endpoint (multipart: `file` + `document_type`)
pub async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let Some(storage) = state.storage.clone() else {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "STORAGE_DISABLED",
            "Document storage is not configured.",
        ));
    };

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut document_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_MULTIPART",
            format!("Malformed multipart body: {e}"),
        )
    })? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("document.pdf").to_owned();
                let data = field.bytes().await.map_err(|e| {
                    error_response(
                        StatusCode::BAD_REQUEST,
                        "INVALID_MULTIPART",
                        format!("Could not read file field: {e}"),
                    )
                })?;
                file = Some((filename, data.to_vec()));
            }
            Some("document_type") => {
                document_type = field.text().await.ok();
            }
            _ => {}
        }
    }

    let (filename, data) = file.ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            "MISSING_FILE",
            "A 'file' field is required.",
        )
    })?;

    if data.len() > MAX_UPLOAD_BYTES {
        return Err(error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "FILE_TOO_LARGE",
            "The document exceeds the 10 MB upload limit.",
        ));
    }
    if !sniff_pdf(&data) {
        return Err(error_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "NOT_A_PDF",
            "The uploaded file is not a PDF document.",
        ));
    }

    let subpath = sanitize_filename(document_type.as_deref().unwrap_or("general"));
    let filename = sanitize_filename(&filename);

    let url = storage
        .upload_pdf(data, &filename, &subpath)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "upload failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                e.user_message(),
            )
        })?;

    Ok(Json(UploadResponse { url }))
}

/// Kick off the S3 ingestion sweep in the background
pub async fn load_documents_from_s3(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<IngestAccepted>), ApiError> {
    let Some(ingestor) = state.ingestor.clone() else {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "INGESTION_DISABLED",
            "S3 ingestion is not configured.",
        ));
    };

    tokio::spawn(async move {
        match ingestor.run().await {
            Ok(report) => tracing::info!(
                processed = report.files_processed,
                skipped = report.files_skipped,
                chunks = report.chunks_indexed,
                "background ingestion finished"
            ),
            Err(e) => tracing::error!(error = %e, "background ingestion failed"),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestAccepted {
            message: "Document processing from S3 started in the background.",
        }),
    ))
}
