//! Authentication Handlers
//!
//! Thin wrapping over the external identity provider; no session state is
//! kept in this service.

use std::collections::HashMap;

use axum::{
    extract::{Form, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use agent_identity::{AuthUser, IdentityClient, IdentityError};

use crate::handlers::{error_response, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// OAuth2 password form (`/token`)
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub user: UserResponse,
}

fn identity_error_response(e: &IdentityError) -> ApiError {
    let (status, code) = match e {
        IdentityError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
        IdentityError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
        IdentityError::Registration(_) => (StatusCode::BAD_REQUEST, "REGISTRATION_FAILED"),
        IdentityError::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, "IDENTITY_DISABLED"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "IDENTITY_ERROR"),
    };
    error_response(status, code, e.user_message())
}

fn require_identity(state: &AppState) -> Result<std::sync::Arc<IdentityClient>, ApiError> {
    state.identity.clone().ok_or_else(|| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "IDENTITY_DISABLED",
            "Authentication is not configured.",
        )
    })
}

fn profile_fields(payload: &RegisterRequest) -> Option<HashMap<String, serde_json::Value>> {
    let mut profile = HashMap::new();
    if let Some(first_name) = &payload.first_name {
        profile.insert("first_name".to_owned(), first_name.clone().into());
    }
    if let Some(last_name) = &payload.last_name {
        profile.insert("last_name".to_owned(), last_name.clone().into());
    }
    if let Some(phone) = &payload.phone {
        profile.insert("phone".to_owned(), phone.clone().into());
    }
    (!profile.is_empty()).then_some(profile)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn user_response(user: AuthUser) -> UserResponse {
    UserResponse {
        user_id: user.id,
        email: user.email,
    }
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let identity = require_identity(&state)?;
    let profile = profile_fields(&payload);

    let registered = identity
        .register(&payload.email, &payload.password, profile.as_ref())
        .await
        .map_err(|e| identity_error_response(&e))?;

    Ok(Json(UserResponse {
        user_id: registered.user_id,
        email: registered.email,
    }))
}

async fn password_login(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<Json<TokenResponse>, ApiError> {
    let identity = require_identity(state)?;

    let tokens = identity
        .login(email, password)
        .await
        .map_err(|e| identity_error_response(&e))?;

    Ok(Json(TokenResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: "bearer",
        user: user_response(tokens.user),
    }))
}

/// JSON login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    password_login(&state, &payload.email, &payload.password).await
}

/// OAuth2 password-form login
pub async fn token(
    State(state): State<AppState>,
    Form(payload): Form<TokenForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    password_login(&state, &payload.username, &payload.password).await
}

/// Resolve the authenticated user from the bearer token
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, ApiError> {
    let identity = require_identity(&state)?;

    let token = bearer_token(&headers).ok_or_else(|| {
        error_response(
            StatusCode::UNAUTHORIZED,
            "MISSING_TOKEN",
            "A bearer token is required.",
        )
    })?;

    let user = identity
        .user_from_token(token)
        .await
        .map_err(|e| identity_error_response(&e))?;

    Ok(Json(user_response(user)))
}
