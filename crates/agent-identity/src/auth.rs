//! GoTrue Identity Client
//!
//! REST wrapper over the provider's signup, password-grant and user
//! endpoints. The service key is used for administrative calls, the anon
//! key for user-scoped ones.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, Result};

/// Identity provider configuration
#[derive(Clone, Debug)]
pub struct IdentityConfig {
    /// Project base URL (e.g. `https://xyz.supabase.co`)
    pub base_url: String,

    /// Public anon key
    pub anon_key: String,

    /// Service-role key for administrative calls
    pub service_key: String,
}

impl IdentityConfig {
    /// Read from `SUPABASE_URL`, `SUPABASE_ANON_KEY` and
    /// `SUPABASE_SERVICE_ROLE_KEY`
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("SUPABASE_URL")
            .map_err(|_| IdentityError::Config("SUPABASE_URL not set".into()))?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| IdentityError::Config("SUPABASE_ANON_KEY not set".into()))?;
        let service_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| IdentityError::Config("SUPABASE_SERVICE_ROLE_KEY not set".into()))?;

        Ok(Self {
            base_url,
            anon_key,
            service_key,
        })
    }
}

/// A registered user as reported by the provider
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub user_id: String,
    pub email: String,
}

/// An authenticated user resolved from a token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// Token pair returned on login
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a HashMap<String, serde_json::Value>>,
}

#[derive(Serialize)]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: WireUser,
}

/// Client for the GoTrue identity provider
pub struct IdentityClient {
    http: reqwest::Client,
    config: IdentityConfig,
}

impl IdentityClient {
    pub fn from_config(config: IdentityConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(IdentityConfig::from_env()?))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Register a new user, optionally attaching profile metadata
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        profile: Option<&HashMap<String, serde_json::Value>>,
    ) -> Result<RegisteredUser> {
        let response = self
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
            .json(&SignupRequest {
                email,
                password,
                data: profile,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "signup rejected by identity provider");
            return Err(IdentityError::Registration(format!("HTTP {status}: {body}")));
        }

        // Depending on confirmation settings the provider answers with the
        // user object at the top level or nested under "user"
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;
        let user = match body.get("user") {
            Some(nested) if !nested.is_null() => nested,
            _ => &body,
        };

        let user_id = user
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| IdentityError::Registration("provider returned no user id".into()))?
            .to_owned();

        tracing::info!(%user_id, "registered user");
        Ok(RegisteredUser {
            user_id,
            email: user
                .get("email")
                .and_then(|v| v.as_str())
                .unwrap_or(email)
                .to_owned(),
        })
    }

    /// Log a user in with the password grant
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionTokens> {
        let response = self
            .http
            .post(format!("{}?grant_type=password", self.endpoint("token")))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .json(&PasswordGrantRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(IdentityError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(IdentityError::Provider(format!("HTTP {status}")));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        Ok(SessionTokens {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token,
            user: AuthUser {
                id: parsed.user.id,
                email: parsed.user.email.unwrap_or_else(|| email.to_owned()),
            },
        })
    }

    /// Resolve the user behind an access token
    pub async fn user_from_token(&self, access_token: &str) -> Result<AuthUser> {
        let response = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IdentityError::InvalidToken);
        }

        let user: WireUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        Ok(AuthUser {
            id: user.id,
            email: user.email.unwrap_or_default(),
        })
    }
}
