//! Error Types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IdentityError>;

#[derive(Error, Debug)]
pub enum IdentityError {
    /// Provider rejected the credentials
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Provider rejected a registration
    #[error("Registration failed: {0}")]
    Registration(String),

    /// Token did not resolve to a user
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected provider response
    #[error("Provider error: {0}")]
    Provider(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IdentityError {
    /// Caller-safe message for the HTTP boundary
    pub fn user_message(&self) -> &'static str {
        match self {
            IdentityError::InvalidCredentials => "Email or password is incorrect.",
            IdentityError::Registration(_) => "Registration could not be completed.",
            IdentityError::InvalidToken => "The session is invalid or has expired.",
            IdentityError::Storage(_) => "The document could not be stored.",
            IdentityError::Config(_) => "The identity service is misconfigured.",
            _ => "The identity service is currently unavailable.",
        }
    }
}
