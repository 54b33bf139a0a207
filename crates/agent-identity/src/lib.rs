//! # agent-identity
//!
//! Thin integration with a Supabase-style backend: the GoTrue identity
//! provider (register / login / token introspection) and the storage API
//! (PDF upload with public URLs).
//!
//! Sessions, password handling and token issuance all live in the external
//! provider; this crate only shapes requests and responses. Nothing here is
//! consulted by the agent's reasoning cycle.

pub mod auth;
pub mod error;
pub mod storage;

pub use auth::{AuthUser, IdentityClient, IdentityConfig, RegisteredUser, SessionTokens};
pub use error::{IdentityError, Result};
pub use storage::{StorageClient, StorageConfig};
