//! Database request/response models for login credentials.
//!
//! A credential is a `(provider, provider_user_id)` identity mapped to a user
//! and an optional secret hash. Email/password sign-in uses the provider
//! `"email"` with the address as the provider user id.

use crate::types::UserId;
use sqlx::FromRow;

/// Provider name for email/password credentials.
pub const EMAIL_PROVIDER: &str = "email";

#[derive(Debug, Clone)]
pub struct CredentialCreateDBRequest {
    pub provider: String,
    pub provider_user_id: String,
    pub user_id: UserId,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CredentialDBResponse {
    pub provider: String,
    pub provider_user_id: String,
    pub user_id: UserId,
    pub password_hash: Option<String>,
}
