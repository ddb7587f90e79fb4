//! Request and response bodies.
//!
//! Request fields are optional so that a missing field reaches the handler
//! and is reported with the endpoint's own message instead of a generic
//! deserialization rejection.

use serde::{Deserialize, Serialize};

use crate::models::PublicUser;

/// `POST /auth/register`
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    /// Desired handle
    pub username: Option<String>,
    /// Login email
    pub email: Option<String>,
    /// Plaintext password
    pub password: Option<String>,
}

/// `POST /auth/login`
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    /// Login email
    pub email: Option<String>,
    /// Plaintext password
    pub password: Option<String>,
}

/// `POST /auth/refresh` and `POST /auth/logout`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Refresh token to rotate or revoke
    pub refresh_token: Option<String>,
}

/// Successful register or login.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Human-readable outcome
    pub message: String,
    /// The authenticated account
    pub user: PublicUser,
    /// Bearer token
    pub access_token: String,
    /// Rotation token
    pub refresh_token: String,
}

/// Successful refresh.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    /// Bearer token
    pub access_token: String,
    /// Replacement rotation token
    pub refresh_token: String,
}

/// Successful verify.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Always true on success
    pub valid: bool,
    /// Identity embedded in the token
    pub user: PublicUser,
}

/// Bodies that only carry a message.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

/// Treats empty strings like absent fields.
pub(crate) fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}
