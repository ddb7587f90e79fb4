use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{PublicUser, Role};

/// Discriminates access tokens from refresh tokens signed with the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived bearer credential
    Access,
    /// Single-use rotation credential
    Refresh,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject user ID
    #[serde(rename = "id")]
    pub user_id: Uuid,
    /// Email at issue time
    pub email: String,
    /// Username at issue time
    pub username: String,
    /// Role at issue time
    pub role: Role,
    /// Always [`TokenKind::Access`]
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

impl AccessClaims {
    pub(crate) fn new(user: &PublicUser, issued_at: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            role: user.role,
            kind: TokenKind::Access,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }

    /// The identity embedded in the token.
    #[must_use]
    pub fn user(&self) -> PublicUser {
        PublicUser {
            id: self.user_id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Owning user ID
    #[serde(rename = "id")]
    pub user_id: Uuid,
    /// Always [`TokenKind::Refresh`]
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Unique per token so same-second issues never collide
    pub jti: Uuid,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

impl RefreshClaims {
    pub(crate) fn new(user_id: Uuid, issued_at: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            user_id,
            kind: TokenKind::Refresh,
            jti: Uuid::new_v4(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}
