//! Account records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer
    #[default]
    User,
    /// Back-office operator
    Admin,
}

impl Role {
    /// Column representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Stored user account.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    /// Account ID
    pub id: Uuid,
    /// Unique handle
    pub username: String,
    /// Unique login email
    pub email: String,
    /// bcrypt hash; never leaves the service
    pub password_hash: String,
    /// Role
    pub role: Role,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last role change
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Projection safe to return to clients.
    #[must_use]
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Client-facing view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    /// Account ID
    pub id: Uuid,
    /// Handle
    pub username: String,
    /// Email
    pub email: String,
    /// Role
    pub role: Role,
}

/// Input for account creation. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Handle
    pub username: String,
    /// Email
    pub email: String,
    /// bcrypt hash
    pub password_hash: String,
}
