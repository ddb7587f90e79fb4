//! Credential persistence: users and live refresh tokens.
//!
//! The store owns the uniqueness invariants (username, email, token value) and
//! the single-use guarantee of [`CredentialStore::consume_refresh_token`].

mod memory;
mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::{DatabaseTarget, PgCredentialStore, PgStoreConfig};

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewUser, User};

/// Store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Username or email already registered
    #[error("Username or email already exists")]
    Conflict,

    /// Call exceeded the configured store timeout
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    /// A row could not be mapped back into a record
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// Driver or connection failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for accounts and refresh tokens.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Whether `username` or `email` is already taken, in one lookup.
    async fn identity_taken(&self, username: &str, email: &str) -> Result<bool, StoreError>;

    /// Inserts a user if neither identity is taken.
    ///
    /// Returns [`StoreError::Conflict`] on a duplicate, including one that
    /// raced past [`Self::identity_taken`].
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Looks a user up by email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Looks a user up by ID.
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Persists an issued refresh token.
    async fn insert_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Atomically deletes a live token and returns its owner.
    ///
    /// Of any number of concurrent calls with the same value at most one
    /// returns `Some`.
    async fn consume_refresh_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    /// Deletes a token. Absent tokens are not an error.
    async fn delete_refresh_token(&self, token: &str) -> Result<(), StoreError>;

    /// Deletes every token with `expires_at <= now`, returning the count.
    async fn purge_expired_refresh_tokens(&self) -> Result<u64, StoreError>;
}
