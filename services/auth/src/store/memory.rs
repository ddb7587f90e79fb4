use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::{NewUser, Role, User};

#[derive(Debug)]
struct TokenRow {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<String, TokenRow>,
}

/// Process-local store for tests and single-node development.
///
/// A single mutex guards both tables, so every operation is atomic.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tables: Mutex<Tables>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored refresh tokens, live or not.
    #[must_use]
    pub fn refresh_token_count(&self) -> usize {
        self.tables.lock().refresh_tokens.len()
    }

    /// Whether `token` is currently stored.
    #[must_use]
    pub fn contains_refresh_token(&self, token: &str) -> bool {
        self.tables.lock().refresh_tokens.contains_key(token)
    }
}

impl Tables {
    fn identity_taken(&self, username: &str, email: &str) -> bool {
        self.users
            .values()
            .any(|u| u.username == username || u.email == email)
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn identity_taken(&self, username: &str, email: &str) -> Result<bool, StoreError> {
        Ok(self.tables.lock().identity_taken(username, email))
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.lock();
        if tables.identity_taken(&user.username, &user.email) {
            return Err(StoreError::Conflict);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: Role::User,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.lock().users.get(&id).cloned())
    }

    async fn insert_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::Corrupt(format!("unknown user {user_id}")));
        }
        if tables.refresh_tokens.contains_key(token) {
            return Err(StoreError::Conflict);
        }
        tables
            .refresh_tokens
            .insert(token.to_owned(), TokenRow { user_id, expires_at });
        Ok(())
    }

    async fn consume_refresh_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.lock();
        let now = Utc::now();

        let live = tables
            .refresh_tokens
            .get(token)
            .is_some_and(|row| row.expires_at > now);
        if !live {
            return Ok(None);
        }

        let Some(row) = tables.refresh_tokens.remove(token) else {
            return Ok(None);
        };
        Ok(tables.users.get(&row.user_id).cloned())
    }

    async fn delete_refresh_token(&self, token: &str) -> Result<(), StoreError> {
        self.tables.lock().refresh_tokens.remove(token);
        Ok(())
    }

    async fn purge_expired_refresh_tokens(&self) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock();
        let now = Utc::now();
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|_, row| row.expires_at > now);
        Ok((before - tables.refresh_tokens.len()) as u64)
    }
}
