use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::{NewUser, User};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    username VARCHAR(100) UNIQUE NOT NULL,
    email VARCHAR(255) UNIQUE NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    role VARCHAR(50) NOT NULL DEFAULT 'user',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS refresh_tokens (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token VARCHAR(500) UNIQUE NOT NULL,
    expires_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
CREATE INDEX IF NOT EXISTS idx_refresh_tokens_expires_at ON refresh_tokens(expires_at);
";

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            role: row.role.parse().map_err(StoreError::Corrupt)?,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Where the credential database lives.
#[derive(Debug, Clone)]
pub enum DatabaseTarget {
    /// Full connection string, credentials included
    Url(SecretString),
    /// Discrete settings. Values are passed as-is, so credentials need no
    /// URL escaping.
    Parts {
        /// Server host
        host: String,
        /// Server port
        port: u16,
        /// Database name
        database: String,
        /// Login role
        username: String,
        /// Login password
        password: SecretString,
    },
}

impl DatabaseTarget {
    /// Connect options for this target.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error::Configuration`] for an unparsable URL.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match self {
            Self::Url(url) => PgConnectOptions::from_str(url.expose_secret()),
            Self::Parts {
                host,
                port,
                database,
                username,
                password,
            } => Ok(PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(username)
                .password(password.expose_secret())
                .database(database)),
        }
    }
}

/// Connection settings for [`PgCredentialStore`].
#[derive(Debug, Clone)]
pub struct PgStoreConfig {
    /// Database location and credentials
    pub target: DatabaseTarget,
    /// Pool size
    pub max_connections: u32,
    /// Wait bound for a pooled connection
    pub acquire_timeout: Duration,
    /// Bound on every store call
    pub call_timeout: Duration,
}

/// PostgreSQL-backed credential store.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
    call_timeout: Duration,
}

impl PgCredentialStore {
    /// Opens a bounded pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if no connection can be established.
    pub async fn connect(config: &PgStoreConfig) -> Result<Self, StoreError> {
        let options = config.target.connect_options()?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .test_before_acquire(true)
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool, config.call_timeout))
    }

    /// Wraps an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool, call_timeout: Duration) -> Self {
        Self { pool, call_timeout }
    }

    /// Creates tables and indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the DDL fails or times out.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        self.bounded(sqlx::raw_sql(SCHEMA).execute(&self.pool)).await?;
        info!("Credential store schema ready");
        Ok(())
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| StoreError::Timeout(self.call_timeout))?
            .map_err(classify)
    }
}

fn classify(err: sqlx::Error) -> StoreError {
    let unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());

    if unique {
        StoreError::Conflict
    } else {
        StoreError::Database(err)
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn identity_taken(&self, username: &str, email: &str) -> Result<bool, StoreError> {
        self.bounded(
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR username = $2)",
            )
            .bind(email)
            .bind(username)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4) \
             ON CONFLICT DO NOTHING RETURNING {USER_COLUMNS}"
        );
        let row = self
            .bounded(
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(Uuid::new_v4())
                    .bind(&user.username)
                    .bind(&user.email)
                    .bind(&user.password_hash)
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.ok_or(StoreError::Conflict)?.try_into()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        self.bounded(
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        self.bounded(
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn insert_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.bounded(
            sqlx::query(
                "INSERT INTO refresh_tokens (id, user_id, token, expires_at) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(token)
            .bind(expires_at)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn consume_refresh_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        // One statement: the row lock taken by DELETE makes a concurrent
        // consumer of the same token see zero rows.
        let sql = format!(
            "WITH consumed AS ( \
                 DELETE FROM refresh_tokens WHERE token = $1 AND expires_at > NOW() \
                 RETURNING user_id \
             ) \
             SELECT {cols} FROM users u JOIN consumed c ON c.user_id = u.id",
            cols = "u.id, u.username, u.email, u.password_hash, u.role, u.created_at, u.updated_at"
        );
        self.bounded(
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(token)
                .fetch_optional(&self.pool),
        )
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn delete_refresh_token(&self, token: &str) -> Result<(), StoreError> {
        self.bounded(
            sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
                .bind(token)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn purge_expired_refresh_tokens(&self) -> Result<u64, StoreError> {
        let result = self
            .bounded(
                sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= NOW()")
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected())
    }
}
