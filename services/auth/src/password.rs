//! Password hashing.

use async_trait::async_trait;

/// Hashes and checks passwords. Implementations must not block the caller's
/// executor thread.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Hashes `password`.
    async fn hash(&self, password: &str) -> anyhow::Result<String>;

    /// Checks `password` against `hash`. A malformed hash is a mismatch.
    async fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool>;
}

/// bcrypt on the blocking thread pool.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Cost used outside tests.
    pub const DEFAULT_COST: u32 = 12;

    /// Creates a hasher with the given work factor.
    #[must_use]
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COST)
    }
}

#[async_trait]
impl PasswordHasher for BcryptHasher {
    async fn hash(&self, password: &str) -> anyhow::Result<String> {
        let password = password.to_owned();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hashed)
    }

    async fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let matched = tokio::task::spawn_blocking(move || {
            bcrypt::verify(password, &hash).unwrap_or(false)
        })
        .await?;
        Ok(matched)
    }
}
