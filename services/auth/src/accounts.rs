//! Account lifecycle: register, login, refresh rotation, verify, logout.
//!
//! Refresh tokens move `issued -> consumed | revoked | expired -> absent` and
//! are never updated in place. Rotation consumes the presented token in one
//! atomic store call before the replacement is minted.

use std::sync::Arc;

use tracing::{info, warn};

use crate::dto::{present, LoginRequest, RefreshRequest, RegisterRequest};
use crate::error::AuthError;
use crate::models::{NewUser, PublicUser};
use crate::password::PasswordHasher;
use crate::store::{CredentialStore, StoreError};
use crate::token::{TokenPair, TokenService};

const MISSING_REGISTER_FIELDS: &str = "Username, email, and password are required";
const DUPLICATE_IDENTITY: &str = "User with this email or username already exists";
const MISSING_LOGIN_FIELDS: &str = "Email and password are required";
const INVALID_CREDENTIALS: &str = "Invalid credentials";
const MISSING_REFRESH_TOKEN: &str = "Refresh token is required";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";
const NO_TOKEN: &str = "No token provided";
const INVALID_TOKEN: &str = "Invalid token";

/// Tokens handed out by register and login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// The authenticated account
    pub user: PublicUser,
    /// Freshly issued tokens; the refresh token is already persisted
    pub tokens: TokenPair,
}

/// Orchestrates the token service, credential store and password hasher.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn CredentialStore>,
    tokens: TokenService,
    hasher: Arc<dyn PasswordHasher>,
}

impl AccountService {
    /// Wires the collaborators together.
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: TokenService,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            store,
            tokens,
            hasher,
        }
    }

    /// Creates an account and signs it in.
    ///
    /// # Errors
    ///
    /// `BadRequest` on a missing field, `Conflict` if the username or email
    /// is taken.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, AuthError> {
        let (Some(username), Some(email), Some(password)) = (
            present(request.username),
            present(request.email),
            present(request.password),
        ) else {
            return Err(AuthError::BadRequest(MISSING_REGISTER_FIELDS));
        };

        if self.store.identity_taken(&username, &email).await? {
            return Err(AuthError::Conflict(DUPLICATE_IDENTITY));
        }

        let password_hash = self.hasher.hash(&password).await?;
        let user = match self
            .store
            .create_user(NewUser {
                username,
                email,
                password_hash,
            })
            .await
        {
            Ok(user) => user,
            Err(StoreError::Conflict) => return Err(AuthError::Conflict(DUPLICATE_IDENTITY)),
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, "User registered");
        self.start_session(user.to_public()).await
    }

    /// Signs an existing account in.
    ///
    /// # Errors
    ///
    /// `BadRequest` on a missing field; `Unauthorized` for an unknown email
    /// and for a wrong password alike.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, AuthError> {
        let (Some(email), Some(password)) = (present(request.email), present(request.password))
        else {
            return Err(AuthError::BadRequest(MISSING_LOGIN_FIELDS));
        };

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            warn!("Login failed: unknown email");
            return Err(AuthError::Unauthorized(INVALID_CREDENTIALS));
        };

        if !self.hasher.verify(&password, &user.password_hash).await? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::Unauthorized(INVALID_CREDENTIALS));
        }

        info!(user_id = %user.id, "User logged in");
        self.start_session(user.to_public()).await
    }

    /// Rotates a refresh token: the presented one is consumed, a new pair is
    /// issued for its owner.
    ///
    /// # Errors
    ///
    /// `BadRequest` if no token is given. `Unauthorized` for a bad signature,
    /// an expired token, and a token already used or revoked, all reported
    /// identically.
    pub async fn refresh(&self, request: RefreshRequest) -> Result<TokenPair, AuthError> {
        let Some(presented) = present(request.refresh_token) else {
            return Err(AuthError::BadRequest(MISSING_REFRESH_TOKEN));
        };

        let claims = self.tokens.verify_refresh(&presented).map_err(|e| {
            warn!(reason = %e, "Refresh rejected");
            AuthError::Unauthorized(INVALID_REFRESH_TOKEN)
        })?;

        let Some(owner) = self.store.consume_refresh_token(&presented).await? else {
            warn!(user_id = %claims.user_id, "Refresh rejected: token reused, revoked or expired");
            return Err(AuthError::Unauthorized(INVALID_REFRESH_TOKEN));
        };

        if owner.id != claims.user_id {
            warn!(
                user_id = %claims.user_id,
                owner_id = %owner.id,
                "Refresh rejected: token owner mismatch"
            );
            return Err(AuthError::Unauthorized(INVALID_REFRESH_TOKEN));
        }

        let pair = self.issue_and_persist(&owner.to_public()).await?;
        info!(user_id = %owner.id, "Refresh token rotated");
        Ok(pair)
    }

    /// Checks an `Authorization` header value and returns the embedded user.
    ///
    /// # Errors
    ///
    /// `TokenRejected` when the header is absent, not `Bearer`, or the token
    /// fails verification.
    pub fn verify(&self, authorization: Option<&str>) -> Result<PublicUser, AuthError> {
        let Some(token) = authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|rest| rest.split(' ').next().unwrap_or_default())
        else {
            return Err(AuthError::TokenRejected(NO_TOKEN));
        };

        self.tokens
            .verify_access(token)
            .map(|claims| claims.user())
            .map_err(|_| AuthError::TokenRejected(INVALID_TOKEN))
    }

    /// Revokes the given refresh token, if any. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Only store failures.
    pub async fn logout(&self, request: RefreshRequest) -> Result<(), AuthError> {
        if let Some(token) = present(request.refresh_token) {
            self.store.delete_refresh_token(&token).await?;
        }
        Ok(())
    }

    /// Deletes refresh tokens past their expiry.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn sweep_expired_tokens(&self) -> Result<u64, StoreError> {
        let purged = self.store.purge_expired_refresh_tokens().await?;
        if purged > 0 {
            info!(purged, "Expired refresh tokens removed");
        }
        Ok(purged)
    }

    async fn start_session(&self, user: PublicUser) -> Result<AuthSession, AuthError> {
        let tokens = self.issue_and_persist(&user).await?;
        Ok(AuthSession { user, tokens })
    }

    async fn issue_and_persist(&self, user: &PublicUser) -> Result<TokenPair, AuthError> {
        let pair = self
            .tokens
            .issue_pair(user)
            .map_err(|e| AuthError::Internal(e.into()))?;

        self.store
            .insert_refresh_token(user.id, &pair.refresh.token, pair.refresh.expires_at)
            .await?;

        Ok(pair)
    }
}
