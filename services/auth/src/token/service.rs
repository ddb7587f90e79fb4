use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::{AccessClaims, RefreshClaims, TokenError, TokenKind};
use crate::models::PublicUser;

/// Freshly minted refresh token with its persistence deadline.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    /// Signed token
    pub token: String,
    /// Matches the token's `exp`
    pub expires_at: DateTime<Utc>,
}

/// Access and refresh token issued together.
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Signed access token
    pub access_token: String,
    /// Refresh token and its deadline
    pub refresh: IssuedRefreshToken,
}

/// HS256 signer and verifier over a process secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a service signing with `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if a TTL does not fit a timestamp.
    pub fn new(
        secret: &SecretString,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, TokenError> {
        let to_chrono = |ttl: Duration| {
            chrono::Duration::from_std(ttl).map_err(|e| TokenError::Encoding(e.to_string()))
        };
        let bytes = secret.expose_secret().as_bytes();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            access_ttl: to_chrono(access_ttl)?,
            refresh_ttl: to_chrono(refresh_ttl)?,
        })
    }

    /// Signs an access token for `user` issued now.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if signing fails.
    pub fn issue_access_token(&self, user: &PublicUser) -> Result<String, TokenError> {
        self.issue_access_token_at(user, Utc::now())
    }

    /// Signs an access token with an explicit issue time. Identical inputs
    /// produce identical tokens.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if signing fails.
    pub fn issue_access_token_at(
        &self,
        user: &PublicUser,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        self.sign(&AccessClaims::new(user, issued_at, self.access_ttl))
    }

    /// Signs a refresh token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if signing fails.
    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<IssuedRefreshToken, TokenError> {
        let issued_at = Utc::now();
        let token = self.sign(&RefreshClaims::new(user_id, issued_at, self.refresh_ttl))?;

        Ok(IssuedRefreshToken {
            token,
            expires_at: issued_at + self.refresh_ttl,
        })
    }

    /// Signs an access and a refresh token for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if signing fails.
    pub fn issue_pair(&self, user: &PublicUser) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user)?,
            refresh: self.issue_refresh_token(user.id)?,
        })
    }

    /// Verifies an access token.
    ///
    /// # Errors
    ///
    /// [`TokenError::Expired`] past expiry, [`TokenError::InvalidSignature`]
    /// for anything malformed, tampered, or a refresh token.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = self.decode(token)?;
        if claims.kind != TokenKind::Access {
            return Err(TokenError::InvalidSignature);
        }
        Ok(claims)
    }

    /// Verifies a refresh token's signature and expiry. Liveness is the
    /// store's concern.
    ///
    /// # Errors
    ///
    /// Same as [`Self::verify_access`], rejecting access tokens instead.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims: RefreshClaims = self.decode(token)?;
        if claims.kind != TokenKind::Refresh {
            return Err(TokenError::InvalidSignature);
        }
        Ok(claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(decode::<T>(token, &self.decoding_key, &validation)?.claims)
    }
}
