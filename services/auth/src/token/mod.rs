//! Access and refresh token issuance and verification.
//!
//! Verification is pure: it checks signature, expiry and token kind and never
//! consults the credential store.

mod claims;
mod service;

pub use claims::{AccessClaims, RefreshClaims, TokenKind};
pub use service::{IssuedRefreshToken, TokenPair, TokenService};

use thiserror::Error;

/// Token failures.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Malformed, tampered, or of the wrong kind
    #[error("Token signature invalid")]
    InvalidSignature,

    /// Past its `exp`
    #[error("Token expired")]
    Expired,

    /// Signing failed
    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::InvalidSignature,
        }
    }
}
