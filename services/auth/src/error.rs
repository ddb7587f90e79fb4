//! Auth service error taxonomy and its HTTP mapping.
//!
//! Messages carried by variants are client-safe by construction. Anything
//! unanticipated travels as [`AuthError::Internal`], is logged here, and
//! reaches the client only as `Internal server error`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Client-facing failures.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing or malformed input
    #[error("{0}")]
    BadRequest(&'static str),

    /// Missing, invalid or expired credentials
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Bearer token rejected by `verify`; body carries `valid: false`
    #[error("{0}")]
    TokenRejected(&'static str),

    /// Duplicate registration
    #[error("{0}")]
    Conflict(&'static str),

    /// Unknown route
    #[error("Not found")]
    NotFound,

    /// Details stay in the log
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) | Self::TokenRejected(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::TokenRejected(message) => json!({ "valid": false, "error": message }),
            Self::Internal(err) => {
                tracing::error!(error = ?err, "Request failed");
                json!({ "error": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: AuthError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_leaked() {
        let (status, body) =
            body_of(AuthError::Internal(anyhow::anyhow!("connection to 10.0.0.5 refused"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_token_rejected_shape() {
        let (status, body) = body_of(AuthError::TokenRejected("Invalid token")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "valid": false, "error": "Invalid token" }));
    }

    #[tokio::test]
    async fn test_store_error_becomes_internal() {
        let err: AuthError = StoreError::Timeout(std::time::Duration::from_secs(5)).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
