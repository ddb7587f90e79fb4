//! Gateway error taxonomy and its HTTP mapping.
//!
//! Every failure leaves the gateway as `{"error": "..."}`. Transport errors
//! from upstreams and anything unanticipated are logged with detail and
//! replaced by a fixed message.

use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Gateway failures.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Auth gate rejected the request
    #[error("{0}")]
    Unauthorized(&'static str),

    /// No route binding matched
    #[error("Not found")]
    NotFound,

    /// Client exceeded a limiter
    #[error("{message}")]
    RateLimited {
        /// Limiter-specific message
        message: &'static str,
        /// Until the window resets
        retry_after: Duration,
    },

    /// Upstream unreachable or timed out
    #[error("{service} service unavailable")]
    ServiceUnavailable {
        /// Display name, e.g. `Products`
        service: String,
    },

    /// Details stay in the log
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GatewayError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(err) => {
                tracing::error!(error = ?err, "Gateway error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();

        if let Self::RateLimited { retry_after, .. } = &self {
            let secs = retry_after.as_secs().max(1);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_service_unavailable_message() {
        let response = GatewayError::ServiceUnavailable {
            service: "Products".into(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_of(response).await,
            json!({ "error": "Products service unavailable" })
        );
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = GatewayError::RateLimited {
            message: "slow down",
            retry_after: Duration::from_secs(42),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[tokio::test]
    async fn test_internal_is_sanitized() {
        let response = GatewayError::Internal(anyhow::anyhow!("pool exhausted at 10.1.2.3")).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, json!({ "error": "Internal server error" }));
    }
}
