//! Global rate limiting middleware.
//!
//! Resolves the client identity once per request, stores it in the request
//! extensions for dispatch, and applies the global limiter to every path.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::app::Gateway;
use crate::error::GatewayError;
use crate::rate_limiter::RateLimitDecision;

const GLOBAL_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";
/// Route label for requests turned away before dispatch.
const RATE_LIMITED_ROUTE: &str = "rate_limited";

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Who a request is counted against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Limiter key, the client IP or `unknown`
    pub key: String,
    /// Client IP when known
    pub ip: Option<IpAddr>,
}

impl ClientIdentity {
    /// Resolves the identity from the socket peer, or from the first
    /// `X-Forwarded-For` entry when the gateway sits behind a trusted proxy.
    #[must_use]
    pub fn resolve(peer: Option<SocketAddr>, headers: &HeaderMap, trust_proxy: bool) -> Self {
        let forwarded = trust_proxy
            .then(|| {
                headers
                    .get("x-forwarded-for")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.split(',').next())
                    .and_then(|first| first.trim().parse::<IpAddr>().ok())
            })
            .flatten();

        let ip = forwarded.or_else(|| peer.map(|addr| addr.ip()));

        Self {
            key: ip.map_or_else(|| "unknown".to_string(), |ip| ip.to_string()),
            ip,
        }
    }
}

/// Applies the global limiter. Allowed responses carry `RateLimit-*`
/// headers; rejected requests never reach dispatch.
pub async fn global_rate_limit(
    State(gateway): State<Arc<Gateway>>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identity = ClientIdentity::resolve(peer, request.headers(), gateway.trust_proxy);

    let decision = gateway.global_limiter.check(&identity.key).await;

    match decision {
        RateLimitDecision::Denied { limit, retry_after } => {
            warn!(
                client = %identity.key,
                path = %request.uri().path(),
                limit,
                "Global rate limit exceeded"
            );
            gateway.metrics.record_rate_limited("global");
            gateway.metrics.record_request(RATE_LIMITED_ROUTE, 429);
            GatewayError::RateLimited {
                message: GLOBAL_LIMIT_MESSAGE,
                retry_after,
            }
            .into_response()
        }
        RateLimitDecision::Allowed {
            limit,
            remaining,
            reset_after,
        } => {
            request.extensions_mut().insert(identity);
            let mut response = next.run(request).await;

            let headers = response.headers_mut();
            headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limit));
            headers.insert(RATELIMIT_REMAINING, HeaderValue::from(remaining));
            headers.insert(
                RATELIMIT_RESET,
                HeaderValue::from(reset_after.as_secs().max(1)),
            );
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_peer_address_used_by_default() {
        let peer: SocketAddr = "192.0.2.7:5000".parse().unwrap();
        let identity = ClientIdentity::resolve(
            Some(peer),
            &headers_with_forwarded("203.0.113.1"),
            false,
        );

        assert_eq!(identity.key, "192.0.2.7");
    }

    #[test]
    fn test_forwarded_for_used_when_trusted() {
        let peer: SocketAddr = "10.0.0.2:5000".parse().unwrap();
        let identity = ClientIdentity::resolve(
            Some(peer),
            &headers_with_forwarded("203.0.113.1, 10.0.0.9"),
            true,
        );

        assert_eq!(identity.key, "203.0.113.1");
    }

    #[test]
    fn test_garbage_forwarded_for_falls_back_to_peer() {
        let peer: SocketAddr = "10.0.0.2:5000".parse().unwrap();
        let identity =
            ClientIdentity::resolve(Some(peer), &headers_with_forwarded("not-an-ip"), true);

        assert_eq!(identity.key, "10.0.0.2");
    }

    #[test]
    fn test_unknown_without_peer() {
        let identity = ClientIdentity::resolve(None, &HeaderMap::new(), false);
        assert_eq!(identity.key, "unknown");
        assert!(identity.ip.is_none());
    }
}
