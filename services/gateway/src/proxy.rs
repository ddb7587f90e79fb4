//! Upstream forwarding.
//!
//! Requests and responses are streamed through without buffering. Method,
//! status, end-to-end headers and bodies pass unchanged; only the path is
//! rewritten.

use std::net::IpAddr;

use axum::body::{Body, HttpBody};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Response};
use rust_common::{build_http_client, HttpConfig};
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::routing::UpstreamTarget;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Connection-scoped headers that must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Streams requests to upstream services.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    /// Builds the pooled client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Forwards `request` to `target`, replacing the matched prefix with the
    /// target's rewrite and keeping `remainder` and the query string.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ServiceUnavailable`] when the upstream cannot be
    /// reached or does not answer in time. Upstream error statuses are
    /// passed through as responses, not errors.
    pub async fn forward(
        &self,
        target: &UpstreamTarget,
        remainder: &str,
        client_ip: Option<IpAddr>,
        request: Request<Body>,
    ) -> Result<Response<Body>, GatewayError> {
        let url = target.target_url(remainder, request.uri().query());
        let (parts, body) = request.into_parts();

        let mut headers = forwardable_headers(&parts.headers);
        headers.remove(header::HOST);
        if let Some(ip) = client_ip {
            append_forwarded_for(&mut headers, ip);
        }

        debug!(service = %target.name, method = %parts.method, url = %url, "Forwarding request");

        let mut outbound = self.client.request(parts.method, &url).headers(headers);
        if body.size_hint().exact() != Some(0) {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = outbound
            .send()
            .await
            .map_err(|e| {
                warn!(
                    service = %target.name,
                    url = %url,
                    error = %e,
                    timeout = e.is_timeout(),
                    "Upstream request failed"
                );
                GatewayError::ServiceUnavailable {
                    service: target.display_name(),
                }
            })?;

        let mut response = Response::builder().status(upstream.status());
        if let Some(out) = response.headers_mut() {
            *out = forwardable_headers(upstream.headers());
        }

        response
            .body(Body::from_stream(upstream.bytes_stream()))
            .map_err(|e| GatewayError::Internal(e.into()))
    }
}

/// Names listed in `Connection` are hop-by-hop for this message as well.
fn connection_listed(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}

fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let listed = connection_listed(headers);
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name) && !listed.contains(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    let chain = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(existing) if !existing.trim().is_empty() => format!("{existing}, {ip}"),
        _ => ip.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&chain) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
