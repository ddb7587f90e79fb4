//! HTTP server layers shared by the services.
//!
//! Covers the outer boundary of every router: panics become a bare 500,
//! browsers get CORS and hardening headers, and each request carries an
//! `x-request-id`.

use std::any::Any;

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Method, Response, StatusCode};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;

/// Header used to correlate a request across services.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Body returned for any failure whose detail must stay server-side.
pub const INTERNAL_ERROR_BODY: &str = r#"{"error":"Internal server error"}"#;

/// Converts a handler panic into `500 {"error":"Internal server error"}`.
///
/// The panic payload is logged and never sent to the client.
pub fn panic_to_internal_error(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");

    tracing::error!(panic = %detail, "Handler panicked");

    let mut response = Response::new(Body::from(INTERNAL_ERROR_BODY));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Builds the CORS layer. `*` allows any origin; anything else must parse as a
/// header value and is matched exactly.
#[must_use]
pub fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        match HeaderValue::from_str(origin.trim()) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Unusable CORS origin, allowing none");
                AllowOrigin::list(Vec::<HeaderValue>::new())
            }
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Adds response hardening headers to every route of `router`, leaving any
/// value a handler already set.
pub fn with_security_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
}

/// Assigns an `x-request-id` to requests lacking one and echoes it back.
pub fn with_request_id<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
}
