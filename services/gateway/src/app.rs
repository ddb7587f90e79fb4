//! Gateway state, dispatch, and router assembly.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use chrono::Utc;
use rust_common::server::{
    cors_layer, panic_to_internal_error, with_request_id, with_security_headers,
};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::GatewayError;
use crate::middleware::{global_rate_limit, ClientIdentity};
use crate::observability::GatewayMetrics;
use crate::proxy::UpstreamClient;
use crate::rate_limiter::{FixedWindowLimiter, RateLimitDecision};
use crate::routing::{AuthPolicy, RouteAction, RouteMatch, RouteTable};

const UNMATCHED_ROUTE: &str = "unmatched";
const MISSING_TOKEN: &str = "No token provided";

/// Everything a request needs, shared by all request tasks.
#[derive(Debug)]
pub struct Gateway {
    pub(crate) routes: RouteTable,
    pub(crate) upstream: UpstreamClient,
    pub(crate) metrics: GatewayMetrics,
    pub(crate) global_limiter: FixedWindowLimiter,
    pub(crate) trust_proxy: bool,
}

impl Gateway {
    /// Assembles the gateway from configuration.
    ///
    /// # Errors
    ///
    /// Fails on an inconsistent route table, a client that cannot be built,
    /// or metrics that cannot be registered.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            routes: RouteTable::standard(config)?,
            upstream: UpstreamClient::new(&config.http_config())?,
            metrics: GatewayMetrics::new()?,
            global_limiter: FixedWindowLimiter::new(config.global_rate_limit()),
            trust_proxy: config.trust_proxy,
        })
    }

    /// The dispatch chain.
    #[must_use]
    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Metrics registry.
    #[must_use]
    pub const fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    /// Drops elapsed windows from every limiter. Returns how many client
    /// entries were removed.
    pub async fn purge_limiters(&self) -> usize {
        let mut purged = self.global_limiter.purge_expired().await;
        for route in self.routes.limiters() {
            purged += route.limiter.purge_expired().await;
        }
        purged
    }
}

/// Fallback handler: every request the router sees ends up here.
async fn dispatch(State(gateway): State<Arc<Gateway>>, request: Request) -> Response {
    let path = request.uri().path().to_owned();

    let Some(route) = gateway.routes.resolve(request.method(), &path) else {
        debug!(method = %request.method(), path = %path, "No route matched");
        gateway.metrics.record_request(UNMATCHED_ROUTE, 404);
        return GatewayError::NotFound.into_response();
    };

    let label = route.binding.prefix.clone();
    let service = match &route.binding.action {
        RouteAction::Proxy(target) => Some(target.name.clone()),
        RouteAction::Health | RouteAction::Metrics => None,
    };

    let response = match handle(&gateway, route, request).await {
        Ok(response) => response,
        Err(err) => {
            if let (GatewayError::ServiceUnavailable { .. }, Some(service)) = (&err, &service) {
                gateway.metrics.record_upstream_failure(service);
            }
            err.into_response()
        }
    };

    gateway
        .metrics
        .record_request(&label, response.status().as_u16());
    response
}

/// Route limiter, header gate, then the bound action.
async fn handle(
    gateway: &Gateway,
    route: RouteMatch<'_, '_>,
    request: Request,
) -> Result<Response, GatewayError> {
    let binding = route.binding;
    let identity = request
        .extensions()
        .get::<ClientIdentity>()
        .cloned()
        .unwrap_or_else(|| ClientIdentity::resolve(None, request.headers(), gateway.trust_proxy));

    if let Some(route_limiter) = &binding.limiter {
        if let RateLimitDecision::Denied { retry_after, .. } =
            route_limiter.limiter.check(&identity.key).await
        {
            warn!(
                client = %identity.key,
                route = %binding,
                "Route rate limit exceeded"
            );
            gateway.metrics.record_rate_limited(&binding.prefix);
            return Err(GatewayError::RateLimited {
                message: route_limiter.message,
                retry_after,
            });
        }
    }

    if binding.auth == AuthPolicy::HeaderRequired {
        let present = request
            .headers()
            .get(header::AUTHORIZATION)
            .is_some_and(|value| !value.as_bytes().is_empty());
        if !present {
            debug!(route = %binding, "Missing authorization header");
            return Err(GatewayError::Unauthorized(MISSING_TOKEN));
        }
    }

    match &binding.action {
        RouteAction::Proxy(target) => {
            gateway
                .upstream
                .forward(target, route.remainder, identity.ip, request)
                .await
        }
        RouteAction::Health => Ok(Json(json!({
            "status": "healthy",
            "service": "api-gateway",
            "timestamp": Utc::now().to_rfc3339(),
        }))
        .into_response()),
        RouteAction::Metrics => {
            let text = gateway
                .metrics
                .render()
                .map_err(|e| GatewayError::Internal(e.into()))?;
            let mut response = Response::new(Body::from(text));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            *response.status_mut() = StatusCode::OK;
            Ok(response)
        }
    }
}

/// Builds the gateway router: global limiter, dispatch, and the boundary
/// layers shared with the other services.
pub fn router(gateway: Arc<Gateway>, cors_origin: &str) -> Router {
    let routes = Router::new()
        .fallback(dispatch)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&gateway),
            global_rate_limit,
        ))
        .with_state(gateway);

    with_request_id(
        with_security_headers(routes)
            .layer(cors_layer(cors_origin))
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(panic_to_internal_error)),
    )
}
