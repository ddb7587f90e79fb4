use std::fmt;

use url::Url;

use crate::rate_limiter::{FixedWindowLimiter, RateLimitConfig};

/// Upstream a binding proxies to.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    /// Lowercase service name used in logs and metrics, e.g. `products`
    pub name: String,
    /// Base URL of the service
    pub base_url: Url,
    /// Path that replaces the matched prefix, e.g. `/products`
    pub rewrite: String,
}

impl UpstreamTarget {
    /// Creates a target.
    #[must_use]
    pub fn new(name: impl Into<String>, base_url: Url, rewrite: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url,
            rewrite: rewrite.into(),
        }
    }

    /// Capitalized name for client messages, e.g. `Products`.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }

    /// Builds the upstream URL for a matched request: base, rewrite, the
    /// path remainder after the prefix, and the original query.
    #[must_use]
    pub fn target_url(&self, remainder: &str, query: Option<&str>) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = format!("{base}{}{remainder}", self.rewrite);
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

/// What a matched binding does.
#[derive(Debug, Clone)]
pub enum RouteAction {
    /// Stream the request to an upstream
    Proxy(UpstreamTarget),
    /// Gateway liveness document
    Health,
    /// Prometheus text exposition
    Metrics,
}

impl RouteAction {
    /// Whether this action forwards the raw request.
    #[must_use]
    pub const fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy(_))
    }
}

/// Gate applied before the action runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// No check
    Public,
    /// A non-empty `Authorization` header must be present; its validity is
    /// the upstream's concern
    HeaderRequired,
}

/// Limiter scoped to one binding.
#[derive(Debug, Clone)]
pub struct RouteLimiter {
    /// Rejection message
    pub message: &'static str,
    /// Counters
    pub limiter: FixedWindowLimiter,
}

impl RouteLimiter {
    /// Creates a route limiter.
    #[must_use]
    pub fn new(config: RateLimitConfig, message: &'static str) -> Self {
        Self {
            message,
            limiter: FixedWindowLimiter::new(config),
        }
    }
}

/// One entry of the dispatch chain.
#[derive(Debug, Clone)]
pub struct RouteBinding {
    /// Path prefix, matched on a segment boundary
    pub prefix: String,
    /// What to do on a match
    pub action: RouteAction,
    /// Gate to pass first
    pub auth: AuthPolicy,
    /// Optional route-scoped limiter, applied after the global one
    pub limiter: Option<RouteLimiter>,
    /// Whether the handler reads the request body
    pub consumes_body: bool,
}

impl RouteBinding {
    /// A public binding proxying `prefix` to `target`.
    #[must_use]
    pub fn proxy(prefix: impl Into<String>, target: UpstreamTarget) -> Self {
        Self {
            prefix: prefix.into(),
            action: RouteAction::Proxy(target),
            auth: AuthPolicy::Public,
            limiter: None,
            consumes_body: false,
        }
    }

    /// A local, GET-only binding.
    #[must_use]
    pub fn local(prefix: impl Into<String>, action: RouteAction) -> Self {
        Self {
            prefix: prefix.into(),
            action,
            auth: AuthPolicy::Public,
            limiter: None,
            consumes_body: false,
        }
    }

    /// Sets the auth policy.
    #[must_use]
    pub const fn with_auth(mut self, auth: AuthPolicy) -> Self {
        self.auth = auth;
        self
    }

    /// Adds a route-scoped limiter.
    #[must_use]
    pub fn with_limiter(mut self, limiter: RouteLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Marks the binding as reading the request body.
    #[must_use]
    pub const fn consuming_body(mut self) -> Self {
        self.consumes_body = true;
        self
    }

    /// Returns the path remainder after the prefix if `path` matches.
    ///
    /// Proxy bindings match the prefix itself or anything below it on a
    /// segment boundary (`/api/orders` matches `/api/orders/7` but not
    /// `/api/ordersx`). Local bindings match the exact path only.
    #[must_use]
    pub fn match_path<'p>(&self, path: &'p str) -> Option<&'p str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;

        if !self.action.is_proxy() {
            return rest.is_empty().then_some(rest);
        }

        (rest.is_empty() || rest.starts_with('/') || self.prefix.ends_with('/')).then_some(rest)
    }
}

impl fmt::Display for RouteBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix)
    }
}
