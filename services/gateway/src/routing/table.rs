use axum::http::Method;
use rust_common::ConfigError;

use super::binding::{AuthPolicy, RouteAction, RouteBinding, RouteLimiter, UpstreamTarget};
use crate::config::Config;
use crate::rate_limiter::RateLimitConfig;

const AUTH_LIMIT_MESSAGE: &str = "Too many authentication attempts, please try again later.";

/// A binding selected for a request, with the path left after its prefix.
#[derive(Debug)]
pub struct RouteMatch<'a, 'p> {
    /// Selected binding
    pub binding: &'a RouteBinding,
    /// Path remainder, empty or starting with `/`
    pub remainder: &'p str,
}

/// Ordered dispatch chain, first match wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    bindings: Vec<RouteBinding>,
}

impl RouteTable {
    /// Builds a table, checking that every proxy binding comes before any
    /// binding that reads the request body.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Inconsistent`] for an ordering violation, an empty or
    /// relative prefix, or a duplicate prefix.
    pub fn new(bindings: Vec<RouteBinding>) -> Result<Self, ConfigError> {
        let mut body_reader: Option<&str> = None;

        for (i, binding) in bindings.iter().enumerate() {
            if !binding.prefix.starts_with('/') {
                return Err(ConfigError::Inconsistent(format!(
                    "route prefix {:?} must start with '/'",
                    binding.prefix
                )));
            }
            if bindings[..i].iter().any(|b| b.prefix == binding.prefix) {
                return Err(ConfigError::Inconsistent(format!(
                    "duplicate route prefix {}",
                    binding.prefix
                )));
            }
            if binding.action.is_proxy() {
                if let Some(reader) = body_reader {
                    return Err(ConfigError::Inconsistent(format!(
                        "proxy route {} is registered after body-reading route {reader}",
                        binding.prefix
                    )));
                }
            }
            if binding.consumes_body && body_reader.is_none() {
                body_reader = Some(binding.prefix.as_str());
            }
        }

        Ok(Self { bindings })
    }

    /// The gateway's fixed table: health, metrics, then the three proxies.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::new`] validation.
    pub fn standard(config: &Config) -> Result<Self, ConfigError> {
        let auth_limit = RateLimitConfig {
            max_requests: config.auth_rate_limit_max,
            window: config.rate_limit_window,
        };

        Self::new(vec![
            RouteBinding::local("/health", RouteAction::Health),
            RouteBinding::local("/metrics", RouteAction::Metrics),
            RouteBinding::proxy(
                "/api/auth",
                UpstreamTarget::new("auth", config.auth_service_url.clone(), "/auth"),
            )
            .with_limiter(RouteLimiter::new(auth_limit, AUTH_LIMIT_MESSAGE)),
            RouteBinding::proxy(
                "/api/products",
                UpstreamTarget::new("products", config.products_service_url.clone(), "/products"),
            ),
            RouteBinding::proxy(
                "/api/orders",
                UpstreamTarget::new("orders", config.orders_service_url.clone(), "/orders"),
            )
            .with_auth(AuthPolicy::HeaderRequired),
        ])
    }

    /// First binding matching `method` and `path`. Local bindings answer GET
    /// only; proxies take every method.
    #[must_use]
    pub fn resolve<'a, 'p>(&'a self, method: &Method, path: &'p str) -> Option<RouteMatch<'a, 'p>> {
        self.bindings.iter().find_map(|binding| {
            if !binding.action.is_proxy() && method != Method::GET {
                return None;
            }
            binding
                .match_path(path)
                .map(|remainder| RouteMatch { binding, remainder })
        })
    }

    /// Bindings in dispatch order.
    #[must_use]
    pub fn bindings(&self) -> &[RouteBinding] {
        &self.bindings
    }

    /// Route-scoped limiters, for periodic purging.
    pub fn limiters(&self) -> impl Iterator<Item = &RouteLimiter> {
        self.bindings.iter().filter_map(|b| b.limiter.as_ref())
    }
}
