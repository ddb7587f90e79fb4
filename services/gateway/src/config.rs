//! Gateway configuration, read once from the environment.

use std::time::Duration;

use rust_common::env::{
    load_dotenv, parse_duration_env, parse_env, parse_url_env, require_positive, string_env,
};
use rust_common::{ConfigError, HttpConfig};
use url::Url;

use crate::rate_limiter::RateLimitConfig;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Auth service base URL
    pub auth_service_url: Url,
    /// Products service base URL
    pub products_service_url: Url,
    /// Orders service base URL
    pub orders_service_url: Url,
    /// Allowed CORS origin, `*` for any
    pub cors_origin: String,
    /// Total bound on one upstream exchange
    pub upstream_timeout: Duration,
    /// Bound on establishing an upstream connection
    pub upstream_connect_timeout: Duration,
    /// Window shared by the global and auth limiters
    pub rate_limit_window: Duration,
    /// Global requests per window per client
    pub rate_limit_max: u32,
    /// `/api/auth` requests per window per client
    pub auth_rate_limit_max: u32,
    /// Identify clients by the first `X-Forwarded-For` entry
    pub trust_proxy: bool,
    /// Drain deadline for background tasks
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unparsable or out-of-range values.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        let window_ms: u64 = parse_env("RATE_LIMIT_WINDOW_MS", 900_000)?;

        let config = Self {
            host: string_env("HOST", "0.0.0.0"),
            port: parse_env("PORT", 8080)?,
            auth_service_url: parse_url_env("AUTH_SERVICE_URL", "http://auth-service:8081")?,
            products_service_url: parse_url_env(
                "PRODUCTS_SERVICE_URL",
                "http://products-service:8082",
            )?,
            orders_service_url: parse_url_env("ORDERS_SERVICE_URL", "http://orders-service:8083")?,
            cors_origin: string_env("CORS_ORIGIN", "*"),
            upstream_timeout: parse_duration_env("UPSTREAM_TIMEOUT", "30")?,
            upstream_connect_timeout: parse_duration_env("UPSTREAM_CONNECT_TIMEOUT", "5")?,
            rate_limit_window: Duration::from_millis(window_ms),
            rate_limit_max: parse_env("RATE_LIMIT_MAX", 100)?,
            auth_rate_limit_max: parse_env("AUTH_RATE_LIMIT_MAX", 20)?,
            trust_proxy: parse_env("TRUST_PROXY", false)?,
            shutdown_timeout: parse_duration_env("SHUTDOWN_TIMEOUT", "30")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        for (field, url) in [
            ("AUTH_SERVICE_URL", &self.auth_service_url),
            ("PRODUCTS_SERVICE_URL", &self.products_service_url),
            ("ORDERS_SERVICE_URL", &self.orders_service_url),
        ] {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidUrl {
                    field: field.to_string(),
                    reason: format!("unsupported scheme {}", url.scheme()),
                });
            }
        }
        require_positive("UPSTREAM_TIMEOUT", self.upstream_timeout)?;
        require_positive("UPSTREAM_CONNECT_TIMEOUT", self.upstream_connect_timeout)?;
        require_positive("RATE_LIMIT_WINDOW_MS", self.rate_limit_window)?;
        if self.rate_limit_max == 0 {
            return Err(ConfigError::InvalidLimit("RATE_LIMIT_MAX".to_string()));
        }
        if self.auth_rate_limit_max == 0 {
            return Err(ConfigError::InvalidLimit("AUTH_RATE_LIMIT_MAX".to_string()));
        }
        Ok(())
    }

    /// Global limiter settings.
    #[must_use]
    pub const fn global_rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.rate_limit_max,
            window: self.rate_limit_window,
        }
    }

    /// Upstream client settings. Redirects are passed through to the client.
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig::default()
            .with_timeout(self.upstream_timeout)
            .with_connect_timeout(self.upstream_connect_timeout)
    }

    /// Socket address string to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Configuration pointing at the given upstreams, with defaults for
    /// everything else. Used by tests and embedded setups.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] for an unparsable URL.
    pub fn for_upstreams(auth: &str, products: &str, orders: &str) -> Result<Self, ConfigError> {
        let parse = |field: &str, raw: &str| {
            Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
                field: field.to_string(),
                reason: e.to_string(),
            })
        };

        let config = Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            auth_service_url: parse("AUTH_SERVICE_URL", auth)?,
            products_service_url: parse("PRODUCTS_SERVICE_URL", products)?,
            orders_service_url: parse("ORDERS_SERVICE_URL", orders)?,
            cors_origin: "*".to_string(),
            upstream_timeout: Duration::from_secs(30),
            upstream_connect_timeout: Duration::from_secs(5),
            rate_limit_window: Duration::from_millis(900_000),
            rate_limit_max: 100,
            auth_rate_limit_max: 20,
            trust_proxy: false,
            shutdown_timeout: Duration::from_secs(30),
        };
        config.validate()?;
        Ok(config)
    }
}
