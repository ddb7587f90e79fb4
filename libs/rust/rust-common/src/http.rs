//! HTTP client configuration for upstream calls.
//!
//! Every outbound request built from this client carries a total timeout and a
//! connect timeout, so a stalled upstream fails the caller instead of hanging it.

use reqwest::{redirect, Client, ClientBuilder};
use std::time::Duration;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout, body included (default: 30s)
    pub timeout: Duration,
    /// Connection timeout (default: 5s)
    pub connect_timeout: Duration,
    /// Pool idle timeout (default: 90s)
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host (default: 10)
    pub pool_max_idle_per_host: usize,
    /// Whether redirects are followed. A proxy passes them through instead.
    pub follow_redirects: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            follow_redirects: false,
        }
    }
}

impl HttpConfig {
    /// Sets the total request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns an error if the client cannot be built (e.g., TLS initialization fails).
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let redirect_policy = if config.follow_redirects {
        redirect::Policy::default()
    } else {
        redirect::Policy::none()
    };

    ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .redirect(redirect_policy)
        .use_rustls_tls()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(!config.follow_redirects);
    }

    #[test]
    fn test_timeouts_override() {
        let config = HttpConfig::default()
            .with_timeout(Duration::from_secs(2))
            .with_connect_timeout(Duration::from_millis(250));

        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_build_client() {
        assert!(build_http_client(&HttpConfig::default()).is_ok());
    }
}
