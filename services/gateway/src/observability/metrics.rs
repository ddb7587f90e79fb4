//! Gateway Metrics
//!
//! Prometheus counters for dispatched requests, limiter rejections and
//! upstream failures, rendered as text for `GET /metrics`.

use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};

/// Gateway metrics
#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    /// Requests by matched route prefix and response status
    pub requests: CounterVec,
    /// Limiter rejections by scope (`global` or a route prefix)
    pub rate_limited: CounterVec,
    /// Upstream transport failures by service
    pub upstream_failures: CounterVec,
}

impl GatewayMetrics {
    /// Creates metrics in a fresh registry
    ///
    /// # Errors
    ///
    /// Returns an error if a collector cannot be registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = CounterVec::new(
            Opts::new("requests_total", "Total requests dispatched").namespace("gateway"),
            &["route", "status"],
        )?;
        registry.register(Box::new(requests.clone()))?;

        let rate_limited = CounterVec::new(
            Opts::new("rate_limited_total", "Requests rejected by a rate limiter")
                .namespace("gateway"),
            &["scope"],
        )?;
        registry.register(Box::new(rate_limited.clone()))?;

        let upstream_failures = CounterVec::new(
            Opts::new("upstream_failures_total", "Upstream transport failures")
                .namespace("gateway"),
            &["service"],
        )?;
        registry.register(Box::new(upstream_failures.clone()))?;

        Ok(Self {
            registry,
            requests,
            rate_limited,
            upstream_failures,
        })
    }

    /// Records a dispatched request
    pub fn record_request(&self, route: &str, status: u16) {
        self.requests
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Records a limiter rejection
    pub fn record_rate_limited(&self, scope: &str) {
        self.rate_limited.with_label_values(&[scope]).inc();
    }

    /// Records an upstream failure
    pub fn record_upstream_failure(&self, service: &str) {
        self.upstream_failures.with_label_values(&[service]).inc();
    }

    /// Renders all metrics in the text exposition format
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for GatewayMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_recorded_series() {
        let metrics = GatewayMetrics::new().unwrap();
        metrics.record_request("/api/products", 200);
        metrics.record_rate_limited("global");
        metrics.record_upstream_failure("orders");

        let text = metrics.render().unwrap();
        assert!(text.contains("gateway_requests_total{route=\"/api/products\",status=\"200\"} 1"));
        assert!(text.contains("gateway_rate_limited_total{scope=\"global\"} 1"));
        assert!(text.contains("gateway_upstream_failures_total{service=\"orders\"} 1"));
    }

    #[test]
    fn test_instances_are_isolated() {
        let a = GatewayMetrics::new().unwrap();
        let b = GatewayMetrics::new().unwrap();
        a.record_rate_limited("global");

        assert!(!b.render().unwrap().contains("scope=\"global\"} 1"));
    }
}
