//! Fixed-Window Rate Limiter
//!
//! Counts requests per client identity in fixed windows. Counters are shared
//! by all request tasks behind one lock; a window that has fully elapsed is
//! reset on the next request and dropped by [`FixedWindowLimiter::purge_expired`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

/// Rate limit decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request allowed
    Allowed {
        /// Requests permitted per window
        limit: u32,
        /// Requests left in the current window
        remaining: u32,
        /// Time until the window resets
        reset_after: Duration,
    },
    /// Request denied with retry-after duration
    Denied {
        /// Requests permitted per window
        limit: u32,
        /// Time until the window resets
        retry_after: Duration,
    },
}

impl RateLimitDecision {
    /// Whether the request may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests per window
    pub max_requests: u32,
    /// Window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ClientWindow {
    request_count: u32,
    window_start: Instant,
}

/// Per-client fixed-window limiter.
#[derive(Debug, Clone)]
pub struct FixedWindowLimiter {
    config: RateLimitConfig,
    clients: Arc<RwLock<HashMap<String, ClientWindow>>>,
}

impl FixedWindowLimiter {
    /// Creates a limiter with no tracked clients.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The limiter's configuration.
    #[must_use]
    pub const fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Counts one request for `client_id` and decides whether it may proceed.
    /// Denied requests are not counted.
    pub async fn check(&self, client_id: &str) -> RateLimitDecision {
        let mut clients = self.clients.write().await;
        let now = Instant::now();

        let state = clients
            .entry(client_id.to_string())
            .or_insert(ClientWindow {
                request_count: 0,
                window_start: now,
            });

        // Reset window if expired
        if now.duration_since(state.window_start) >= self.config.window {
            state.request_count = 0;
            state.window_start = now;
        }

        let reset_after = self
            .config
            .window
            .saturating_sub(now.duration_since(state.window_start));

        if state.request_count >= self.config.max_requests {
            return RateLimitDecision::Denied {
                limit: self.config.max_requests,
                retry_after: reset_after.max(Duration::from_secs(1)),
            };
        }

        state.request_count += 1;

        RateLimitDecision::Allowed {
            limit: self.config.max_requests,
            remaining: self.config.max_requests - state.request_count,
            reset_after,
        }
    }

    /// Drops clients whose window has fully elapsed. Returns how many were
    /// removed.
    pub async fn purge_expired(&self) -> usize {
        let mut clients = self.clients.write().await;
        let now = Instant::now();
        let before = clients.len();

        clients.retain(|_, state| now.duration_since(state.window_start) < self.config.window);

        before - clients.len()
    }

    /// Number of clients currently tracked.
    pub async fn tracked_clients(&self) -> usize {
        self.clients.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> FixedWindowLimiter {
        FixedWindowLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(window_secs),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_reached_then_denied() {
        let limiter = limiter(100, 900);

        for i in 0..100 {
            let decision = limiter.check("10.0.0.1").await;
            assert!(decision.is_allowed(), "request {} should pass", i + 1);
        }

        match limiter.check("10.0.0.1").await {
            RateLimitDecision::Denied { limit, retry_after } => {
                assert_eq!(limit, 100);
                assert_eq!(retry_after, Duration::from_secs(900));
            }
            other => panic!("expected denial, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_counts_down() {
        let limiter = limiter(3, 60);

        let remaining: Vec<u32> = [
            limiter.check("c").await,
            limiter.check("c").await,
            limiter.check("c").await,
        ]
        .into_iter()
        .map(|d| match d {
            RateLimitDecision::Allowed { remaining, .. } => remaining,
            RateLimitDecision::Denied { .. } => u32::MAX,
        })
        .collect();

        assert_eq!(remaining, vec![2, 1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clients_are_independent() {
        let limiter = limiter(1, 60);

        assert!(limiter.check("a").await.is_allowed());
        assert!(!limiter.check("a").await.is_allowed());
        assert!(limiter.check("b").await.is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets() {
        let limiter = limiter(1, 60);

        assert!(limiter.check("a").await.is_allowed());
        assert!(!limiter.check("a").await.is_allowed());

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(limiter.check("a").await.is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_drops_elapsed_windows() {
        let limiter = limiter(5, 60);
        limiter.check("old").await;

        tokio::time::advance(Duration::from_secs(30)).await;
        limiter.check("new").await;

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(limiter.purge_expired().await, 1);
        assert_eq!(limiter.tracked_clients().await, 1);
    }
}
