//! Graceful Shutdown Module
//!
//! Background jobs (token sweeps, limiter purges) run in a `JoinSet` owned by
//! a [`ShutdownCoordinator`]. Once the server has drained, the coordinator
//! broadcasts a stop and gives the jobs a deadline before aborting them.

use std::future::Future;
use std::time::Duration;

use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Owns the background jobs of one service process.
pub struct ShutdownCoordinator {
    stop_tx: broadcast::Sender<()>,
    jobs: JoinSet<()>,
}

impl ShutdownCoordinator {
    /// Creates a coordinator with no jobs.
    #[must_use]
    pub fn new() -> Self {
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            stop_tx,
            jobs: JoinSet::new(),
        }
    }

    /// Runs `job` until it finishes or shutdown begins.
    pub fn spawn<F>(&mut self, name: &'static str, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut stop = self.stop_tx.subscribe();

        self.jobs.spawn(async move {
            tokio::select! {
                () = job => debug!(job = name, "Background job finished"),
                _ = stop.recv() => debug!(job = name, "Background job stopped"),
            }
        });
    }

    /// Runs `job` every `period` until shutdown. The first run happens one
    /// full period after spawning; a slow run delays the next tick rather
    /// than bunching ticks up.
    pub fn spawn_periodic<F, Fut>(&mut self, name: &'static str, period: Duration, mut job: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.spawn(name, async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                job().await;
            }
        });
    }

    /// Number of jobs not yet finished.
    #[must_use]
    pub fn active_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Stops every job, waiting up to `deadline` before aborting stragglers.
    /// Returns how many jobs had to be aborted.
    pub async fn shutdown(mut self, deadline: Duration) -> usize {
        info!(jobs = self.jobs.len(), "Stopping background jobs");
        let _ = self.stop_tx.send(());

        let drained = tokio::time::timeout(deadline, async {
            while let Some(joined) = self.jobs.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "Background job failed while stopping");
                }
            }
        })
        .await;

        let aborted = if drained.is_ok() {
            0
        } else {
            let remaining = self.jobs.len();
            warn!(remaining, "Shutdown deadline reached, aborting background jobs");
            self.jobs.abort_all();
            remaining
        };

        info!("Shutdown complete");
        aborted
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed the failure is logged and that branch
/// never completes.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!(signal = "SIGINT", "Draining connections"),
        () = terminate => info!(signal = "SIGTERM", "Draining connections"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_shutdown_stops_pending_job() {
        let mut coordinator = ShutdownCoordinator::new();
        coordinator.spawn("forever", std::future::pending());
        assert_eq!(coordinator.active_jobs(), 1);

        let aborted = tokio::time::timeout(
            Duration::from_secs(2),
            coordinator.shutdown(Duration::from_secs(1)),
        )
        .await
        .unwrap();

        assert_eq!(aborted, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_job_runs_each_period() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut coordinator = ShutdownCoordinator::new();

        let counter = Arc::clone(&runs);
        coordinator.spawn_periodic("tick", Duration::from_secs(10), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        coordinator.shutdown(Duration::from_secs(1)).await;
    }
}
