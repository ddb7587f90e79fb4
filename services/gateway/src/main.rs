//! API gateway binary.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use api_gateway::{router, Config, Gateway};
use rust_common::{init_tracing, wait_for_signal, ShutdownCoordinator, TracingConfig};
use tracing::{debug, info};

const LIMITER_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(&TracingConfig::from_env("api-gateway"));

    let config = Config::from_env()?;
    let gateway = Arc::new(Gateway::from_config(&config)?);

    for binding in gateway.routes().bindings() {
        info!(route = %binding, action = ?binding.action, auth = ?binding.auth, "Route registered");
    }

    let mut coordinator = ShutdownCoordinator::new();
    let purger = Arc::clone(&gateway);
    coordinator.spawn_periodic("rate-limit-purge", LIMITER_PURGE_INTERVAL, move || {
        let purger = Arc::clone(&purger);
        async move {
            let purged = purger.purge_limiters().await;
            if purged > 0 {
                debug!(purged, "Purged elapsed rate limit windows");
            }
        }
    });

    let app = router(gateway, &config.cors_origin);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(address = %config.bind_address(), "API gateway listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(wait_for_signal())
    .await?;

    coordinator.shutdown(config.shutdown_timeout).await;
    Ok(())
}
