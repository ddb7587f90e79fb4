//! Auth service binary.

use std::sync::Arc;

use auth_service::password::BcryptHasher;
use auth_service::store::PgCredentialStore;
use auth_service::token::TokenService;
use auth_service::{router, AccountService, AppState, Config};
use rust_common::{init_tracing, wait_for_signal, ShutdownCoordinator, TracingConfig};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(&TracingConfig::from_env("auth-service"));

    let config = Config::from_env()?;
    if config.jwt_secret_is_default {
        warn!("JWT_SECRET not set, using the development secret");
    }

    let store = PgCredentialStore::connect(&config.store_config()).await?;
    store.initialize().await?;

    let tokens = TokenService::new(
        &config.jwt_secret,
        config.access_token_ttl,
        config.refresh_token_ttl,
    )?;
    let accounts = AccountService::new(
        Arc::new(store),
        tokens,
        Arc::new(BcryptHasher::new(config.bcrypt_cost)),
    );

    let mut coordinator = ShutdownCoordinator::new();
    let sweeper = accounts.clone();
    coordinator.spawn_periodic("refresh-token-sweep", config.token_sweep_interval, move || {
        let sweeper = sweeper.clone();
        async move {
            if let Err(e) = sweeper.sweep_expired_tokens().await {
                error!(error = %e, "Refresh token sweep failed");
            }
        }
    });

    let app = router(AppState { accounts }, &config.cors_origin);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(address = %config.bind_address(), "Auth service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await?;

    coordinator.shutdown(config.shutdown_timeout).await;
    Ok(())
}
