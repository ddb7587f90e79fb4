//! HTTP surface of the auth service.

mod auth;
mod health;

use axum::routing::{get, post};
use axum::Router;
use rust_common::server::{cors_layer, panic_to_internal_error, with_request_id, with_security_headers};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::accounts::AccountService;
use crate::error::AuthError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Account lifecycle operations
    pub accounts: AccountService,
}

async fn not_found() -> AuthError {
    AuthError::NotFound
}

/// Builds the full router with its middleware stack.
pub fn router(state: AppState, cors_origin: &str) -> Router {
    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/verify", get(auth::verify))
        .route("/auth/logout", post(auth::logout))
        .fallback(not_found)
        .with_state(state);

    with_request_id(
        with_security_headers(routes)
            .layer(cors_layer(cors_origin))
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(panic_to_internal_error)),
    )
}
