//! Shared library for cross-cutting concerns in cloudshop Rust services.
//!
//! This crate provides centralized implementations for:
//! - Environment-driven configuration parsing with validation errors
//! - HTTP client configuration and building for upstream calls
//! - Tracing subscriber initialization
//! - Graceful shutdown and background task tracking
//! - Server boundary layers (CORS, hardening headers, panic responses)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod http;
pub mod server;
pub mod shutdown;
pub mod tracing_config;

pub use env::ConfigError;
pub use http::{build_http_client, HttpConfig};
pub use server::{
    cors_layer, panic_to_internal_error, with_request_id, with_security_headers, REQUEST_ID_HEADER,
};
pub use shutdown::{wait_for_signal, ShutdownCoordinator};
pub use tracing_config::{init_tracing, LogFormat, TracingConfig};
