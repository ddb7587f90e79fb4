//! API Gateway Library
//!
//! Single entry point for cloudshop clients. Requests are rate limited per
//! client, matched against an ordered route table, gated on the presence of
//! credentials where a route demands it, and streamed to the owning service.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod proxy;
pub mod rate_limiter;
pub mod routing;

pub use app::{router, Gateway};
pub use config::Config;
pub use error::GatewayError;
