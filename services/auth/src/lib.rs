//! Auth Service Library
//!
//! Account registration and login, stateless access tokens, and single-use
//! refresh tokens persisted in a credential store.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod accounts;
pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod password;
pub mod routes;
pub mod store;
pub mod token;

pub use accounts::{AccountService, AuthSession};
pub use config::Config;
pub use error::AuthError;
pub use routes::{router, AppState};
