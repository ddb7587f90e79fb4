//! Request middleware run ahead of dispatch.

pub mod rate_limit;

pub use rate_limit::{global_rate_limit, ClientIdentity};
