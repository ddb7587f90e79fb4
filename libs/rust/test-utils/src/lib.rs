//! Shared test utilities for cloudshop Rust services.
//!
//! This crate provides:
//! - Proptest generators for accounts, paths and client identities
//! - A recording fake upstream built on `wiremock`
//! - Sample accounts and helpers to run a router on an ephemeral port

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use fixtures::{serve, unique_account, SampleAccount};
pub use generators::*;
pub use mocks::{unreachable_upstream, MockUpstream};
