//! Route table: path prefixes bound to upstreams and gateway-local handlers.
//!
//! The table is data. Bindings are evaluated in order and the first match
//! wins; each one declares its auth gate, an optional route limiter, and
//! whether it reads the request body.

mod binding;
mod table;

pub use binding::{AuthPolicy, RouteAction, RouteBinding, RouteLimiter, UpstreamTarget};
pub use table::{RouteMatch, RouteTable};
