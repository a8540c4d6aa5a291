//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (context path + depth, frozen table)
//!     → matcher.rs (segment-by-segment match, namespace consumption)
//!     → Return: RouteMatch { route, params } or None
//!
//! Route Registration (at startup):
//!     Route::new(method, "/api/:repo/charts", action, handler)
//!     → Pattern compiled into segments
//!     → Appended to RouteTable (order = priority)
//!     → Frozen inside Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod matcher;
pub mod route;
pub mod router;

pub use matcher::{match_route, RouteMatch};
pub use route::{Action, Handler, Params, Route, RouteRequest, RouteTable, NAMESPACE_PARAM};
pub use router::Router;
