//! Chart repository HTTP gateway library.
//!
//! Routes requests for a chart repository, authorizes them against the
//! configured policy, and hands them to repository handlers.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use http::{Gateway, GatewayServer};
pub use lifecycle::Shutdown;
