//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Matched route (action) + request headers:
//!     → auth.rs (policy dispatch, anonymous reads)
//!     → basic.rs (static credential digest)
//!     → bearer.rs (signed token: signature, issuer, service, expiry, scope)
//!     → AuthVerdict { authorized, headers }
//! ```
//!
//! # Design Decisions
//! - Fail closed: anything not explicitly granted is denied
//! - Policy is built once at startup; a broken policy never serves traffic
//! - No trust in client input

pub mod auth;
pub mod basic;
pub mod bearer;

pub use auth::{authorize, AuthPolicy, AuthRequest, AuthVerdict};
pub use basic::BasicCredentials;
pub use bearer::{BearerAuth, KeyError, TokenError};
