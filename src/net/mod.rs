//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → listener.rs (bind plain TCP)
//!     → tls.rs (load certificate and key when TLS is configured)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is optional and selected once at startup
//! - Bind and certificate errors are fatal

pub mod listener;
pub mod tls;

pub use listener::{bind, parse_addr, ListenerError};
pub use tls::{load_tls_config, TlsError};
