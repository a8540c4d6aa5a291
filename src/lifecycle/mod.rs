//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Build auth policy + pipeline → Bind → Serve (TLS or plain)
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT → Broadcast → Stop accepting → Drain connections → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then pipeline, then listener
//! - Any startup or serve error is fatal to the process

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{start, StartupError};
