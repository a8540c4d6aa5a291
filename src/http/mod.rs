//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, master handler)
//!     → request.rs (request ID, trace span)
//!     → [routing layer picks route and binds params]
//!     → [security layer authorizes the action]
//!     → handlers.rs (system info, repository operations)
//!     → response.rs (JSON rejections)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use handlers::{chart_routes, default_routes, RepositoryHandlers};
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{Gateway, GatewayServer};
