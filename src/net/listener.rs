//! TCP listener setup.
//!
//! # Responsibilities
//! - Parse and bind the configured address
//! - Report the bound address (port 0 resolves to an ephemeral port)

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid listen address {addr}: {source}")]
    Address {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Parse `host:port` into a socket address.
pub fn parse_addr(addr: &str) -> Result<SocketAddr, ListenerError> {
    addr.parse().map_err(|source| ListenerError::Address {
        addr: addr.to_string(),
        source,
    })
}

/// Bind a TCP listener on `addr`.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ListenerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;

    let local = listener
        .local_addr()
        .map_err(|source| ListenerError::Bind { addr, source })?;
    tracing::info!(address = %local, "Listener bound");

    Ok(listener)
}
