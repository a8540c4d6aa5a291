//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Build the auth policy and request pipeline
//! - Bind the listener and serve with or without TLS
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::path::Path;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::{validate_config, ConfigError, GatewayConfig};
use crate::http::GatewayServer;
use crate::net::{self, ListenerError, TlsError};
use crate::routing::RouteTable;
use crate::security::KeyError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot load token public key: {0}")]
    Auth(#[from] KeyError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Run the gateway until `shutdown` fires.
///
/// Returns only on shutdown or on a fatal error.
pub async fn start(
    config: &GatewayConfig,
    routes: RouteTable,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), StartupError> {
    validate_config(config).map_err(ConfigError::Validation)?;

    let server = GatewayServer::from_config(config, routes)?;
    let addr = net::parse_addr(&format!("0.0.0.0:{}", config.server.port))?;

    tracing::info!(
        port = config.server.port,
        context_path = %config.server.context_path,
        depth = config.repository.depth,
        tls = config.server.tls_paths().is_some(),
        metrics = config.observability.enable_metrics,
        "Configuration loaded"
    );

    match config.server.tls_paths() {
        Some((cert, key)) => {
            let tls = net::load_tls_config(Path::new(cert), Path::new(key)).await?;
            server.run_tls(addr, tls, shutdown).await?;
        }
        None => {
            let listener = net::bind(addr).await?;
            server.run(listener, shutdown).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::default_routes;

    #[tokio::test]
    async fn invalid_config_is_fatal_before_binding() {
        let mut config = GatewayConfig::default();
        config.auth.username = Some("admin".to_string());
        let (_tx, rx) = broadcast::channel(1);

        let err = start(&config, default_routes(), rx).await.unwrap_err();
        assert!(matches!(err, StartupError::Config(ConfigError::Validation(_))));
    }

    #[tokio::test]
    async fn missing_token_key_is_fatal() {
        let mut config = GatewayConfig::default();
        config.auth.bearer_auth = true;
        config.auth.auth_type = Some("token".to_string());
        config.auth.realm = Some("https://auth.example.com/token".to_string());
        config.auth.service = Some("charts".to_string());
        config.auth.issuer = Some("issuer".to_string());
        config.auth.cert_path = Some("/nonexistent/public.pem".to_string());
        let (_tx, rx) = broadcast::channel(1);

        let err = start(&config, default_routes(), rx).await.unwrap_err();
        assert!(matches!(err, StartupError::Auth(KeyError::Io { .. })));
    }

    #[tokio::test]
    async fn missing_tls_files_are_fatal() {
        let mut config = GatewayConfig::default();
        config.server.port = 0;
        config.server.tls_cert = Some("/nonexistent/cert.pem".to_string());
        config.server.tls_key = Some("/nonexistent/key.pem".to_string());
        let (_tx, rx) = broadcast::channel(1);

        let err = start(&config, default_routes(), rx).await.unwrap_err();
        assert!(matches!(err, StartupError::Tls(TlsError::Io { .. })));
    }
}
