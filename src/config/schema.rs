//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Realm used in Basic challenges when no auth service name is configured.
pub const DEFAULT_REALM: &str = "chart-gateway";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (port, TLS, context path).
    pub server: ServerConfig,

    /// Repository namespace layout.
    pub repository: RepositoryConfig,

    /// Authentication policy settings.
    pub auth: AuthConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on (all interfaces).
    pub port: u16,

    /// URL prefix stripped from every request before route matching.
    pub context_path: String,

    /// Path to TLS certificate file (PEM). Requires `tls_key`.
    pub tls_cert: Option<String>,

    /// Path to TLS private key file (PEM). Requires `tls_cert`.
    pub tls_key: Option<String>,

    /// Maximum request body size in bytes.
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            context_path: String::new(),
            tls_cert: None,
            tls_key: None,
            max_upload_size: 20 * 1024 * 1024, // 20MB
        }
    }
}

impl ServerConfig {
    /// Both certificate and key, when TLS is configured.
    pub fn tls_paths(&self) -> Option<(&str, &str)> {
        match (self.tls_cert.as_deref(), self.tls_key.as_deref()) {
            (Some(cert), Some(key)) if !cert.is_empty() && !key.is_empty() => Some((cert, key)),
            _ => None,
        }
    }
}

/// Repository namespace layout.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Number of path segments naming a repository (0 = single repository).
    pub depth: usize,
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Basic auth username.
    pub username: Option<String>,

    /// Basic auth password.
    pub password: Option<String>,

    /// Allow unauthenticated GET/HEAD on pull routes (Basic or no auth only).
    pub anonymous_get: bool,

    /// Enable bearer token auth.
    pub bearer_auth: bool,

    /// Token auth type; only "token" is supported.
    pub auth_type: Option<String>,

    /// Token service URL clients are sent to.
    pub realm: Option<String>,

    /// Service name tokens must be issued for (audience).
    pub service: Option<String>,

    /// Expected token issuer.
    pub issuer: Option<String>,

    /// Path to the token issuer's public key (PEM).
    pub cert_path: Option<String>,
}

impl AuthConfig {
    /// Basic credentials, when both halves are present.
    pub fn basic_credentials(&self) -> Option<(&str, &str)> {
        match (non_empty(&self.username), non_empty(&self.password)) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        }
    }

    /// Realm announced in Basic challenges.
    pub fn basic_realm(&self) -> &str {
        non_empty(&self.service).unwrap_or(DEFAULT_REALM)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human readable ones.
    pub log_json: bool,

    /// Record request metrics and serve them at `/metrics`.
    pub enable_metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            enable_metrics: false,
        }
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
