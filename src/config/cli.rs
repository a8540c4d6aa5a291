//! Command line flags.
//!
//! Every flag is optional; a flag that is given overrides the matching
//! config file value.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::GatewayConfig;

#[derive(Debug, Parser)]
#[command(name = "chart-gateway")]
#[command(about = "HTTP front end for a chart repository", long_about = None)]
#[command(version)]
pub struct CliArgs {
    /// TOML config file
    #[arg(short, long, env = "CHART_GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// URL prefix stripped before route matching (e.g. /charts)
    #[arg(long)]
    pub context_path: Option<String>,

    /// Number of path segments naming a repository
    #[arg(long)]
    pub depth: Option<usize>,

    /// Basic auth username
    #[arg(long)]
    pub basic_auth_user: Option<String>,

    /// Basic auth password
    #[arg(long, env = "CHART_GATEWAY_BASIC_AUTH_PASS", hide_env_values = true)]
    pub basic_auth_pass: Option<String>,

    /// Allow unauthenticated GET/HEAD on pull routes
    #[arg(long)]
    pub auth_anonymous_get: bool,

    /// Enable bearer token auth
    #[arg(long)]
    pub bearer_auth: bool,

    /// Token auth type (only "token" is supported)
    #[arg(long)]
    pub auth_type: Option<String>,

    /// Token service URL announced in challenges
    #[arg(long)]
    pub auth_realm: Option<String>,

    /// Service name tokens must be issued for
    #[arg(long)]
    pub auth_service: Option<String>,

    /// Expected token issuer
    #[arg(long)]
    pub auth_issuer: Option<String>,

    /// Token issuer public key (PEM)
    #[arg(long)]
    pub auth_cert_path: Option<String>,

    /// TLS certificate (PEM)
    #[arg(long)]
    pub tls_cert: Option<String>,

    /// TLS private key (PEM)
    #[arg(long)]
    pub tls_key: Option<String>,

    /// Maximum request body size in bytes
    #[arg(long)]
    pub max_upload_size: Option<usize>,

    /// Serve Prometheus metrics at /metrics
    #[arg(long)]
    pub enable_metrics: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    pub log_json: bool,
}

impl CliArgs {
    /// File values (when `--config` is given) overlaid with the flags.
    ///
    /// A file that fails to load is returned as the error alongside a config built from the
    /// flags alone, so logging can be set up before the error is reported.
    pub fn resolve(self) -> (GatewayConfig, Option<ConfigError>) {
        let (mut config, error) = match self.config.as_deref().map(read_config).transpose() {
            Ok(config) => (config.unwrap_or_default(), None),
            Err(e) => (GatewayConfig::default(), Some(e)),
        };
        self.apply(&mut config);
        (config, error)
    }

    /// Overlay the flags that were given onto `config`.
    pub fn apply(self, config: &mut GatewayConfig) {
        let server = &mut config.server;
        set(&mut server.port, self.port);
        set(&mut server.context_path, self.context_path);
        set(&mut server.max_upload_size, self.max_upload_size);
        replace(&mut server.tls_cert, self.tls_cert);
        replace(&mut server.tls_key, self.tls_key);

        set(&mut config.repository.depth, self.depth);

        let auth = &mut config.auth;
        replace(&mut auth.username, self.basic_auth_user);
        replace(&mut auth.password, self.basic_auth_pass);
        replace(&mut auth.auth_type, self.auth_type);
        replace(&mut auth.realm, self.auth_realm);
        replace(&mut auth.service, self.auth_service);
        replace(&mut auth.issuer, self.auth_issuer);
        replace(&mut auth.cert_path, self.auth_cert_path);
        auth.anonymous_get |= self.auth_anonymous_get;
        auth.bearer_auth |= self.bearer_auth;

        let observability = &mut config.observability;
        set(&mut observability.log_level, self.log_level);
        observability.log_json |= self.log_json;
        observability.enable_metrics |= self.enable_metrics;
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn replace<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}
