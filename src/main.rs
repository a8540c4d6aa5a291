//! Chart repository HTTP gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net (TCP / TLS)
//!                       │
//!                       ▼
//!                     http server (request ID, trace span, body limit, metrics)
//!                       │
//!                       ▼
//!                     routing (context path, namespace depth, first match)
//!                       │  no match → 404 {"error":"not found"}
//!                       ▼
//!                     security (None / Basic / Bearer)
//!                       │  denied → 401 {"error":"unauthorized"} + WWW-Authenticate
//!                       ▼
//!                     route handler
//! ```

use std::process::ExitCode;

use clap::Parser;

use chart_gateway::config::CliArgs;
use chart_gateway::http::default_routes;
use chart_gateway::lifecycle::{start, Shutdown};
use chart_gateway::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config_path = args.config.clone();
    let (config, load_error) = args.resolve();

    logging::init(&config.observability);
    if let Some(e) = load_error {
        tracing::error!(
            path = ?config_path.unwrap_or_default(),
            error = %e,
            "Failed to load configuration"
        );
        return ExitCode::FAILURE;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "chart-gateway starting");

    let shutdown = Shutdown::new();
    shutdown.listen_for_signals();

    match start(&config, default_routes(), shutdown.subscribe()).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
