//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Pick human readable or JSON output
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level

use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Default filter directive for a configured level.
pub fn default_filter(level: &str) -> String {
    format!("chart_gateway={level},tower_http={level}")
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(config: &ObservabilityConfig) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_filter(&config.log_level)))
            .unwrap_or_else(|_| EnvFilter::new(default_filter("info")));

        // A subscriber installed by an embedding application takes precedence.
        let registry = tracing_subscriber::registry().with(filter);
        let _ = if config.log_json {
            registry
                .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
                .try_init()
        } else {
            registry.with(tracing_subscriber::fmt::layer()).try_init()
        };
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_targets_crate_and_http_layer() {
        assert_eq!(default_filter("debug"), "chart_gateway=debug,tower_http=debug");
        assert!(EnvFilter::try_new(default_filter("warn")).is_ok());
    }
}
