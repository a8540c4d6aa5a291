//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the auth policy is complete and unambiguous
//! - Check TLS material is configured both-or-neither
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::{non_empty, GatewayConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("bearer auth requires {0}")]
    MissingBearerSetting(&'static str),

    #[error("invalid auth type {0:?}: only \"token\" is supported")]
    InvalidAuthType(String),

    #[error("basic auth requires both username and password")]
    IncompleteBasicAuth,

    #[error("basic auth and bearer auth are mutually exclusive")]
    ConflictingAuth,

    #[error("tls_cert and tls_key must be set together")]
    IncompleteTls,

    #[error("context path {0:?} must start with '/'")]
    InvalidContextPath(String),

    #[error("max_upload_size must be greater than zero")]
    ZeroUploadSize,
}

/// Check every semantic rule and report all violations.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let auth = &config.auth;

    if auth.bearer_auth {
        for (value, name) in [
            (&auth.realm, "auth realm"),
            (&auth.service, "auth service"),
            (&auth.issuer, "auth issuer"),
            (&auth.cert_path, "auth public cert path"),
        ] {
            if non_empty(value).is_none() {
                errors.push(ValidationError::MissingBearerSetting(name));
            }
        }
        match auth.auth_type.as_deref() {
            Some("token") => {}
            other => errors.push(ValidationError::InvalidAuthType(other.unwrap_or_default().to_string())),
        }
    }

    let has_user = non_empty(&auth.username).is_some();
    let has_pass = non_empty(&auth.password).is_some();
    if has_user != has_pass {
        errors.push(ValidationError::IncompleteBasicAuth);
    }
    if auth.bearer_auth && (has_user || has_pass) {
        errors.push(ValidationError::ConflictingAuth);
    }

    let server = &config.server;
    if non_empty(&server.tls_cert).is_some() != non_empty(&server.tls_key).is_some() {
        errors.push(ValidationError::IncompleteTls);
    }
    if !server.context_path.is_empty() && !server.context_path.starts_with('/') {
        errors.push(ValidationError::InvalidContextPath(server.context_path.clone()));
    }
    if server.max_upload_size == 0 {
        errors.push(ValidationError::ZeroUploadSize);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
