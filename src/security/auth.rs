//! Authorization decisions for matched routes.
//!
//! # Responsibilities
//! - Hold the single process-wide auth policy
//! - Decide authorized/denied per request, statelessly
//! - Produce the response headers for the challenge protocol
//!
//! # State Transitions
//! ```text
//! Unchecked → Authorized: action is SystemInfo
//! Unchecked → Authorized: policy is None
//! Unchecked → Authorized: Basic + anonymous_get + RepoPull + GET/HEAD
//! Unchecked → Authorized | Denied: credential check (Basic digest or Bearer token)
//! ```
//!
//! # Design Decisions
//! - Pure function of (action, policy, request); no I/O, no shared mutable state
//! - Headers are returned with the verdict and applied before it is inspected

use std::path::Path;

use axum::http::header::{AUTHORIZATION, VARY, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, HeaderValue, Method};

use crate::config::AuthConfig;
use crate::routing::Action;
use crate::security::basic::BasicCredentials;
use crate::security::bearer::{BearerAuth, KeyError};

/// The active authentication policy.
#[derive(Debug, Clone)]
pub enum AuthPolicy {
    /// No authentication; every request is authorized.
    None,
    /// Static username/password, optionally with anonymous reads.
    Basic {
        credentials: BasicCredentials,
        realm: String,
        anonymous_get: bool,
    },
    /// Signed bearer tokens from an external token service.
    Bearer(BearerAuth),
}

impl AuthPolicy {
    /// Build the policy from validated configuration, loading the token key if needed.
    pub fn from_config(config: &AuthConfig) -> Result<Self, KeyError> {
        if config.bearer_auth {
            if config.anonymous_get {
                tracing::warn!("anonymous_get has no effect with bearer auth");
            }
            let path = config.cert_path.as_deref().unwrap_or_default();
            let bearer = BearerAuth::from_file(
                config.realm.clone().unwrap_or_default(),
                config.service.clone().unwrap_or_default(),
                config.issuer.clone().unwrap_or_default(),
                Path::new(path),
            )?;
            return Ok(AuthPolicy::Bearer(bearer));
        }

        Ok(match config.basic_credentials() {
            Some((username, password)) => AuthPolicy::Basic {
                credentials: BasicCredentials::new(username, password),
                realm: config.basic_realm().to_string(),
                anonymous_get: config.anonymous_get,
            },
            None => AuthPolicy::None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuthPolicy::None => "none",
            AuthPolicy::Basic { .. } => "basic",
            AuthPolicy::Bearer(_) => "bearer",
        }
    }
}

/// The parts of a request the engine looks at.
#[derive(Debug, Clone, Copy)]
pub struct AuthRequest<'a> {
    pub method: &'a Method,
    pub authorization: Option<&'a str>,
    /// Repository namespace the request targets (empty when depth is zero).
    pub repo: &'a str,
}

impl<'a> AuthRequest<'a> {
    pub fn new(method: &'a Method, headers: &'a HeaderMap, repo: &'a str) -> Self {
        Self {
            method,
            authorization: headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            repo,
        }
    }

    fn is_read(&self) -> bool {
        *self.method == Method::GET || *self.method == Method::HEAD
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Default)]
pub struct AuthVerdict {
    pub authorized: bool,
    pub headers: HeaderMap,
}

impl AuthVerdict {
    fn allow() -> Self {
        Self {
            authorized: true,
            headers: HeaderMap::new(),
        }
    }

    fn credentialed(authorized: bool) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(VARY, HeaderValue::from_static("Authorization"));
        Self { authorized, headers }
    }

    fn deny(challenge: &str) -> Self {
        let mut verdict = Self::credentialed(false);
        match HeaderValue::from_str(challenge) {
            Ok(value) => {
                verdict.headers.insert(WWW_AUTHENTICATE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Challenge is not a valid header value"),
        }
        verdict
    }

    /// Copy the verdict headers onto a response.
    ///
    /// `Vary` is merged with whatever the response already varies on; other headers replace.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            if name == VARY {
                if !varies_on(headers, value) {
                    headers.append(VARY, value.clone());
                }
            } else {
                headers.insert(name.clone(), value.clone());
            }
        }
    }
}

fn varies_on(headers: &HeaderMap, field: &HeaderValue) -> bool {
    let Ok(field) = field.to_str() else {
        return false;
    };
    headers
        .get_all(VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|existing| existing.trim().eq_ignore_ascii_case(field) || existing.trim() == "*")
}

/// Decide whether `request` may perform `action` under `policy`.
pub fn authorize(action: Action, policy: &AuthPolicy, request: &AuthRequest<'_>) -> AuthVerdict {
    if !action.requires_authorization() {
        return AuthVerdict::allow();
    }

    match policy {
        AuthPolicy::None => AuthVerdict::allow(),
        AuthPolicy::Basic {
            credentials,
            realm,
            anonymous_get,
        } => {
            if *anonymous_get && action == Action::RepoPull && request.is_read() {
                return AuthVerdict::credentialed(true);
            }
            if credentials.verify(request.authorization) {
                AuthVerdict::credentialed(true)
            } else {
                tracing::debug!(%action, repo = %request.repo, "Basic credentials rejected");
                AuthVerdict::deny(&format!("Basic realm=\"{realm}\""))
            }
        }
        AuthPolicy::Bearer(bearer) => match bearer.verify(request.authorization, action, request.repo) {
            Ok(claims) => {
                tracing::debug!(%action, repo = %request.repo, subject = ?claims.sub, "Bearer token accepted");
                AuthVerdict::credentialed(true)
            }
            Err(e) => {
                tracing::debug!(%action, repo = %request.repo, error = %e, "Bearer token rejected");
                AuthVerdict::deny(&bearer.challenge(action, request.repo, Some(&e)))
            }
        },
    }
}
