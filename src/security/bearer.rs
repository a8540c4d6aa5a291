//! Bearer token validation.
//!
//! # Responsibilities
//! - Load the token issuer's public key once at startup
//! - Verify signature, issuer, audience (service) and expiry
//! - Check the `access` claim grants the requested action on the repository
//! - Build the `WWW-Authenticate: Bearer ...` challenge
//!
//! # Design Decisions
//! - Algorithm comes from the token header but must belong to the key's family
//! - Token claims follow the registry token format: `access: [{type, name, actions}]`

use std::path::{Path, PathBuf};

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::Action;

/// Resource type carried in token access entries.
pub const ACCESS_TYPE: &str = "artifact-repository";

/// Repository name used in token scopes when no namespace is bound (depth 0).
pub const DEFAULT_NAMESPACE: &str = "repo";

fn scope_name(repo: &str) -> &str {
    if repo.is_empty() {
        DEFAULT_NAMESPACE
    } else {
        repo
    }
}

/// Error loading the public key.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to read auth public key {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("auth public key {path:?} is not a PEM encoded RSA or EC public key")]
    Unsupported { path: PathBuf },
}

/// Why a presented token was rejected.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("missing bearer token")]
    Missing,

    #[error("token algorithm {0:?} does not match the configured key")]
    Algorithm(Algorithm),

    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("token does not grant {action} on repository {repo:?}")]
    InsufficientScope { action: Action, repo: String },
}

impl TokenError {
    /// RFC 6750 `error` attribute for the challenge, if any.
    fn challenge_error(&self) -> Option<&'static str> {
        match self {
            TokenError::Missing => None,
            TokenError::Algorithm(_) | TokenError::Invalid(_) => Some("invalid_token"),
            TokenError::InsufficientScope { .. } => Some("insufficient_scope"),
        }
    }
}

/// One grant inside the `access` claim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccessEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl AccessEntry {
    fn grants(&self, action: Action, repo: &str) -> bool {
        self.kind == ACCESS_TYPE
            && self.name == repo
            && self.actions.iter().any(|a| a == action.scope() || a == "*")
    }
}

/// Claims we read beyond the registered ones validated by `jsonwebtoken`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default)]
    pub access: Vec<AccessEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
    Rsa,
    Ec,
}

impl KeyFamily {
    fn algorithms(self) -> &'static [Algorithm] {
        match self {
            KeyFamily::Rsa => &[
                Algorithm::RS256,
                Algorithm::RS384,
                Algorithm::RS512,
                Algorithm::PS256,
                Algorithm::PS384,
                Algorithm::PS512,
            ],
            KeyFamily::Ec => &[Algorithm::ES256, Algorithm::ES384],
        }
    }
}

/// Token auth settings plus the decoded public key.
#[derive(Clone)]
pub struct BearerAuth {
    realm: String,
    service: String,
    issuer: String,
    key: DecodingKey,
    family: KeyFamily,
}

impl BearerAuth {
    /// Build from PEM bytes. Returns `None` if the PEM is neither an RSA nor an EC public key.
    pub fn from_pem(
        realm: impl Into<String>,
        service: impl Into<String>,
        issuer: impl Into<String>,
        public_key_pem: &[u8],
    ) -> Option<Self> {
        let (key, family) = DecodingKey::from_rsa_pem(public_key_pem)
            .map(|k| (k, KeyFamily::Rsa))
            .or_else(|_| DecodingKey::from_ec_pem(public_key_pem).map(|k| (k, KeyFamily::Ec)))
            .ok()?;
        Some(Self {
            realm: realm.into(),
            service: service.into(),
            issuer: issuer.into(),
            key,
            family,
        })
    }

    /// Load the public key from `path`.
    pub fn from_file(
        realm: impl Into<String>,
        service: impl Into<String>,
        issuer: impl Into<String>,
        path: &Path,
    ) -> Result<Self, KeyError> {
        let pem = std::fs::read(path).map_err(|source| KeyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let auth = Self::from_pem(realm, service, issuer, &pem)
            .ok_or_else(|| KeyError::Unsupported { path: path.to_path_buf() })?;
        tracing::info!(path = ?path, family = ?auth.family, "Loaded token public key");
        Ok(auth)
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Validate the `Authorization` header value for `action` on `repo`.
    pub fn verify(&self, authorization: Option<&str>, action: Action, repo: &str) -> Result<TokenClaims, TokenError> {
        let repo = scope_name(repo);
        let token = authorization.and_then(bearer_token).ok_or(TokenError::Missing)?;

        let header = decode_header(token)?;
        if !self.family.algorithms().contains(&header.alg) {
            return Err(TokenError::Algorithm(header.alg));
        }

        let mut validation = Validation::new(header.alg);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.service]);

        let claims = decode::<TokenClaims>(token, &self.key, &validation)?.claims;
        if claims.access.iter().any(|entry| entry.grants(action, repo)) {
            Ok(claims)
        } else {
            Err(TokenError::InsufficientScope {
                action,
                repo: repo.to_string(),
            })
        }
    }

    /// `WWW-Authenticate` value telling the client where to get a token for this request.
    pub fn challenge(&self, action: Action, repo: &str, error: Option<&TokenError>) -> String {
        let mut value = format!(
            "Bearer realm=\"{}\",service=\"{}\",scope=\"{}:{}:{}\"",
            self.realm,
            self.service,
            ACCESS_TYPE,
            scope_name(repo),
            action.scope()
        );
        if let Some(code) = error.and_then(TokenError::challenge_error) {
            value.push_str(&format!(",error=\"{code}\""));
        }
        value
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("realm", &self.realm)
            .field("service", &self.service)
            .field("issuer", &self.issuer)
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
