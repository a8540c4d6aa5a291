//! HTTP Basic credential checking.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Precomputed `Authorization` header value for the configured user.
#[derive(Clone)]
pub struct BasicCredentials {
    expected: String,
}

impl BasicCredentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            expected: basic_auth_header(username, password),
        }
    }

    /// Compare a presented `Authorization` value against the expected one.
    pub fn verify(&self, presented: Option<&str>) -> bool {
        presented.is_some_and(|value| constant_time_eq(value.as_bytes(), self.expected.as_bytes()))
    }
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials").finish_non_exhaustive()
    }
}

/// `Basic base64(username:password)`.
pub fn basic_auth_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
