//! TLS configuration and certificate loading.
//!
//! # Responsibilities
//! - Check that the certificate and key files exist and hold PEM material
//! - Build the rustls server configuration
//!
//! # Design Decisions
//! - Files are checked up front so a bad path reports which file is wrong
//! - Any failure here is fatal at startup

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificates found in {}", .0.display())]
    NoCertificates(PathBuf),

    #[error("no private key found in {}", .0.display())]
    NoPrivateKey(PathBuf),

    #[error("invalid TLS configuration: {0}")]
    Config(#[source] std::io::Error),
}

/// Check that `cert_path` holds at least one certificate and `key_path` a private key.
pub fn validate_pem_files(cert_path: &Path, key_path: &Path) -> Result<usize, TlsError> {
    let mut reader = open(cert_path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Io {
            path: cert_path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(cert_path.to_path_buf()));
    }

    let mut reader = open(key_path)?;
    let key = rustls_pemfile::private_key(&mut reader).map_err(|source| TlsError::Io {
        path: key_path.to_path_buf(),
        source,
    })?;
    if key.is_none() {
        return Err(TlsError::NoPrivateKey(key_path.to_path_buf()));
    }

    Ok(certs.len())
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    let chain_len = validate_pem_files(cert_path, key_path)?;
    let config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(TlsError::Config)?;

    tracing::info!(
        cert = %cert_path.display(),
        key = %key_path.display(),
        chain_len,
        "TLS configuration loaded"
    );
    Ok(config)
}

fn open(path: &Path) -> Result<BufReader<File>, TlsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::Io {
            path: path.to_path_buf(),
            source,
        })
}
