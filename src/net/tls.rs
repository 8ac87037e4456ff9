//! TLS certificate loading.

use axum_server::tls_rustls::RustlsConfig;
use std::io::{Error, ErrorKind};
use std::path::Path;

use crate::config::CertificateConfig;
use crate::error::StartupError;

/// Load the PEM certificate chain and key named in configuration.
pub async fn load_tls_config(certs: &CertificateConfig) -> Result<RustlsConfig, StartupError> {
    let cert_path = Path::new(&certs.cert_path);
    let key_path = Path::new(&certs.key_path);

    for (kind, path) in [("Certificate", cert_path), ("Private key", key_path)] {
        if !path.exists() {
            return Err(StartupError::Tls(Error::new(
                ErrorKind::NotFound,
                format!("{kind} file not found: {}", path.display()),
            )));
        }
    }

    let config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(StartupError::Tls)?;
    tracing::info!(cert = %cert_path.display(), "TLS certificates loaded");
    Ok(config)
}
