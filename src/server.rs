//! Webhook HTTP(S) server

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use tracing::info;

use crate::webhook::{webhook_router, WebhookState};
use crate::{Error, Result, DEFAULT_WEBHOOK_PORT};

/// PEM files for the serving certificate
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlsFiles {
    /// Certificate chain PEM
    pub cert_path: PathBuf,
    /// Private key PEM
    pub key_path: PathBuf,
}

/// Server configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the server
    pub addr: SocketAddr,
    /// Serve HTTPS with these files; plain HTTP when `None`
    pub tls: Option<TlsFiles>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_WEBHOOK_PORT)),
            tls: None,
        }
    }
}

impl ServerConfig {
    /// Build a config from optional cert/key paths, which must be given together
    pub fn new(
        addr: SocketAddr,
        cert_path: Option<PathBuf>,
        key_path: Option<PathBuf>,
    ) -> Result<Self> {
        let tls = match (cert_path, key_path) {
            (Some(cert_path), Some(key_path)) => Some(TlsFiles {
                cert_path,
                key_path,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(Error::config("TLS certificate given without a key")),
            (None, Some(_)) => return Err(Error::config("TLS key given without a certificate")),
        };
        Ok(Self { addr, tls })
    }
}

/// Serve the webhook until the server fails
///
/// The API server only calls webhooks over HTTPS; plain HTTP is for local
/// testing behind a TLS-terminating proxy.
pub async fn serve(config: ServerConfig, state: Arc<WebhookState>) -> Result<()> {
    let app = webhook_router(state);

    match config.tls {
        Some(tls) => {
            let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .map_err(|e| Error::config(format!("TLS config error: {}", e)))?;

            info!(addr = %config.addr, "Starting mutating webhook server (https)");
            axum_server::bind_rustls(config.addr, tls_config)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(config.addr).await?;
            info!(addr = %config.addr, "Starting mutating webhook server (http)");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
