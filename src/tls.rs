//! Pinned TLS context construction.
//!
//! Builds a `rustls::ClientConfig` whose root store holds only the
//! certificates from the configured PEM bundle. The platform trust store is
//! never consulted, and peer verification cannot be switched off.
//!
//! The protocol range is rustls' safe default (TLS 1.2 and 1.3).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rustls::RootCertStore;
use rustls::pki_types::CertificateDer;
use rustls::pki_types::pem::PemObject;

use crate::config::Settings;
use crate::error::{ClientError, Result};
use crate::http_client::PinnedHttpClient;
use crate::paths::{self, TrustAnchorConfig};

/// Loaded trust anchors plus the connection policy the client is built with.
///
/// Only [`CertificateAgentFactory::build_context`] produces one, so holding a
/// context means the bundle was read and parsed successfully.
#[derive(Clone)]
pub struct TlsClientContext {
    config: Arc<rustls::ClientConfig>,
    certificate_file: PathBuf,
    anchor_count: usize,
    keep_alive: bool,
}

impl TlsClientContext {
    /// The PEM bundle this context was loaded from.
    pub fn certificate_file(&self) -> &Path {
        &self.certificate_file
    }

    /// Number of certificates in the pinned root store.
    pub fn anchor_count(&self) -> usize {
        self.anchor_count
    }

    /// Whether idle connections are kept for reuse.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Set whether idle connections are pooled. On by default.
    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub(crate) fn rustls_config(&self) -> &rustls::ClientConfig {
        &self.config
    }
}

impl std::fmt::Debug for TlsClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsClientContext")
            .field("certificate_file", &self.certificate_file)
            .field("anchor_count", &self.anchor_count)
            .field("keep_alive", &self.keep_alive)
            .finish_non_exhaustive()
    }
}

/// Resolves the trust anchor from configuration and turns it into a client.
///
/// A failure here is terminal: there is no fallback to an unpinned transport.
/// Build a new factory to retry (e.g. after fixing the certificate file).
#[derive(Debug, Clone)]
pub struct CertificateAgentFactory {
    install_root: PathBuf,
    override_path: Option<String>,
    keep_alive: bool,
}

impl CertificateAgentFactory {
    pub fn new(install_root: impl Into<PathBuf>, override_path: Option<String>) -> Self {
        Self {
            install_root: install_root.into(),
            override_path,
            keep_alive: true,
        }
    }

    pub fn from_settings(install_root: impl Into<PathBuf>, settings: &Settings) -> Self {
        Self::new(
            install_root,
            settings.certificate_override().map(str::to_string),
        )
        .with_keep_alive(settings.keep_alive)
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn resolve_config(&self) -> TrustAnchorConfig {
        paths::resolve_config(&self.install_root, self.override_path.as_deref())
    }

    /// Load the bundle at `config.certificate_file` and build the pinned context.
    pub fn build_context(config: &TrustAnchorConfig) -> Result<TlsClientContext> {
        let path = &config.certificate_file;
        if !path.exists() {
            tracing::error!(path = %path.display(), "Certificate file not found");
            return Err(ClientError::CertificateNotFound(path.clone()));
        }

        let pem = std::fs::read(path).map_err(|e| {
            ClientError::CertificateLoadFailed(format!("failed to read {}: {e}", path.display()))
        })?;
        let roots = load_trust_anchors(&pem, path)?;
        let anchor_count = roots.len();

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let tls = rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| ClientError::CertificateLoadFailed(format!("TLS version config: {e}")))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        tracing::info!(
            path = %path.display(),
            certificates = anchor_count,
            "Loaded pinned trust anchors"
        );

        Ok(TlsClientContext {
            config: Arc::new(tls),
            certificate_file: path.clone(),
            anchor_count,
            keep_alive: true,
        })
    }

    /// Resolve, load and wrap in a [`PinnedHttpClient`] in one step.
    pub fn create_http_client(&self, default_timeout: Option<Duration>) -> Result<PinnedHttpClient> {
        let config = self.resolve_config();
        let context = Self::build_context(&config)?.with_keep_alive(self.keep_alive);
        Ok(PinnedHttpClient::new(context)?.with_default_timeout(default_timeout))
    }
}

/// Parse every `CERTIFICATE` block of a PEM bundle into a fresh root store.
fn load_trust_anchors(pem: &[u8], path: &Path) -> Result<RootCertStore> {
    let mut roots = RootCertStore::empty();
    for cert in CertificateDer::pem_slice_iter(pem) {
        let cert = cert.map_err(|e| {
            ClientError::CertificateLoadFailed(format!(
                "invalid PEM data in {}: {e:?}",
                path.display()
            ))
        })?;
        roots.add(cert).map_err(|e| {
            ClientError::CertificateLoadFailed(format!(
                "unusable certificate in {}: {e}",
                path.display()
            ))
        })?;
    }

    if roots.is_empty() {
        return Err(ClientError::CertificateLoadFailed(format!(
            "No certificates found in file: {}",
            path.display()
        )));
    }
    Ok(roots)
}
