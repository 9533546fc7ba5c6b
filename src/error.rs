//! Error taxonomy for certificate loading and pinned requests.
//!
//! Factory-time variants (`CertificateNotFound`, `CertificateLoadFailed`,
//! `InvalidContext`) are terminal for the client being built. Everything else
//! is scoped to a single request and the caller may simply issue a new one.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the certificate factory and the pinned HTTP client.
#[derive(Debug, Error)]
pub enum ClientError {
    // --- Trust anchor ---
    #[error("certificate file not found at: {}", .0.display())]
    CertificateNotFound(PathBuf),

    #[error("failed to initialize HTTPS client with certificates: {0}")]
    CertificateLoadFailed(String),

    #[error("HTTPS client requires a valid TLS context: {0}")]
    InvalidContext(String),

    // --- Per request ---
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("request error: {0}")]
    TransportError(#[source] reqwest::Error),

    #[error("Request failed with status code {status} - {message}")]
    HttpStatusError { status: u16, message: String },

    #[error("Failed to process response data: {0}")]
    ResponseDecodeError(#[source] serde_json::Error),
}

impl ClientError {
    /// True for failures that invalidate the whole client rather than one request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::CertificateNotFound(_) | Self::CertificateLoadFailed(_) | Self::InvalidContext(_)
        )
    }

    /// Short machine-readable tag for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CertificateNotFound(_) => "certificate_not_found",
            Self::CertificateLoadFailed(_) => "certificate_load_failed",
            Self::InvalidContext(_) => "invalid_context",
            Self::InvalidUrl(_) => "invalid_url",
            Self::TransportError(_) => "transport",
            Self::HttpStatusError { .. } => "http_status",
            Self::ResponseDecodeError(_) => "response_decode",
        }
    }
}

/// Result type alias using [`ClientError`].
pub type Result<T> = std::result::Result<T, ClientError>;
