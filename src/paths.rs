//! Trust-anchor path resolution.
//!
//! The bundled certificate ships next to the executable under
//! `<install_root>/resources/keystore/combined-certificates.pem`. A non-empty
//! override from settings replaces that path verbatim.

use std::path::{Path, PathBuf};

pub const RESOURCES_DIR: &str = "resources";
pub const KEYSTORE_DIR: &str = "keystore";
pub const DEFAULT_CERTIFICATE_FILE: &str = "combined-certificates.pem";

/// Where the trust anchor lives. Built once per factory invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchorConfig {
    pub resources_dir: String,
    pub keystore_dir: String,
    pub certificate_file: PathBuf,
}

/// Resolve the trust-anchor location.
///
/// The override is not checked for existence here; that happens when the
/// TLS context is built.
pub fn resolve_config(install_root: &Path, override_path: Option<&str>) -> TrustAnchorConfig {
    let certificate_file = match override_path {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => ResourcePaths::new(install_root).certificate_path(),
    };
    TrustAnchorConfig {
        resources_dir: RESOURCES_DIR.to_string(),
        keystore_dir: KEYSTORE_DIR.to_string(),
        certificate_file,
    }
}

/// Directories of the bundled resources under an install root.
#[derive(Debug, Clone)]
pub struct ResourcePaths {
    install_root: PathBuf,
}

impl ResourcePaths {
    pub fn new(install_root: &Path) -> Self {
        Self {
            install_root: install_root.to_path_buf(),
        }
    }

    pub fn resources_path(&self) -> PathBuf {
        self.install_root.join(RESOURCES_DIR)
    }

    pub fn keystore_path(&self) -> PathBuf {
        self.resources_path().join(KEYSTORE_DIR)
    }

    pub fn certificate_path(&self) -> PathBuf {
        self.keystore_path().join(DEFAULT_CERTIFICATE_FILE)
    }
}

/// Install root of the running binary: the directory holding the executable.
/// Falls back to the working directory when the executable path is unknown.
pub fn install_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
