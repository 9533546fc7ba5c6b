//! Shared fixtures for unit tests.

use std::path::{Path, PathBuf};

use rcgen::{BasicConstraints, CertificateParams, IsCa, KeyPair};

use crate::http_client::PinnedHttpClient;
use crate::paths::{KEYSTORE_DIR, RESOURCES_DIR, TrustAnchorConfig};
use crate::tls::CertificateAgentFactory;

/// Self-signed CA certificate in PEM form.
pub(crate) fn ca_pem(name: &str) -> String {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(vec![name.to_string()]).unwrap();
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.self_signed(&key).unwrap().pem()
}

/// Write a one-certificate bundle into `dir` and return its path.
pub(crate) fn write_ca_bundle(dir: &Path, file_name: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, ca_pem("test-ca.local")).unwrap();
    path
}

pub(crate) fn anchor_config(path: PathBuf) -> TrustAnchorConfig {
    TrustAnchorConfig {
        resources_dir: RESOURCES_DIR.to_string(),
        keystore_dir: KEYSTORE_DIR.to_string(),
        certificate_file: path,
    }
}

/// Client pinned to a throwaway CA; fine for requests that never reach the network.
pub(crate) fn offline_client(dir: &Path) -> PinnedHttpClient {
    let bundle = write_ca_bundle(dir, "offline.pem");
    let context = CertificateAgentFactory::build_context(&anchor_config(bundle)).unwrap();
    PinnedHttpClient::new(context).unwrap()
}
