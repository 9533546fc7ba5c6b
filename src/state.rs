use std::path::{Path, PathBuf};

use crate::commands::MakeRequestCommand;
use crate::config::Settings;
use crate::error::Result;
use crate::http_client::{PinnedHttpClient, RequestSpec};
use crate::tls::CertificateAgentFactory;

/// Everything built at activation and released at deactivation.
///
/// The pinned client (and the TLS context it owns) is created exactly once in
/// [`AppState::activate`]; there is no lazily initialised global.
#[derive(Debug)]
pub struct AppState {
    settings: Settings,
    install_root: PathBuf,
    client: PinnedHttpClient,
}

impl AppState {
    /// Build the pinned client from settings. Fails if the trust anchor
    /// cannot be loaded; nothing is partially initialised in that case.
    pub fn activate(settings: Settings, install_root: &Path) -> Result<Self> {
        let factory = CertificateAgentFactory::from_settings(install_root, &settings);
        let client = factory.create_http_client(settings.request_timeout())?;
        tracing::info!(
            certificate = %client.context().certificate_file().display(),
            timeout_secs = settings.request_timeout_secs,
            "Activated pinned HTTPS client"
        );
        Ok(Self {
            settings,
            install_root: install_root.to_path_buf(),
            client,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn client(&self) -> &PinnedHttpClient {
        &self.client
    }

    /// Command fetching the configured endpoint.
    pub fn make_request_command(&self) -> MakeRequestCommand<'_> {
        MakeRequestCommand::new(&self.client, RequestSpec::get(&self.settings.endpoint))
    }

    /// Release the client, its connection pool and TLS context.
    pub fn deactivate(self) {
        tracing::info!(
            certificate = %self.client.context().certificate_file().display(),
            "Deactivated pinned HTTPS client"
        );
        drop(self);
    }
}
