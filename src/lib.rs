pub mod app_logger;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod http_client;
pub mod paths;
pub mod presenter;
pub mod state;
pub mod tls;

#[cfg(test)]
pub(crate) mod test_support;

use std::process::ExitCode;

use anyhow::Context;

pub use cli::Cli;
pub use commands::MakeRequestCommand;
pub use config::Settings;
pub use error::{ClientError, Result};
pub use http_client::{Method, PinnedHttpClient, RequestSpec};
pub use paths::{ResourcePaths, TrustAnchorConfig};
pub use presenter::{PanelPresenter, ResponseHandler, ResponsePanel, TerminalPresenter};
pub use state::AppState;
pub use tls::{CertificateAgentFactory, TlsClientContext};

use crate::cli::CliPresenter;

/// Activate, fetch once, present the outcome, deactivate.
///
/// Returns `ExitCode::FAILURE` when activation or the request was rejected;
/// the rejection itself has already been reported through the presenter.
pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings = cli.apply_to(config::load_settings());
    if cli.save_settings {
        config::save_settings(&settings)
            .map_err(anyhow::Error::msg)
            .context("Failed to save settings")?;
        tracing::info!(dir = %config::config_dir().display(), "Saved settings");
    }

    let install_root = cli.install_root.clone().unwrap_or_else(paths::install_root);
    let request = cli.request_spec(&settings.endpoint)?;
    let mut presenter = CliPresenter::new(TerminalPresenter::stdio(), cli.html_out.is_some());

    let resolved = match AppState::activate(settings, &install_root) {
        Ok(state) => {
            let resolved = MakeRequestCommand::new(state.client(), request).execute(&mut presenter).await;
            state.deactivate();
            resolved
        }
        Err(e) => {
            tracing::error!(install_root = %install_root.display(), "Activation failed: {e}");
            presenter.handle_error(&e);
            false
        }
    };

    if let (Some(path), Some(html)) = (cli.html_out.as_ref(), presenter.panel_html()) {
        std::fs::write(path, html)
            .with_context(|| format!("Failed to write response panel to {}", path.display()))?;
    }

    Ok(if resolved { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
