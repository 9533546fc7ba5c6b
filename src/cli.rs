//! Command-line front end.
//!
//! Flags override the persisted [`Settings`]; anything left unset falls back
//! to the settings file, then to built-in defaults.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde_json::Value;

use crate::config::Settings;
use crate::error::ClientError;
use crate::http_client::RequestSpec;
use crate::presenter::{PanelPresenter, ResponseHandler, TerminalPresenter};

pub const CERT_FILE_ENV: &str = "PINNED_FETCH_CERT_FILE";

#[derive(Parser, Debug, Default)]
#[command(
    name = "pinned-fetch",
    version,
    about = "Fetch an HTTPS URL trusting only a bundled certificate authority"
)]
pub struct Cli {
    #[arg(long, help = "URL to fetch (defaults to the configured endpoint)")]
    pub url: Option<String>,
    #[arg(long, value_name = "JSON", help = "Send a POST with this JSON body instead of a GET")]
    pub post: Option<String>,
    #[arg(long, env = CERT_FILE_ENV, value_name = "PATH", help = "PEM bundle overriding the bundled certificates")]
    pub cert_file: Option<String>,
    #[arg(long, value_name = "DIR", help = "Install root holding resources/keystore")]
    pub install_root: Option<PathBuf>,
    #[arg(long, value_name = "N", help = "Per-request deadline in seconds")]
    pub timeout_secs: Option<u64>,
    #[arg(long, value_name = "FILE", help = "Also write the response panel as HTML")]
    pub html_out: Option<PathBuf>,
    #[arg(long, default_value_t = false, help = "Close connections after each request")]
    pub no_keep_alive: bool,
    #[arg(long, default_value_t = false, help = "Persist the effective settings")]
    pub save_settings: bool,
    #[arg(short, long, default_value_t = false, help = "Debug-level logging")]
    pub verbose: bool,
}

impl Cli {
    /// Layer the flags that were given over `settings`.
    pub fn apply_to(&self, mut settings: Settings) -> Settings {
        if let Some(url) = &self.url {
            settings.endpoint = url.clone();
        }
        if let Some(path) = &self.cert_file {
            settings.certificate_file = path.clone();
        }
        if let Some(secs) = self.timeout_secs {
            settings.request_timeout_secs = Some(secs);
        }
        if self.no_keep_alive {
            settings.keep_alive = false;
        }
        settings
    }

    /// The request to issue against `endpoint`.
    pub fn request_spec(&self, endpoint: &str) -> anyhow::Result<RequestSpec> {
        let spec = match &self.post {
            Some(raw) => {
                let body: Value = serde_json::from_str(raw)
                    .map_err(|e| anyhow::anyhow!("--post is not valid JSON: {e}"))?;
                RequestSpec::post(endpoint, body)
            }
            None => RequestSpec::get(endpoint),
        };
        Ok(match self.timeout_secs {
            Some(secs) => spec.with_timeout(Duration::from_secs(secs)),
            None => spec,
        })
    }
}

/// Terminal output plus an optional HTML panel.
pub struct CliPresenter<O: Write, E: Write> {
    terminal: TerminalPresenter<O, E>,
    panel: Option<PanelPresenter>,
}

impl<O: Write, E: Write> CliPresenter<O, E> {
    pub fn new(terminal: TerminalPresenter<O, E>, with_panel: bool) -> Self {
        Self {
            terminal,
            panel: with_panel.then(PanelPresenter::new),
        }
    }

    /// Rendered panel document, if a panel was requested and has content.
    pub fn panel_html(&self) -> Option<&str> {
        self.panel.as_ref().and_then(|p| p.panel().html())
    }

    pub fn into_terminal(self) -> TerminalPresenter<O, E> {
        self.terminal
    }
}

impl<O: Write, E: Write> ResponseHandler for CliPresenter<O, E> {
    fn handle_success(&mut self, body: &str) {
        self.terminal.handle_success(body);
        if let Some(panel) = self.panel.as_mut() {
            panel.handle_success(body);
        }
    }

    fn handle_error(&mut self, error: &ClientError) {
        self.terminal.handle_error(error);
        if let Some(panel) = self.panel.as_mut() {
            panel.handle_error(error);
        }
    }
}
