use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file name inside [`config_dir`].
pub const SETTINGS_FILE: &str = "settings.json";

/// Endpoint fetched when no URL is given on the command line.
pub const DEFAULT_ENDPOINT: &str = "https://repo.maven.apache.org/maven2/org/apache/maven/plugins/maven-clean-plugin/2.5/maven-clean-plugin-2.5.pom";

/// Get the config directory using platform-appropriate location.
///
/// - macOS: `~/Library/Application Support/pinned-fetch/`
/// - Linux: `~/.config/pinned-fetch/` (or `$XDG_CONFIG_HOME`)
/// - Windows: `%APPDATA%/pinned-fetch/`
///
/// Falls back to `~/.pinned-fetch/` if platform dir is unavailable.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("pinned-fetch"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".pinned-fetch")
        })
}

/// Load a JSON config file from `dir`, returning Default if missing or corrupt.
/// A file that exists but cannot be read or parsed is logged.
pub fn load_json_config_from<T: DeserializeOwned + Default>(dir: &Path, filename: &str) -> T {
    let path = dir.join(filename);
    if !path.exists() {
        return T::default();
    }
    let content = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(path = %path.display(), "Could not read config: {e}");
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(path = %path.display(), "Corrupt config: {e}. Using defaults.");
            T::default()
        }
    }
}

/// Save a JSON config file atomically (temp file + rename).
/// Sets 0600 permissions on Unix.
pub fn save_json_config_in<T: Serialize>(dir: &Path, filename: &str, config: &T) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create config directory: {e}"))?;

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {e}"))?;

    let target = dir.join(filename);
    let temp = dir.join(format!("{}.tmp.{}", filename, std::process::id()));

    std::fs::write(&temp, &json)
        .map_err(|e| format!("Failed to write temp config: {e}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&temp, perms)
            .map_err(|e| format!("Failed to set config permissions: {e}"))?;
    }

    // Either the old file or the new file exists, never a partial one
    std::fs::rename(&temp, &target).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        format!("Failed to commit config: {e}")
    })?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Absolute path to a PEM bundle overriding the bundled one (empty = bundled)
    #[serde(default)]
    pub certificate_file: String,
    /// Deadline applied to every request; unset means no deadline
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// URL fetched by the make-request command
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Keep idle connections for reuse between requests
    #[serde(default = "default_keep_alive")]
    pub keep_alive: bool,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_keep_alive() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            certificate_file: String::new(),
            request_timeout_secs: None,
            endpoint: default_endpoint(),
            keep_alive: default_keep_alive(),
        }
    }
}

impl Settings {
    /// Certificate override, `None` when the bundled certificate should be used.
    pub fn certificate_override(&self) -> Option<&str> {
        (!self.certificate_file.is_empty()).then_some(self.certificate_file.as_str())
    }

    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        self.request_timeout_secs.map(std::time::Duration::from_secs)
    }
}

pub fn load_settings() -> Settings {
    load_json_config_from(&config_dir(), SETTINGS_FILE)
}

pub fn save_settings(settings: &Settings) -> Result<(), String> {
    save_json_config_in(&config_dir(), SETTINGS_FILE, settings)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
