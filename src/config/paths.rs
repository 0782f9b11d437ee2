//! Where `settings.toml` lives.
//!
//! By default under the platform config dir (via `dirs`):
//!   Linux   `~/.config/meeting-pipeline/settings.toml`
//!   macOS   `~/Library/Application Support/meeting-pipeline/settings.toml`
//!   Windows `%APPDATA%\meeting-pipeline\settings.toml`
//!
//! `MEETING_PIPELINE_CONFIG` names a settings file directly and wins over the
//! platform location; handy for running several backends side by side.

use std::path::PathBuf;

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV: &str = "MEETING_PIPELINE_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "meeting-pipeline";

    pub fn new() -> Self {
        Self::resolve(std::env::var_os(CONFIG_ENV).map(PathBuf::from), dirs::config_dir())
    }

    /// Paths for a settings file kept under `root/meeting-pipeline/`.
    pub fn in_dir(root: impl Into<PathBuf>) -> Self {
        let config_dir = root.into().join(Self::APP_NAME);
        Self {
            settings_file: config_dir.join("settings.toml"),
            config_dir,
        }
    }

    fn resolve(override_file: Option<PathBuf>, platform_dir: Option<PathBuf>) -> Self {
        match override_file.filter(|p| !p.as_os_str().is_empty()) {
            Some(settings_file) => Self {
                config_dir: settings_file
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(".")),
                settings_file,
            },
            // No platform dir (e.g. a bare container): use the working dir.
            None => Self::in_dir(platform_dir.unwrap_or_else(|| PathBuf::from("."))),
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
