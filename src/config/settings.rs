//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to the
//! orchestrator task by value.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// DisconnectPolicy
// ---------------------------------------------------------------------------

/// What happens to stage progress when the socket drops before the report
/// has been rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisconnectPolicy {
    /// Reset every stage to pending so the next session starts clean.
    Reset,
    /// Leave the stages as they were when the connection dropped.
    Preserve,
}

impl Default for DisconnectPolicy {
    fn default() -> Self {
        Self::Reset
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Where the processing backend's socket lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// WebSocket endpoint (`ws://` or `wss://`).
    pub ws_url: String,
    /// Maximum seconds to wait for the socket handshake.
    pub connect_timeout_secs: u64,
}

impl ServerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:8000/ws".into(),
            connect_timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Session-level policy knobs used by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds without an inbound frame, while the backend is working,
    /// before the session is failed as stalled.  `0` disables the watchdog.
    pub stall_timeout_secs: u64,
    /// Stage handling after an unexpected disconnect.
    pub on_disconnect: DisconnectPolicy,
}

impl SessionConfig {
    /// The watchdog window, or `None` when disabled.
    pub fn stall_timeout(&self) -> Option<Duration> {
        (self.stall_timeout_secs > 0).then(|| Duration::from_secs(self.stall_timeout_secs))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stall_timeout_secs: 0,
            on_disconnect: DisconnectPolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// UploadConfig
// ---------------------------------------------------------------------------

/// Settings for the REST document-upload service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Base URL of the upload API; `/upload` is appended.
    pub base_url: String,
    /// API key, `None` for unauthenticated deployments.
    pub api_key: Option<String>,
    /// Maximum seconds to wait for an upload response.
    pub timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use meeting_pipeline::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// println!("{}", config.server.ws_url);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Socket backend settings.
    pub server: ServerConfig,
    /// Orchestrator policy.
    pub session: SessionConfig,
    /// Document upload settings.
    pub upload: UploadConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
