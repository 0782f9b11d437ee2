//! Configuration module for the meeting pipeline client.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the socket
//! server, session policy and document upload, `AppPaths` for the settings
//! location, and TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, DisconnectPolicy, ServerConfig, SessionConfig, UploadConfig};
