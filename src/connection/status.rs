//! Connection status as reported to observers.

use serde::Serialize;

/// Lifecycle of the pipeline socket.
///
/// ```text
/// Disconnected ──connect──▶ Connecting ──open──▶ Connected
///                               │                   │
///                               └──fail──▶ Error ◀──┤ error
///                                                   └─ close ──▶ Disconnected
/// ```
///
/// `Error` is sticky: a close that follows an error leaves it in place until
/// the next `connect()` or `disconnect()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    /// A short human-readable label suitable for a status bar.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Error => "Error",
        }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        ConnectionStatus::Disconnected
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
