//! Socket ownership for one pipeline session.
//!
//! # Architecture
//!
//! ```text
//! ConnectionManager::connect()
//!        │  Connector::open(url)  (tokio-tungstenite in production)
//!        ▼
//!  FrameSink ◀── send()            FrameSource ──▶ reader task
//!                                                    │ (generation, SocketEvent)
//!                                                    ▼
//!                                  ConnectionManager::next_event()
//!                                    ├─ stale generation → dropped
//!                                    ├─ text             → ConnectionEvent::Text
//!                                    ├─ error            → status = Error (sticky)
//!                                    └─ close            → status = Disconnected
//! ```
//!
//! Every successful open bumps a generation counter, and so does
//! `disconnect()`.  Events tagged with an older generation are discarded, so a
//! close or error that races a voluntary disconnect never reaches the sink.

pub mod manager;
pub mod socket;
pub mod status;

#[cfg(test)]
pub mod mock;

pub use manager::{ConnectionEvent, ConnectionManager};
pub use socket::{Connector, Frame, FrameSink, FrameSource, WsConnector};
pub use status::ConnectionStatus;

use thiserror::Error;

// ---------------------------------------------------------------------------
// ConnectionError
// ---------------------------------------------------------------------------

/// Failures of the socket itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The endpoint could not be turned into a handshake request.
    #[error("invalid socket url: {0}")]
    InvalidUrl(String),

    /// The WebSocket handshake failed.
    #[error("could not open socket: {0}")]
    Handshake(String),

    /// The handshake did not finish within the configured timeout.
    #[error("socket did not open within {secs} s")]
    Timeout { secs: u64 },

    /// The transport reported an error on an open socket.
    #[error("socket error: {0}")]
    Socket(String),

    /// The socket closed before the report was rendered.
    #[error("connection closed before the pipeline finished ({})", .reason.as_deref().unwrap_or("no reason given"))]
    ClosedEarly { reason: Option<String> },

    /// No frame arrived within the watchdog window.
    #[error("no progress from the backend for {secs} s")]
    Stalled { secs: u64 },
}

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// Failures while pushing frames out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// A send was attempted while the socket was not open.
    #[error("not connected")]
    NotConnected,

    /// The audio for this connection has already been sent.
    #[error("audio already sent on this connection")]
    AlreadySent,

    /// There are no audio bytes to send.
    #[error("audio payload is empty")]
    EmptyPayload,

    /// The session header could not be serialised.
    #[error("could not encode session header: {0}")]
    Encode(String),

    /// The socket rejected the write.
    #[error("socket write failed: {0}")]
    Send(String),
}
