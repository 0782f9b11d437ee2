//! Session-level error taxonomy.
//!
//! Each layer has its own error type; [`SessionError`] is what the
//! orchestrator reports when a session ends badly.  Protocol errors are not
//! part of it: a bad frame is skipped and never ends a session.

use thiserror::Error;

use crate::connection::{ConnectionError, TransportError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Open failure, transport error, or close before the report arrived.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The audio could not be sent.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The backend explicitly reported a failure.
    #[error("backend reported a failure: {0}")]
    Application(String),
}

impl SessionError {
    /// Short prompt for the user; every failure is recoverable by retrying.
    pub fn user_hint(&self) -> &'static str {
        match self {
            SessionError::Connection(_) | SessionError::Transport(_) => {
                "Check your connection and try again."
            }
            SessionError::Application(_) => "Please retry the session.",
        }
    }
}
