//! Typed event surface between the controller and its observers.
//!
//! The controller never calls back into observer code directly.  Every
//! notification is a [`SessionEvent`] pushed through an [`EventSink`], which
//! in production is the sending half of a tokio channel drained by the UI or
//! CLI loop.  Dispatch is therefore sequential and cannot re-enter the
//! controller.

use tokio::sync::mpsc;

use crate::connection::{ConnectionError, ConnectionStatus, TransportError};
use crate::error::SessionError;
use crate::pipeline::StageStatus;
use crate::protocol::{DocumentSet, InsightSet, ProtocolError, ReportArtifact};

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// All five stages completed and the report was delivered.
    Completed,
    /// The session failed; a new one may be started.
    Failed(SessionError),
    /// The user reset the session.
    Cancelled,
}

/// Everything the controller and orchestrator report, in the order it
/// happened.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ConnectionOpened,
    ConnectionClosed { reason: Option<String> },
    ConnectionFailed(ConnectionError),
    StatusChanged(ConnectionStatus),

    /// Authoritative per-stage progress; consumers must not infer progress
    /// any other way.
    StageUpdated { stage: u8, status: StageStatus },
    CurrentStepChanged(u8),

    DocumentsReceived(DocumentSet),
    InsightsReceived(InsightSet),
    ReportReceived(ReportArtifact),

    /// One inbound frame was rejected; the session continues.
    ProtocolError(ProtocolError),
    /// A send was refused or failed.
    TransportError(TransportError),

    SessionEnded(SessionOutcome),
}

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// Receives [`SessionEvent`]s.
///
/// Implementations must not block; they are called from the controller task.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SessionEvent);
}

impl EventSink for mpsc::UnboundedSender<SessionEvent> {
    fn emit(&self, event: SessionEvent) {
        if self.send(event).is_err() {
            log::debug!("events: receiver dropped, event discarded");
        }
    }
}

/// Create an unbounded event channel for use as the controller's sink.
pub fn event_channel() -> (
    mpsc::UnboundedSender<SessionEvent>,
    mpsc::UnboundedReceiver<SessionEvent>,
) {
    mpsc::unbounded_channel()
}

// ---------------------------------------------------------------------------
// RecordingSink  (test-only)
// ---------------------------------------------------------------------------

/// Collects events in memory so tests can assert on exact sequences.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    events: std::sync::Mutex<Vec<SessionEvent>>,
}

#[cfg(test)]
impl RecordingSink {
    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<SessionEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

#[cfg(test)]
impl EventSink for RecordingSink {
    fn emit(&self, event: SessionEvent) {
        self.events.lock().unwrap().push(event);
    }
}
