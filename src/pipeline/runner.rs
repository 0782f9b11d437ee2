//! Session controller: one socket, one decoder, one stage model.
//!
//! [`SessionController`] is owned by the caller (normally the
//! [`SessionOrchestrator`](super::SessionOrchestrator)); nothing here is
//! global, so independent sessions can coexist.
//!
//! # Frame flow
//!
//! ```text
//! ConnectionManager::next_event()
//!   └─▶ Text(frame) → FrameDecoder::decode
//!         ├─ Stage(event)  → emit artifact → StageStateMachine::complete → emit transitions
//!         ├─ Unknown       → log, ignore
//!         └─ ProtocolError → emit ProtocolError, state untouched
//! ```
//!
//! Frames are handled one at a time, in arrival order.

use std::sync::Arc;

use crate::audio::{AudioPayload, AudioTransport, SessionMetadata};
use crate::config::ServerConfig;
use crate::connection::{
    ConnectionError, ConnectionEvent, ConnectionManager, ConnectionStatus, Connector, TransportError,
};
use crate::events::{EventSink, SessionEvent};
use crate::protocol::{FrameDecoder, InboundFrame, StageEvent};

use super::state::{StageStateMachine, Transitions};

// ---------------------------------------------------------------------------
// ControllerSignal
// ---------------------------------------------------------------------------

/// Summary of one processed connection event, for the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerSignal {
    /// A stage frame was applied; the pipeline is still running.
    Progress,
    /// A stage frame was applied and every stage is now complete.
    Completed,
    /// A frame with no known marker was ignored.
    Ignored,
    /// A frame failed to decode and was skipped.
    Rejected,
    /// The socket closed.
    Closed { reason: Option<String> },
    /// The socket failed.
    Failed(ConnectionError),
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

pub struct SessionController {
    connection: ConnectionManager,
    decoder: FrameDecoder,
    stages: StageStateMachine,
    transport: AudioTransport,
    events: Arc<dyn EventSink>,
}

impl SessionController {
    /// Create a controller that will open sockets through `connector` and
    /// report everything to `events`.
    pub fn new(
        connector: Arc<dyn Connector>,
        server: &ServerConfig,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            connection: ConnectionManager::new(connector, server, Arc::clone(&events)),
            decoder: FrameDecoder::new(),
            stages: StageStateMachine::new(),
            transport: AudioTransport::new(),
            events,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn stages(&self) -> &StageStateMachine {
        &self.stages
    }

    pub async fn connect(&mut self) -> Result<(), ConnectionError> {
        self.connection.connect().await
    }

    pub async fn disconnect(&mut self) {
        self.connection.disconnect().await;
        let (decoded, unknown, rejected) = self.decoder.counts();
        log::debug!("controller: frames decoded={decoded} unknown={unknown} rejected={rejected}");
    }

    /// Send the session's metadata and audio.
    ///
    /// On success stage 1 is shown as processing straight away; the backend
    /// sends no separate start acknowledgement.  On failure nothing changes
    /// and a `TransportError` event is emitted.
    pub async fn send_audio(
        &mut self,
        metadata: &SessionMetadata,
        payload: &AudioPayload,
    ) -> Result<(), TransportError> {
        match self.transport.send(&mut self.connection, metadata, payload).await {
            Ok(()) => {
                let transitions = self.stages.begin_transfer();
                self.publish(transitions);
                Ok(())
            }
            Err(e) => {
                log::warn!("controller: audio not sent: {e}");
                self.events.emit(SessionEvent::TransportError(e.clone()));
                Err(e)
            }
        }
    }

    /// Wait for the next event on the live socket and apply it.
    ///
    /// Cancel-safe: nothing is lost if the returned future is dropped before
    /// it completes.
    pub async fn next_signal(&mut self) -> ControllerSignal {
        match self.connection.next_event().await {
            ConnectionEvent::Text(text) => self.handle_frame(&text),
            ConnectionEvent::Closed { reason } => ControllerSignal::Closed { reason },
            ConnectionEvent::Failed(err) => ControllerSignal::Failed(err),
        }
    }

    /// Decode and apply one inbound text frame.
    pub fn handle_frame(&mut self, text: &str) -> ControllerSignal {
        match self.decoder.decode(text) {
            Ok(InboundFrame::Stage(event)) => self.apply(event),
            Ok(InboundFrame::Unknown) => {
                log::warn!("controller: ignoring unrecognised frame {:?}", preview(text));
                ControllerSignal::Ignored
            }
            Err(e) => {
                log::warn!("controller: skipping frame: {e}");
                self.events.emit(SessionEvent::ProtocolError(e));
                ControllerSignal::Rejected
            }
        }
    }

    /// Put every stage back to pending for a new session.
    pub fn reset(&mut self) {
        let transitions = self.stages.reset();
        self.publish(transitions);
        self.decoder.reset();
        self.transport.reset();
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn apply(&mut self, event: StageEvent) -> ControllerSignal {
        let stage = event.stage();
        log::info!("controller: stage {stage} complete");

        match event {
            StageEvent::Stage1Complete => {}
            StageEvent::Stage2Complete(documents) => {
                self.events.emit(SessionEvent::DocumentsReceived(documents));
            }
            StageEvent::Stage3Complete(insights) => {
                self.events.emit(SessionEvent::InsightsReceived(insights));
            }
            StageEvent::Stage4Complete(report) => {
                self.events.emit(SessionEvent::ReportReceived(report));
            }
        }

        let transitions = self.stages.complete(stage);
        self.publish(transitions);

        if self.stages.is_complete() {
            ControllerSignal::Completed
        } else {
            ControllerSignal::Progress
        }
    }

    fn publish(&self, transitions: Transitions) {
        for t in transitions.stages {
            self.events.emit(SessionEvent::StageUpdated {
                stage: t.stage,
                status: t.status,
            });
        }
        if let Some(step) = transitions.current_step {
            self.events.emit(SessionEvent::CurrentStepChanged(step));
        }
    }
}

/// First few characters of a frame, for log lines.
fn preview(text: &str) -> String {
    const MAX: usize = 48;
    match text.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
