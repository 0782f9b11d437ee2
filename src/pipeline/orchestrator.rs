//! Session orchestrator: decides when a session starts and how it ends.
//!
//! [`SessionOrchestrator`] owns a [`SessionController`] and responds to
//! [`SessionCommand`]s received over a `tokio::sync::mpsc` channel, while
//! draining the controller's socket events in the same loop.
//!
//! # Session flow
//!
//! ```text
//! SetMetadata / AttachAudio / RecordingStopped
//!   └─▶ metadata complete + audio present + not recording?
//!         └─▶ connect()                                 [Connecting]
//!               ├─ Err → SessionEnded(Failed)           [Failed]
//!               └─ Ok  → send_audio()
//!                     ├─ Err → disconnect, SessionEnded(Failed)
//!                     └─ Ok  → clear inputs             [Streaming]
//!
//! Streaming
//!   ├─ Completed signal  → disconnect, SessionEnded(Completed)  [Completed]
//!   ├─ Closed / Failed   → SessionEnded(Failed)                  [Failed]
//!   └─ watchdog fires    → disconnect, SessionEnded(Failed)      [Failed]
//! ```
//!
//! `Completed` and `Failed` both accept a new session.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::audio::{AudioPayload, SessionMetadata};
use crate::config::{AppConfig, DisconnectPolicy, SessionConfig};
use crate::connection::{ConnectionError, Connector};
use crate::error::SessionError;
use crate::events::{EventSink, SessionEvent, SessionOutcome};

use super::runner::{ControllerSignal, SessionController};

// ---------------------------------------------------------------------------
// SessionCommand / SessionPhase
// ---------------------------------------------------------------------------

/// Requests from the UI or CLI.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Meeting details entered or edited.
    SetMetadata(SessionMetadata),
    /// An uploaded recording.
    AttachAudio(AudioPayload),
    /// Live capture began; no session may start until it stops.
    RecordingStarted,
    /// Live capture ended with this recording.
    RecordingStopped(AudioPayload),
    /// Start again with the inputs still held (after a failure).
    Retry,
    /// Abandon the current session and clear all inputs.
    Reset,
    /// Disconnect and stop the loop.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session yet; waiting for inputs.
    Idle,
    Connecting,
    /// Audio sent; stage frames are arriving.
    Streaming,
    Completed,
    Failed,
}

impl SessionPhase {
    /// `true` when a new session may be started.
    pub fn accepts_new_session(&self) -> bool {
        matches!(self, SessionPhase::Idle | SessionPhase::Completed | SessionPhase::Failed)
    }
}

// ---------------------------------------------------------------------------
// SessionOrchestrator
// ---------------------------------------------------------------------------

pub struct SessionOrchestrator {
    controller: SessionController,
    events: Arc<dyn EventSink>,
    config: SessionConfig,
    metadata: Option<SessionMetadata>,
    audio: Option<AudioPayload>,
    recording: bool,
    phase: SessionPhase,
    last_activity: Instant,
}

impl SessionOrchestrator {
    pub fn new(connector: Arc<dyn Connector>, config: &AppConfig, events: Arc<dyn EventSink>) -> Self {
        Self {
            controller: SessionController::new(connector, &config.server, Arc::clone(&events)),
            events,
            config: config.session.clone(),
            metadata: None,
            audio: None,
            recording: false,
            phase: SessionPhase::Idle,
            last_activity: Instant::now(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until `commands` is closed or a `Shutdown` arrives.
    ///
    /// The socket is always disconnected on the way out.
    pub async fn run(&mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        loop {
            let deadline = self.watchdog_deadline();

            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(SessionCommand::Shutdown) => break,
                    Some(command) => self.handle_command(command).await,
                },
                signal = self.controller.next_signal() => self.handle_signal(signal).await,
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.handle_stall().await;
                }
            }
        }

        log::info!("orchestrator: shutting down");
        self.controller.disconnect().await;
    }

    // -----------------------------------------------------------------------
    // Command handling
    // -----------------------------------------------------------------------

    async fn handle_command(&mut self, command: SessionCommand) {
        log::debug!("orchestrator: {command:?} in {:?}", self.phase);
        match command {
            SessionCommand::SetMetadata(metadata) => {
                self.metadata = Some(metadata);
                self.try_start().await;
            }
            SessionCommand::AttachAudio(payload) => {
                self.audio = Some(payload);
                self.try_start().await;
            }
            SessionCommand::RecordingStarted => {
                self.recording = true;
            }
            SessionCommand::RecordingStopped(payload) => {
                self.recording = false;
                self.audio = Some(payload);
                self.try_start().await;
            }
            SessionCommand::Retry => self.try_start().await,
            SessionCommand::Reset => self.reset().await,
            SessionCommand::Shutdown => {}
        }
    }

    /// Start a session if nothing is running and every precondition holds.
    async fn try_start(&mut self) {
        if !self.phase.accepts_new_session() {
            log::debug!("orchestrator: session already running");
            return;
        }
        if self.recording {
            log::debug!("orchestrator: waiting for recording to stop");
            return;
        }
        let (Some(metadata), Some(audio)) = (self.metadata.as_ref(), self.audio.as_ref()) else {
            return;
        };
        if !metadata.is_complete() {
            log::debug!("orchestrator: metadata incomplete, not starting");
            return;
        }

        self.controller.reset();
        self.phase = SessionPhase::Connecting;

        if let Err(e) = self.controller.connect().await {
            self.end_failed(e.into());
            return;
        }

        if let Err(e) = self.controller.send_audio(metadata, audio).await {
            self.controller.disconnect().await;
            self.end_failed(e.into());
            return;
        }

        self.metadata = None;
        self.audio = None;
        self.phase = SessionPhase::Streaming;
        self.last_activity = Instant::now();
        log::info!("orchestrator: audio sent, waiting for the pipeline");
    }

    async fn reset(&mut self) {
        let was_running = !self.phase.accepts_new_session();
        self.controller.disconnect().await;
        self.controller.reset();
        self.metadata = None;
        self.audio = None;
        self.phase = SessionPhase::Idle;
        if was_running {
            self.events.emit(SessionEvent::SessionEnded(SessionOutcome::Cancelled));
        }
    }

    // -----------------------------------------------------------------------
    // Socket handling
    // -----------------------------------------------------------------------

    async fn handle_signal(&mut self, signal: ControllerSignal) {
        if self.phase != SessionPhase::Streaming {
            log::debug!("orchestrator: {signal:?} outside a session, ignored");
            return;
        }
        self.last_activity = Instant::now();

        match signal {
            ControllerSignal::Progress | ControllerSignal::Ignored | ControllerSignal::Rejected => {}
            ControllerSignal::Completed => {
                log::info!("orchestrator: pipeline finished");
                self.controller.disconnect().await;
                self.phase = SessionPhase::Completed;
                self.events.emit(SessionEvent::SessionEnded(SessionOutcome::Completed));
            }
            ControllerSignal::Closed { reason } => {
                self.end_interrupted(ConnectionError::ClosedEarly { reason });
            }
            ControllerSignal::Failed(err) => {
                self.end_interrupted(err);
            }
        }
    }

    async fn handle_stall(&mut self) {
        let secs = self.config.stall_timeout_secs;
        log::warn!("orchestrator: no progress for {secs} s, giving up");
        self.controller.disconnect().await;
        self.end_interrupted(ConnectionError::Stalled { secs });
    }

    fn watchdog_deadline(&self) -> Option<Instant> {
        if self.phase != SessionPhase::Streaming {
            return None;
        }
        self.config.stall_timeout().map(|window| self.last_activity + window)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// The connection went away mid-pipeline.
    fn end_interrupted(&mut self, err: ConnectionError) {
        if self.config.on_disconnect == DisconnectPolicy::Reset {
            self.controller.reset();
        }
        self.end_failed(err.into());
    }

    fn end_failed(&mut self, err: SessionError) {
        log::error!("orchestrator: session failed: {err} ({})", err.user_hint());
        self.phase = SessionPhase::Failed;
        self.events.emit(SessionEvent::SessionEnded(SessionOutcome::Failed(err)));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
