//! Session pipeline: stage model, controller, and orchestrator.
//!
//! # Architecture
//!
//! ```text
//! SessionCommand (mpsc)
//!        │
//!        ▼
//! SessionOrchestrator::run()  ← async tokio task
//!        │
//!        ├─ inputs ready       → SessionController::connect + send_audio
//!        │
//!        └─ socket text frames → SessionController::handle_frame
//!                                   ├─ FrameDecoder::decode
//!                                   └─ StageStateMachine::complete
//!
//! SessionEvent ───▶ EventSink (mpsc::UnboundedSender in the CLI)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use meeting_pipeline::config::AppConfig;
//! use meeting_pipeline::connection::WsConnector;
//! use meeting_pipeline::events::event_channel;
//! use meeting_pipeline::pipeline::{SessionCommand, SessionOrchestrator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let (events_tx, mut events_rx) = event_channel();
//!     let (command_tx, command_rx) = mpsc::channel(16);
//!
//!     let mut orchestrator =
//!         SessionOrchestrator::new(Arc::new(WsConnector), &config, Arc::new(events_tx));
//!     tokio::spawn(async move { orchestrator.run(command_rx).await });
//!
//!     // command_tx.send(SessionCommand::SetMetadata(..)) ...
//!     # drop(command_tx);
//!     while let Some(event) = events_rx.recv().await {
//!         println!("{event:?}");
//!     }
//! }
//! ```

pub mod orchestrator;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use orchestrator::{SessionCommand, SessionOrchestrator, SessionPhase};
pub use runner::{ControllerSignal, SessionController};
pub use state::{Stage, StageStateMachine, StageStatus, StageTransition, Transitions, STAGE_COUNT};
