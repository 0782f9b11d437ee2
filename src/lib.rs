//! Client for a five-stage meeting-analysis pipeline.
//!
//! A session uploads one recording over a WebSocket and follows the
//! backend's progress markers (`"N단계 완료"`) through transcription,
//! document retrieval, insight extraction, report assembly and rendering.
//!
//! The entry point is [`pipeline::SessionOrchestrator`]; everything it
//! observes is reported as [`events::SessionEvent`]s.

pub mod audio;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod protocol;
pub mod upload;
