//! Wire protocol spoken over the pipeline socket.
//!
//! Inbound, the backend sends plain-text frames that start with a stage
//! marker and optionally carry a payload after a `:` delimiter:
//!
//! ```text
//! 1단계 완료                              → Stage1Complete
//! 2단계 완료: [{"title":..,"type":..}]    → Stage2Complete(DocumentSet)
//! 3단계 완료: {"<id>":{"insight":..}}     → Stage3Complete(InsightSet)
//! 4단계 완료: <html>…</html>              → Stage4Complete(ReportArtifact)
//! anything else                           → Unknown
//! ```
//!
//! Outbound, a session is one JSON control frame followed by one binary
//! audio frame (see [`outbound`]).

pub mod decoder;
pub mod frame;
pub mod outbound;

pub use decoder::{decode, FrameDecoder};
pub use frame::{Document, DocumentSet, InboundFrame, Insight, InsightSet, ReportArtifact, StageEvent};
pub use outbound::{encode_session, SessionHeader};

use thiserror::Error;

// ---------------------------------------------------------------------------
// ProtocolError
// ---------------------------------------------------------------------------

/// A single inbound frame could not be decoded.
///
/// Always scoped to one frame: the connection stays open and stage state is
/// untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    /// A stage 2 or 3 marker arrived without a delimiter.
    #[error("stage {stage} frame carries no payload")]
    MissingPayload { stage: u8 },

    /// The stage 2 payload was not a JSON array of documents.
    #[error("malformed document payload: {0}")]
    MalformedDocuments(String),

    /// The stage 3 payload was not a JSON object of insights.
    #[error("malformed insight payload: {0}")]
    MalformedInsights(String),
}
