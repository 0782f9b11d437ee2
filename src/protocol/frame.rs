//! Decoded inbound frames and the artifacts they carry.

use serde::Serialize;

/// One retrieved document from stage 2.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Local identifier, `1..n` in wire order.
    pub id: u32,
    pub title: String,
    /// Document kind as reported by the backend (e.g. `"pdf"`).
    #[serde(rename = "type")]
    pub doc_type: String,
    pub relevance_score: Option<f64>,
}

/// One extracted insight from stage 3.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    /// Local identifier, `1..n` in wire order; the wire key is discarded.
    pub id: u32,
    pub text: String,
    pub score: f64,
}

pub type DocumentSet = Vec<Document>;
pub type InsightSet = Vec<Insight>;

/// The assembled report: opaque markup handed straight to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportArtifact {
    pub markup: String,
}

/// A stage completion reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    Stage1Complete,
    Stage2Complete(DocumentSet),
    Stage3Complete(InsightSet),
    Stage4Complete(ReportArtifact),
}

impl StageEvent {
    /// The 1-based id of the stage this event completes.
    pub fn stage(&self) -> u8 {
        match self {
            StageEvent::Stage1Complete => 1,
            StageEvent::Stage2Complete(_) => 2,
            StageEvent::Stage3Complete(_) => 3,
            StageEvent::Stage4Complete(_) => 4,
        }
    }
}

/// Classification of one inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Stage(StageEvent),
    /// No known marker; logged and ignored.
    Unknown,
}
