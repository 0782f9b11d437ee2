//! Inbound frame classification.
//!
//! [`decode`] maps one text frame onto an [`InboundFrame`] or a per-frame
//! [`ProtocolError`].  All knowledge of the marker strings lives in
//! [`MARKERS`]; adding a marker (for example a backend failure frame) means
//! adding a row and a match arm, nothing else.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::frame::{Document, DocumentSet, InboundFrame, Insight, InsightSet, ReportArtifact, StageEvent};
use super::ProtocolError;

// ---------------------------------------------------------------------------
// Marker table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Transcribed,
    Documents,
    Insights,
    Report,
}

const MARKERS: &[(&str, Marker)] = &[
    ("1단계 완료", Marker::Transcribed),
    ("2단계 완료", Marker::Documents),
    ("3단계 완료", Marker::Insights),
    ("4단계 완료", Marker::Report),
];

const DELIMITER: char = ':';

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct WireDocument {
    title: String,
    #[serde(rename = "type")]
    doc_type: String,
    #[serde(default)]
    score: Option<f64>,
}

/// Items carry `insight`, `text`, or both; `insight` wins.
#[derive(Deserialize)]
struct WireInsight {
    #[serde(default)]
    insight: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    score: f64,
}

// ---------------------------------------------------------------------------
// decode
// ---------------------------------------------------------------------------

/// Classify one inbound text frame.
///
/// ```
/// use meeting_pipeline::protocol::{decode, InboundFrame, StageEvent};
///
/// assert_eq!(
///     decode("1단계 완료").unwrap(),
///     InboundFrame::Stage(StageEvent::Stage1Complete)
/// );
/// assert_eq!(decode("heartbeat").unwrap(), InboundFrame::Unknown);
/// ```
pub fn decode(text: &str) -> Result<InboundFrame, ProtocolError> {
    let text = text.trim_start();

    let Some((marker, rest)) = MARKERS
        .iter()
        .find_map(|(prefix, marker)| text.strip_prefix(prefix).map(|rest| (*marker, rest)))
    else {
        return Ok(InboundFrame::Unknown);
    };

    let payload = rest
        .trim_start()
        .strip_prefix(DELIMITER)
        .map(str::trim);

    let event = match marker {
        Marker::Transcribed => StageEvent::Stage1Complete,
        Marker::Documents => {
            let payload = payload.ok_or(ProtocolError::MissingPayload { stage: 2 })?;
            StageEvent::Stage2Complete(decode_documents(payload)?)
        }
        Marker::Insights => {
            let payload = payload.ok_or(ProtocolError::MissingPayload { stage: 3 })?;
            StageEvent::Stage3Complete(decode_insights(payload)?)
        }
        // The markup is opaque; a missing delimiter just means the rest of
        // the frame is the report.
        Marker::Report => StageEvent::Stage4Complete(ReportArtifact {
            markup: payload.unwrap_or_else(|| rest.trim()).to_string(),
        }),
    };

    Ok(InboundFrame::Stage(event))
}

fn decode_documents(payload: &str) -> Result<DocumentSet, ProtocolError> {
    let wire: Vec<WireDocument> = serde_json::from_str(payload)
        .map_err(|e| ProtocolError::MalformedDocuments(e.to_string()))?;

    Ok(wire
        .into_iter()
        .zip(1..)
        .map(|(doc, id)| Document {
            id,
            title: doc.title,
            doc_type: doc.doc_type,
            relevance_score: doc.score,
        })
        .collect())
}

/// Values are taken in wire order; the object keys are backend-internal and
/// replaced by local ids.
fn decode_insights(payload: &str) -> Result<InsightSet, ProtocolError> {
    let object: Map<String, Value> = serde_json::from_str(payload)
        .map_err(|e| ProtocolError::MalformedInsights(e.to_string()))?;

    object
        .into_iter()
        .zip(1..)
        .map(|((_, value), id)| {
            let item: WireInsight = serde_json::from_value(value)
                .map_err(|e| ProtocolError::MalformedInsights(e.to_string()))?;
            let text = item.insight.or(item.text).ok_or_else(|| {
                ProtocolError::MalformedInsights(format!("insight {id} has no text"))
            })?;
            Ok(Insight {
                id,
                text,
                score: item.score,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// FrameDecoder
// ---------------------------------------------------------------------------

/// Per-session decoder: wraps [`decode`] and keeps counters for the
/// end-of-session log line.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    decoded: u64,
    unknown: u64,
    rejected: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, text: &str) -> Result<InboundFrame, ProtocolError> {
        let result = decode(text);
        match &result {
            Ok(InboundFrame::Stage(_)) => self.decoded += 1,
            Ok(InboundFrame::Unknown) => self.unknown += 1,
            Err(_) => self.rejected += 1,
        }
        result
    }

    /// `(decoded, unknown, rejected)` frame counts since the last reset.
    pub fn counts(&self) -> (u64, u64, u64) {
        (self.decoded, self.unknown, self.rejected)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(frame: &str) -> StageEvent {
        match decode(frame).expect("decodes") {
            InboundFrame::Stage(event) => event,
            InboundFrame::Unknown => panic!("expected a stage event for {frame:?}"),
        }
    }

    #[test]
    fn stage1_without_payload() {
        assert_eq!(stage("1단계 완료"), StageEvent::Stage1Complete);
    }

    #[test]
    fn stage1_ignores_trailing_text() {
        assert_eq!(stage("1단계 완료: 전사 끝"), StageEvent::Stage1Complete);
        assert_eq!(stage("  1단계 완료 (42s)"), StageEvent::Stage1Complete);
    }

    #[test]
    fn stage2_documents_get_sequential_ids() {
        let event = stage(
            r#"2단계 완료: [{"title":"A","type":"pdf","score":80},{"title":"B","type":"docx"}]"#,
        );
        let StageEvent::Stage2Complete(docs) = event else {
            panic!("expected documents");
        };
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, 1);
        assert_eq!(docs[0].title, "A");
        assert_eq!(docs[0].doc_type, "pdf");
        assert_eq!(docs[0].relevance_score, Some(80.0));
        assert_eq!(docs[1].id, 2);
        assert_eq!(docs[1].relevance_score, None);
    }

    #[test]
    fn stage2_empty_array_is_valid() {
        assert_eq!(stage("2단계 완료: []"), StageEvent::Stage2Complete(vec![]));
    }

    #[test]
    fn stage2_malformed_json_is_protocol_error() {
        let err = decode("2단계 완료: [{\"title\":").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedDocuments(_)));
    }

    #[test]
    fn stage2_without_payload_is_protocol_error() {
        assert_eq!(
            decode("2단계 완료").unwrap_err(),
            ProtocolError::MissingPayload { stage: 2 }
        );
    }

    #[test]
    fn stage3_iterates_values_in_wire_order() {
        let event = stage(
            r#"3단계 완료: {"z":{"insight":"first","score":0.9},"a":{"text":"second","score":0.4}}"#,
        );
        let StageEvent::Stage3Complete(insights) = event else {
            panic!("expected insights");
        };
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].id, 1);
        assert_eq!(insights[0].text, "first");
        assert!((insights[0].score - 0.9).abs() < f64::EPSILON);
        assert_eq!(insights[1].id, 2);
        assert_eq!(insights[1].text, "second");
    }

    #[test]
    fn stage3_array_payload_is_protocol_error() {
        let err = decode(r#"3단계 완료: [{"insight":"x","score":1}]"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedInsights(_)));
    }

    #[test]
    fn stage3_item_without_text_is_protocol_error() {
        let err = decode(r#"3단계 완료: {"x":{"score":1}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedInsights(_)));
    }

    #[test]
    fn stage4_keeps_raw_markup() {
        let event = stage("4단계 완료: <html><p>a: b</p></html>");
        assert_eq!(
            event,
            StageEvent::Stage4Complete(ReportArtifact {
                markup: "<html><p>a: b</p></html>".into()
            })
        );
    }

    #[test]
    fn stage3_item_with_both_fields_prefers_insight() {
        let event = stage(r#"3단계 완료: {"x":{"insight":"key point","text":"older copy","score":0.9}}"#);
        let StageEvent::Stage3Complete(insights) = event else {
            panic!("expected insights");
        };
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].text, "key point");
    }

    #[test]
    fn stage4_without_delimiter_takes_rest_of_frame() {
        assert_eq!(
            stage("4단계 완료\n<html>r</html>"),
            StageEvent::Stage4Complete(ReportArtifact {
                markup: "<html>r</html>".into()
            })
        );
        assert_eq!(
            stage("4단계 완료"),
            StageEvent::Stage4Complete(ReportArtifact { markup: String::new() })
        );
    }

    #[test]
    fn unknown_frames_are_not_errors() {
        assert_eq!(decode("").unwrap(), InboundFrame::Unknown);
        assert_eq!(decode("5단계 완료").unwrap(), InboundFrame::Unknown);
        assert_eq!(decode("{\"type\":\"ping\"}").unwrap(), InboundFrame::Unknown);
    }

    #[test]
    fn frame_decoder_counts_outcomes() {
        let mut decoder = FrameDecoder::new();
        let _ = decoder.decode("1단계 완료");
        let _ = decoder.decode("noise");
        let _ = decoder.decode("2단계 완료: nope");
        assert_eq!(decoder.counts(), (1, 1, 1));

        decoder.reset();
        assert_eq!(decoder.counts(), (0, 0, 0));
    }
}
