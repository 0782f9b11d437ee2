//! Outbound session framing.
//!
//! A session upload is exactly two frames on one connection:
//!
//! 1. a JSON text frame ([`SessionHeader`]) with the meeting metadata and the
//!    size/type of the audio that follows;
//! 2. one binary frame with the audio bytes.
//!
//! The backend pairs the two by order; `audio.bytes` lets it check that the
//! binary frame it received is the one announced.

use serde::Serialize;

use crate::audio::{AudioPayload, SessionMetadata};

/// Describes the binary frame that follows the header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDescriptor {
    pub mime_type: String,
    pub bytes: usize,
}

/// The control frame sent before the audio.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHeader<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(flatten)]
    pub metadata: &'a SessionMetadata,
    pub audio: AudioDescriptor,
}

impl<'a> SessionHeader<'a> {
    pub fn new(metadata: &'a SessionMetadata, payload: &AudioPayload) -> Self {
        Self {
            kind: "session",
            metadata,
            audio: AudioDescriptor {
                mime_type: payload.mime_type.clone(),
                bytes: payload.len(),
            },
        }
    }
}

/// Serialise the header frame for `metadata` + `payload`.
pub fn encode_session(
    metadata: &SessionMetadata,
    payload: &AudioPayload,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&SessionHeader::new(metadata, payload))
}
