//! Session metadata and the recorded audio that goes with it.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Meeting details supplied by the user before the upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub title: String,
    pub author: String,
    pub participants: Vec<String>,
    pub purpose: String,
    pub additional_info: String,
}

impl SessionMetadata {
    /// Title and author are required before a session may start; everything
    /// else is optional.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.author.trim().is_empty()
    }
}

/// An encoded audio recording, sent as one binary frame.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AudioPayload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Read a recording from disk, guessing the MIME type from the extension.
    pub async fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(bytes, mime_for(path)))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Recordings run to megabytes; log the size, not the bytes.
impl fmt::Debug for AudioPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioPayload")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("webm") => "audio/webm",
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("ogg") | Some("oga") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_requires_title_and_author() {
        let mut meta = SessionMetadata::default();
        assert!(!meta.is_complete());

        meta.title = "Kickoff".into();
        assert!(!meta.is_complete());

        meta.author = "   ".into();
        assert!(!meta.is_complete());

        meta.author = "choi".into();
        assert!(meta.is_complete());
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for(Path::new("a/b/meeting.WEBM")), "audio/webm");
        assert_eq!(mime_for(Path::new("rec.wav")), "audio/wav");
        assert_eq!(mime_for(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn from_file_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.ogg");
        std::fs::write(&path, [1u8, 2, 3, 4]).unwrap();

        let payload = AudioPayload::from_file(&path).await.unwrap();
        assert_eq!(payload.len(), 4);
        assert_eq!(payload.mime_type, "audio/ogg");
    }

    #[test]
    fn metadata_uses_camel_case_on_the_wire() {
        let meta = SessionMetadata {
            additional_info: "x".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["additionalInfo"], "x");
    }
}
