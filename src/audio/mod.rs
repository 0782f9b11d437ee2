//! Outbound audio: the meeting metadata, the recorded payload, and the
//! transport that sends both once the socket is open.
//!
//! Capturing and encoding audio happens elsewhere; this module only moves
//! an already-encoded recording.
//!
//! ```rust,no_run
//! use meeting_pipeline::audio::{AudioPayload, SessionMetadata};
//!
//! # async fn example() -> std::io::Result<()> {
//! let payload = AudioPayload::from_file("standup.webm").await?;
//! let metadata = SessionMetadata {
//!     title: "Standup".into(),
//!     author: "jung".into(),
//!     ..Default::default()
//! };
//! assert!(metadata.is_complete());
//! # let _ = payload;
//! # Ok(())
//! # }
//! ```

pub mod payload;
pub mod transport;

pub use payload::{AudioPayload, SessionMetadata};
pub use transport::AudioTransport;
