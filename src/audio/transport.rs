//! [`AudioTransport`]: sends one session's metadata and audio.

use crate::connection::{ConnectionManager, Frame, TransportError};
use crate::protocol::encode_session;

use super::payload::{AudioPayload, SessionMetadata};

/// Sends the session header and the audio frame, at most once per socket.
///
/// There is no retry here; a failed send is reported and the orchestrator
/// decides what to do.
#[derive(Debug, Default)]
pub struct AudioTransport {
    /// Generation of the socket the audio went out on.
    sent_on: Option<u64>,
}

impl AudioTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send `metadata` as a JSON text frame followed by `payload` as one
    /// binary frame.
    ///
    /// # Errors
    ///
    /// - [`TransportError::NotConnected`]: the socket is not open; nothing
    ///   is written.
    /// - [`TransportError::AlreadySent`]: this socket already carried audio.
    /// - [`TransportError::EmptyPayload`]: there is nothing to send.
    /// - [`TransportError::Encode`] / [`TransportError::Send`]: the write
    ///   itself failed.
    pub async fn send(
        &mut self,
        connection: &mut ConnectionManager,
        metadata: &SessionMetadata,
        payload: &AudioPayload,
    ) -> Result<(), TransportError> {
        if !connection.is_connected() {
            return Err(TransportError::NotConnected);
        }
        if self.sent_on == Some(connection.generation()) {
            return Err(TransportError::AlreadySent);
        }
        if payload.is_empty() {
            return Err(TransportError::EmptyPayload);
        }

        let header =
            encode_session(metadata, payload).map_err(|e| TransportError::Encode(e.to_string()))?;

        connection.send(Frame::Text(header)).await?;
        connection.send(Frame::Binary(payload.bytes.clone())).await?;
        self.sent_on = Some(connection.generation());

        log::info!(
            "transport: sent {:?} ({} bytes of {})",
            metadata.title,
            payload.len(),
            payload.mime_type
        );
        Ok(())
    }

    /// Forget the last send so a new session may upload.
    pub fn reset(&mut self) {
        self.sent_on = None;
    }
}
