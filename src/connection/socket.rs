//! Socket seam: the traits the [`ConnectionManager`] talks to, and the
//! tokio-tungstenite implementation used in production.
//!
//! [`ConnectionManager`]: super::ConnectionManager

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::{ConnectionError, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One message unit on the socket, independent of the WebSocket library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    /// Close handshake, with the peer's reason if it gave one.
    Close(Option<String>),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Write half of an open socket.
#[async_trait]
pub trait FrameSink: Send {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Start the close handshake.  Errors are ignored; the socket is being
    /// thrown away either way.
    async fn close(&mut self);
}

/// Read half of an open socket.
///
/// Yields `None` once the underlying stream has ended.
#[async_trait]
pub trait FrameSource: Send {
    async fn next(&mut self) -> Option<Result<Frame, String>>;
}

/// Opens sockets.  Held as `Arc<dyn Connector>` by the manager so tests can
/// swap in an in-memory peer.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(
        &self,
        url: &str,
    ) -> Result<(Box<dyn FrameSink>, Box<dyn FrameSource>), ConnectionError>;
}

// ---------------------------------------------------------------------------
// WsConnector
// ---------------------------------------------------------------------------

/// [`Connector`] backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn open(
        &self,
        url: &str,
    ) -> Result<(Box<dyn FrameSink>, Box<dyn FrameSource>), ConnectionError> {
        let request = url
            .into_client_request()
            .map_err(|e| ConnectionError::InvalidUrl(e.to_string()))?;

        let (stream, response) = connect_async(request)
            .await
            .map_err(|e| ConnectionError::Handshake(e.to_string()))?;

        log::debug!("socket: handshake complete ({})", response.status());

        let (write, read) = stream.split();
        Ok((Box::new(WsSink { inner: write }), Box::new(WsSource { inner: read })))
    }
}

struct WsSink {
    inner: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        let message = match frame {
            Frame::Text(text) => Message::text(text),
            Frame::Binary(bytes) => Message::binary(bytes),
            Frame::Close(_) => Message::Close(None),
        };
        self.inner
            .send(message)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.inner.close().await {
            log::debug!("socket: close handshake failed: {e}");
        }
    }
}

struct WsSource {
    inner: SplitStream<WsStream>,
}

#[async_trait]
impl FrameSource for WsSource {
    async fn next(&mut self) -> Option<Result<Frame, String>> {
        loop {
            let frame = match self.inner.next().await? {
                Ok(Message::Text(text)) => Frame::Text(text.to_string()),
                Ok(Message::Binary(data)) => Frame::Binary(data.to_vec()),
                Ok(Message::Close(close)) => Frame::Close(close.map(|c| c.reason.to_string())),
                // Pings are answered by tungstenite itself.
                Ok(_) => continue,
                Err(e) => return Some(Err(e.to_string())),
            };
            return Some(Ok(frame));
        }
    }
}
