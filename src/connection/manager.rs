//! [`ConnectionManager`] owns the one socket of a session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::events::{EventSink, SessionEvent};

use super::socket::{Connector, Frame, FrameSink, FrameSource};
use super::status::ConnectionStatus;
use super::{ConnectionError, TransportError};

/// How long a voluntary close may take before the socket is just dropped.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// What the reader task saw on the wire.
#[derive(Debug)]
enum SocketEvent {
    Text(String),
    Binary(usize),
    Error(String),
    Closed(Option<String>),
}

#[derive(Debug)]
struct Tagged {
    generation: u64,
    event: SocketEvent,
}

/// A live-connection event handed to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// One inbound text frame.
    Text(String),
    /// The socket closed.  Status is already `Disconnected`, or still `Error`
    /// if an error preceded the close.
    Closed { reason: Option<String> },
    /// The transport failed.  Status is now `Error`.
    Failed(ConnectionError),
}

// ---------------------------------------------------------------------------
// ConnectionManager
// ---------------------------------------------------------------------------

/// Creates, tracks and tears down the pipeline socket.
///
/// Status transitions are reported to the [`EventSink`] exactly once each;
/// setting the same status twice is silent.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    url: String,
    connect_timeout: Duration,
    events: Arc<dyn EventSink>,
    status: ConnectionStatus,
    generation: u64,
    socket: Option<Box<dyn FrameSink>>,
    reader: Option<JoinHandle<()>>,
    inbound_tx: mpsc::UnboundedSender<Tagged>,
    inbound_rx: mpsc::UnboundedReceiver<Tagged>,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn Connector>,
        server: &ServerConfig,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            connector,
            url: server.ws_url.clone(),
            connect_timeout: server.connect_timeout(),
            events,
            status: ConnectionStatus::Disconnected,
            generation: 0,
            socket: None,
            reader: None,
            inbound_tx,
            inbound_rx,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// `true` while the socket is open and writable.
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected && self.socket.is_some()
    }

    /// Identifies the current socket; changes on every open and every
    /// `disconnect()`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Open the socket.
    ///
    /// When already connected no new socket is created and the open event is
    /// emitted again for the caller.  Failures end in `Error` status and a
    /// `ConnectionFailed` event; the error is also returned so the caller can
    /// decide what to do next.
    pub async fn connect(&mut self) -> Result<(), ConnectionError> {
        if self.is_connected() {
            log::debug!("connection: already open, re-signalling open");
            self.events.emit(SessionEvent::ConnectionOpened);
            return Ok(());
        }

        // Leftovers from a failed socket.
        self.drop_socket();
        self.generation += 1;
        self.set_status(ConnectionStatus::Connecting);
        log::info!("connection: opening {}", self.url);

        let opened = tokio::time::timeout(self.connect_timeout, self.connector.open(&self.url)).await;
        let (sink, source) = match opened {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(self.fail(e)),
            Err(_) => {
                return Err(self.fail(ConnectionError::Timeout {
                    secs: self.connect_timeout.as_secs(),
                }))
            }
        };

        self.socket = Some(sink);
        self.reader = Some(spawn_reader(self.generation, source, self.inbound_tx.clone()));
        self.set_status(ConnectionStatus::Connected);
        self.events.emit(SessionEvent::ConnectionOpened);
        Ok(())
    }

    /// Close the socket voluntarily.
    ///
    /// The close notification for this socket is suppressed: nothing it emits
    /// after this call reaches the sink.  Status is forced to `Disconnected`
    /// even when no socket was open.
    pub async fn disconnect(&mut self) {
        self.generation += 1;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(mut socket) = self.socket.take() {
            log::info!("connection: closing");
            if tokio::time::timeout(CLOSE_GRACE, socket.close()).await.is_err() {
                log::warn!("connection: close handshake timed out, dropping socket");
            }
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    /// Write one frame.  Rejected with [`TransportError::NotConnected`] unless
    /// the socket is open.
    pub async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        if self.status != ConnectionStatus::Connected {
            return Err(TransportError::NotConnected);
        }
        let socket = self.socket.as_mut().ok_or(TransportError::NotConnected)?;
        socket.send(frame).await
    }

    /// Wait for the next event from the live socket.
    ///
    /// Events from sockets that have since been replaced or voluntarily closed
    /// are skipped.  Pends forever while nothing is open.  Cancel-safe: all
    /// processing after the channel receive is synchronous.
    pub async fn next_event(&mut self) -> ConnectionEvent {
        loop {
            let Some(tagged) = self.inbound_rx.recv().await else {
                // The manager holds a sender, so the channel never closes.
                return std::future::pending().await;
            };

            if tagged.generation != self.generation {
                log::debug!(
                    "connection: dropping {:?} from stale socket #{}",
                    tagged.event,
                    tagged.generation
                );
                continue;
            }

            match tagged.event {
                SocketEvent::Text(text) => return ConnectionEvent::Text(text),
                SocketEvent::Binary(len) => {
                    log::debug!("connection: ignoring {len}-byte binary frame");
                }
                SocketEvent::Error(message) => {
                    let err = ConnectionError::Socket(message);
                    log::error!("connection: {err}");
                    self.set_status(ConnectionStatus::Error);
                    self.events.emit(SessionEvent::ConnectionFailed(err.clone()));
                    return ConnectionEvent::Failed(err);
                }
                SocketEvent::Closed(reason) => {
                    log::info!("connection: closed by peer ({reason:?})");
                    self.socket = None;
                    self.reader = None;
                    if self.status != ConnectionStatus::Error {
                        self.set_status(ConnectionStatus::Disconnected);
                    }
                    self.events.emit(SessionEvent::ConnectionClosed {
                        reason: reason.clone(),
                    });
                    return ConnectionEvent::Closed { reason };
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status == status {
            return;
        }
        log::debug!("connection: {} → {}", self.status, status);
        self.status = status;
        self.events.emit(SessionEvent::StatusChanged(status));
    }

    fn fail(&mut self, err: ConnectionError) -> ConnectionError {
        log::error!("connection: {err}");
        self.drop_socket();
        self.set_status(ConnectionStatus::Error);
        self.events.emit(SessionEvent::ConnectionFailed(err.clone()));
        err
    }

    fn drop_socket(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.socket = None;
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Forward everything the socket yields, tagged with its generation, until
/// the stream ends.  A transport error is followed by a close, the way
/// browsers report it.
fn spawn_reader(
    generation: u64,
    mut source: Box<dyn FrameSource>,
    tx: mpsc::UnboundedSender<Tagged>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let forward = |event| tx.send(Tagged { generation, event }).is_ok();

        loop {
            let event = match source.next().await {
                Some(Ok(Frame::Text(text))) => SocketEvent::Text(text),
                Some(Ok(Frame::Binary(bytes))) => SocketEvent::Binary(bytes.len()),
                Some(Ok(Frame::Close(reason))) => {
                    forward(SocketEvent::Closed(reason));
                    return;
                }
                Some(Err(message)) => {
                    if forward(SocketEvent::Error(message)) {
                        forward(SocketEvent::Closed(None));
                    }
                    return;
                }
                None => {
                    forward(SocketEvent::Closed(None));
                    return;
                }
            };
            if !forward(event) {
                return;
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
