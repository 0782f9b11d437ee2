//! In-memory [`Connector`] for tests.
//!
//! Every `open()` creates a fresh pair of channels and queues a [`MockPeer`]
//! that plays the backend: it pushes inbound frames and records what the
//! client wrote.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::socket::{Connector, Frame, FrameSink, FrameSource};
use super::{ConnectionError, TransportError};

/// The backend side of one mock socket.
pub struct MockPeer {
    inbound: mpsc::UnboundedSender<Result<Frame, String>>,
    outbound: mpsc::UnboundedReceiver<Frame>,
}

impl MockPeer {
    pub fn send_text(&self, text: &str) {
        let _ = self.inbound.send(Ok(Frame::Text(text.to_string())));
    }

    pub fn send_binary(&self, bytes: Vec<u8>) {
        let _ = self.inbound.send(Ok(Frame::Binary(bytes)));
    }

    pub fn close(&self, reason: Option<&str>) {
        let _ = self.inbound.send(Ok(Frame::Close(reason.map(str::to_string))));
    }

    pub fn fail(&self, message: &str) {
        let _ = self.inbound.send(Err(message.to_string()));
    }

    /// Everything the client has written so far.
    pub fn sent(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.outbound.try_recv() {
            frames.push(frame);
        }
        frames
    }
}

#[derive(Clone, Default)]
pub struct MockConnector {
    peers: Arc<Mutex<VecDeque<MockPeer>>>,
    opens: Arc<AtomicUsize>,
    refuse: bool,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector whose handshakes always fail.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    /// Number of sockets opened so far.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Take the peer of the oldest socket not yet taken.
    pub fn take_peer(&self) -> MockPeer {
        self.peers
            .lock()
            .unwrap()
            .pop_front()
            .expect("no socket was opened")
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(
        &self,
        url: &str,
    ) -> Result<(Box<dyn FrameSink>, Box<dyn FrameSource>), ConnectionError> {
        if self.refuse {
            return Err(ConnectionError::Handshake(format!("{url}: connection refused")));
        }

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        self.opens.fetch_add(1, Ordering::SeqCst);
        self.peers.lock().unwrap().push_back(MockPeer {
            inbound: inbound_tx,
            outbound: outbound_rx,
        });

        Ok((
            Box::new(MockSink {
                tx: outbound_tx,
                closed: false,
            }),
            Box::new(MockSource { rx: inbound_rx }),
        ))
    }
}

struct MockSink {
    tx: mpsc::UnboundedSender<Frame>,
    closed: bool,
}

#[async_trait]
impl FrameSink for MockSink {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Send("socket closed".into()));
        }
        self.tx
            .send(frame)
            .map_err(|_| TransportError::Send("peer went away".into()))
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.tx.send(Frame::Close(None));
        }
    }
}

struct MockSource {
    rx: mpsc::UnboundedReceiver<Result<Frame, String>>,
}

#[async_trait]
impl FrameSource for MockSource {
    async fn next(&mut self) -> Option<Result<Frame, String>> {
        self.rx.recv().await
    }
}
