//! In-memory transport backed by tokio channels.
//!
//! [`pair`] returns the client side (a [`Transport`] for the session) and a
//! [`MemoryServer`] that plays the remote peer: it reads what the client
//! sent, pushes frames to the client and can end or fail the stream.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{Frame, FrameSink, FrameStream, Transport, TransportError, TransportResult};

/// Create a connected client/server pair.
pub fn pair() -> (MemoryTransport, MemoryServer) {
    let (to_server, from_client) = mpsc::unbounded_channel();
    let (to_client, from_server) = mpsc::unbounded_channel();
    let close_count = Arc::new(AtomicUsize::new(0));

    let transport = MemoryTransport {
        sink: MemorySink {
            tx: to_server,
            closed: false,
            close_count: Arc::clone(&close_count),
        },
        stream: MemoryStream { rx: from_server },
    };
    let server = MemoryServer {
        inbound: from_client,
        outbound: Some(to_client),
        close_count,
    };
    (transport, server)
}

pub struct MemoryTransport {
    sink: MemorySink,
    stream: MemoryStream,
}

impl Transport for MemoryTransport {
    type Sink = MemorySink;
    type Stream = MemoryStream;

    fn split(self) -> (Self::Sink, Self::Stream) {
        (self.sink, self.stream)
    }
}

pub struct MemorySink {
    tx: mpsc::UnboundedSender<Frame>,
    closed: bool,
    close_count: Arc<AtomicUsize>,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send(&mut self, frame: Frame) -> TransportResult<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.tx.send(frame).map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        self.closed = true;
        Ok(())
    }
}

pub struct MemoryStream {
    rx: mpsc::UnboundedReceiver<TransportResult<Frame>>,
}

#[async_trait]
impl FrameStream for MemoryStream {
    async fn next_frame(&mut self) -> Option<TransportResult<Frame>> {
        self.rx.recv().await
    }
}

/// The remote end of an in-memory connection.
pub struct MemoryServer {
    inbound: mpsc::UnboundedReceiver<Frame>,
    outbound: Option<mpsc::UnboundedSender<TransportResult<Frame>>>,
    close_count: Arc<AtomicUsize>,
}

impl MemoryServer {
    /// Push a frame to the client. Returns false once the client is gone
    /// or the server has hung up.
    pub fn send(&self, frame: Frame) -> bool {
        self.outbound
            .as_ref()
            .is_some_and(|tx| tx.send(Ok(frame)).is_ok())
    }

    pub fn send_json(&self, value: Value) -> bool {
        self.send(Frame::Text(value.to_string()))
    }

    /// Make the client's next receive fail.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.outbound.as_ref().is_some_and(|tx| {
            tx.send(Err(TransportError::Receive(message.into())))
                .is_ok()
        })
    }

    /// End the stream; the client sees end-of-stream after queued frames.
    pub fn hang_up(&mut self) {
        self.outbound = None;
    }

    /// Next frame sent by the client, `None` once the client sink is dropped.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.inbound.recv().await
    }

    /// Next text frame sent by the client, parsed as JSON.
    pub async fn recv_json(&mut self) -> Option<Value> {
        loop {
            match self.recv().await? {
                Frame::Text(text) => return serde_json::from_str(&text).ok(),
                Frame::Binary(_) => continue,
            }
        }
    }

    /// Everything the client has sent so far, without waiting.
    pub fn drain(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.inbound.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Text frames sent so far, parsed as JSON.
    pub fn drain_json(&mut self) -> Vec<Value> {
        self.drain()
            .into_iter()
            .filter_map(|frame| match frame {
                Frame::Text(text) => serde_json::from_str(&text).ok(),
                Frame::Binary(_) => None,
            })
            .collect()
    }

    /// How many times the client closed its sink.
    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }
}
