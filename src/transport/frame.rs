//! Outbound frame types and the bounded send queue.
//!
//! A frame is owned by exactly one side at a time: the producer until the
//! enqueue succeeds, the queue until the consumer takes it, and the writer
//! task until it is flushed to the wire. Frames still queued when a
//! connection drops are simply dropped with the queue contents.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Fixed capacity of the outbound queue.
pub const SEND_QUEUE_CAPACITY: usize = 10;

/// How long an enqueue may wait for queue space before failing.
pub const SEND_TIMEOUT: Duration = Duration::from_millis(1000);

// ============================================================================
// FrameKind
// ============================================================================

/// Discriminant of an outbound frame, used for stats and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// UTF-8 text frame (protocol payloads).
    Text,
    /// Keep-alive ping.
    Ping,
    /// Ping reply.
    Pong,
    /// Connection close.
    Close,
}

// ============================================================================
// OutboundFrame
// ============================================================================

/// One frame awaiting transmission, payload owned by the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// UTF-8 text payload.
    Text(String),
    /// Ping with echo payload.
    Ping(Vec<u8>),
    /// Pong echoing a received ping payload.
    Pong(Vec<u8>),
    /// Close frame, no payload.
    Close,
}

impl OutboundFrame {
    /// Returns the frame discriminant.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> FrameKind {
        match self {
            Self::Text(_) => FrameKind::Text,
            Self::Ping(_) => FrameKind::Ping,
            Self::Pong(_) => FrameKind::Pong,
            Self::Close => FrameKind::Close,
        }
    }

    /// Converts the frame into its wire representation.
    ///
    /// Every frame is sent complete (FIN set); fragmentation is never used.
    #[must_use]
    pub fn into_message(self) -> Message {
        match self {
            Self::Text(text) => Message::Text(text.into()),
            Self::Ping(payload) => Message::Ping(payload.into()),
            Self::Pong(payload) => Message::Pong(payload.into()),
            Self::Close => Message::Close(None),
        }
    }
}

// ============================================================================
// FrameQueue
// ============================================================================

/// Producer handle of the bounded outbound queue.
///
/// Cloneable; the single consumer is the connection driving task. An
/// enqueue that cannot find space within [`SEND_TIMEOUT`] fails with
/// [`Error::SendTimeout`] and the frame is dropped.
#[derive(Clone)]
pub struct FrameQueue {
    tx: mpsc::Sender<OutboundFrame>,
    enqueue_timeout: Duration,
}

impl FrameQueue {
    /// Creates the queue, returning the producer handle and consumer end.
    #[must_use]
    pub fn channel(
        capacity: usize,
        enqueue_timeout: Duration,
    ) -> (Self, mpsc::Receiver<OutboundFrame>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                enqueue_timeout,
            },
            rx,
        )
    }

    /// Enqueues a frame, waiting up to the enqueue timeout for space.
    ///
    /// # Errors
    ///
    /// - [`Error::SendTimeout`] if the queue stays full past the timeout
    /// - [`Error::InvalidState`] if the consumer is gone (client stopped)
    pub async fn enqueue(&self, frame: OutboundFrame) -> Result<()> {
        match timeout(self.enqueue_timeout, self.tx.send(frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(Error::invalid_state("outbound queue is closed")),
            Err(_) => Err(Error::send_timeout(self.enqueue_timeout.as_millis() as u64)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
