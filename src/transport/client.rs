//! Outbound WebSocket client and its connection state machine.
//!
//! One long-lived task owns the entire connection lifecycle: connect,
//! handshake validation, outbound queue draining, inbound frame decoding,
//! keep-alive scheduling and exponential-backoff reconnection. The task is
//! the only writer of [`ConnectionState`] and the only holder of the
//! socket.
//!
//! Lifecycle and payload events are delivered over an mpsc channel handed
//! out by [`WsClient::new`]; consumers never block the driving task.
//!
//! # State machine
//!
//! ```text
//! Idle -> Initializing -> Connecting -> Connected -> Disconnecting
//!             |               |            |              |
//!             v               v            v              v
//!           Error         Disconnected <---+--------------+
//!                             |  ^
//!                             v  |
//!                          Reconnecting -> Initializing
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};

use super::frame::{FrameQueue, OutboundFrame, SEND_QUEUE_CAPACITY, SEND_TIMEOUT};
use super::options::ClientOptions;

// ============================================================================
// Constants
// ============================================================================

/// Hard cap on the reconnect backoff delay.
pub const RECONNECT_DELAY_CAP: Duration = Duration::from_secs(60);

/// Consecutive attempts served at the base delay before doubling starts.
pub const RECONNECT_FLAT_ATTEMPTS: u32 = 3;

/// Poll interval while parked in Idle or Error.
const PARK_INTERVAL: Duration = Duration::from_millis(100);

/// Bound on waiting for the driving task during `stop`.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed keep-alive ping payload.
const PING_PAYLOAD: [u8; 4] = [0x12, 0x34, 0x56, 0x78];

// ============================================================================
// Types
// ============================================================================

/// Socket type produced by the connector (plain or TLS).
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of the socket.
type WsSink = SplitSink<WsStream, Message>;

// ============================================================================
// ConnectionState
// ============================================================================

/// Connection lifecycle state.
///
/// Exactly one state is active at any time; transitions are made only by
/// the driving task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// At rest; nothing running.
    Idle,
    /// Building the connect request.
    Initializing,
    /// Connect and handshake in flight.
    Connecting,
    /// Upgrade accepted; frames flowing.
    Connected,
    /// Stop requested; close frame being flushed.
    Disconnecting,
    /// Connection gone; resources being released.
    Disconnected,
    /// Waiting out the backoff delay.
    Reconnecting,
    /// Construction failed; parked until reset.
    Error,
}

/// Returns `true` if `from -> to` is a legal lifecycle transition.
///
/// Used as a debug guard on every state change; the `-> Idle` entries
/// from Initializing, Reconnecting and Error are the stop-driven resets.
#[must_use]
pub fn is_valid_transition(from: ConnectionState, to: ConnectionState) -> bool {
    use ConnectionState::*;
    matches!(
        (from, to),
        (Idle, Initializing)
            | (Initializing, Connecting)
            | (Initializing, Error)
            | (Initializing, Idle)
            | (Connecting, Connected)
            | (Connecting, Disconnected)
            | (Connected, Disconnected)
            | (Connected, Disconnecting)
            | (Disconnecting, Disconnected)
            | (Disconnected, Reconnecting)
            | (Disconnected, Idle)
            | (Reconnecting, Initializing)
            | (Reconnecting, Idle)
            | (Error, Idle)
    )
}

// ============================================================================
// ConnectionStats
// ============================================================================

/// Monotonic connection counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Frames transmitted.
    pub sent: u64,
    /// Complete text/binary frames received.
    pub received: u64,
    /// Reconnect cycles entered.
    pub reconnects: u64,
}

// ============================================================================
// WsEvent
// ============================================================================

/// Lifecycle and payload events emitted by the driving task.
///
/// Exactly one event is emitted per lifecycle change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsEvent {
    /// Handshake accepted; connection is live.
    Connected,
    /// Connection lost or closed; queued frames were discarded.
    Disconnected,
    /// A complete text (or binary, decoded as UTF-8) frame arrived.
    MessageReceived(String),
    /// A text frame was flushed to the wire.
    MessageSent(String),
    /// The machine entered the Error state.
    Error(String),
}

// ============================================================================
// Shared State
// ============================================================================

/// State shared between the handle and the driving task.
struct ClientShared {
    endpoint: Endpoint,
    options: ClientOptions,
    state: Mutex<ConnectionState>,
    sent: AtomicU64,
    received: AtomicU64,
    reconnects: AtomicU64,
    stop: AtomicBool,
    stop_notify: Notify,
    event_tx: mpsc::UnboundedSender<WsEvent>,
    queue: FrameQueue,
}

impl ClientShared {
    #[inline]
    fn stopping(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Records a state change, logging and debug-guarding the transition.
fn set_state(shared: &ClientShared, next: ConnectionState) {
    let mut state = shared.state.lock();
    if *state != next {
        debug_assert!(
            is_valid_transition(*state, next),
            "illegal transition {:?} -> {:?}",
            *state,
            next
        );
        debug!(from = ?*state, to = ?next, "connection state change");
        *state = next;
    }
}

/// Delivers an event; a dropped receiver is not an error.
fn emit(shared: &ClientShared, event: WsEvent) {
    if shared.event_tx.send(event).is_err() {
        trace!("event receiver dropped");
    }
}

// ============================================================================
// Backoff
// ============================================================================

/// Computes the delay before reconnect attempt `attempt` (1-based).
///
/// The base delay is served for the first [`RECONNECT_FLAT_ATTEMPTS`]
/// attempts of a streak; each further attempt doubles it, capped at
/// [`RECONNECT_DELAY_CAP`].
#[must_use]
pub fn reconnect_delay(base: Duration, attempt: u32) -> Duration {
    if attempt <= RECONNECT_FLAT_ATTEMPTS {
        return base.min(RECONNECT_DELAY_CAP);
    }
    let factor = 1u64
        .checked_shl(attempt - RECONNECT_FLAT_ATTEMPTS)
        .unwrap_or(u64::MAX);
    let ms = (base.as_millis() as u64).saturating_mul(factor);
    Duration::from_millis(ms).min(RECONNECT_DELAY_CAP)
}

// ============================================================================
// WsClient
// ============================================================================

/// Handle to the outbound connection client.
///
/// Construction parses and validates the endpoint; [`WsClient::start`]
/// spawns the driving task. All methods are non-blocking reads or bounded
/// waits; the handle is `Send + Sync`.
pub struct WsClient {
    shared: Arc<ClientShared>,
    frame_rx: Mutex<Option<mpsc::Receiver<OutboundFrame>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl WsClient {
    /// Creates a client for the configured endpoint.
    ///
    /// Returns the handle together with the lifecycle event receiver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the endpoint string is rejected by
    /// [`Endpoint::parse`].
    pub fn new(options: ClientOptions) -> Result<(Self, mpsc::UnboundedReceiver<WsEvent>)> {
        let endpoint = Endpoint::parse(&options.endpoint)?;
        info!(%endpoint, "client initialized");

        let (queue, frame_rx) = FrameQueue::channel(SEND_QUEUE_CAPACITY, SEND_TIMEOUT);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(ClientShared {
            endpoint,
            options,
            state: Mutex::new(ConnectionState::Idle),
            sent: AtomicU64::new(0),
            received: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
            stop: AtomicBool::new(false),
            stop_notify: Notify::new(),
            event_tx,
            queue,
        });

        Ok((
            Self {
                shared,
                frame_rx: Mutex::new(Some(frame_rx)),
                task: Mutex::new(None),
            },
            event_rx,
        ))
    }

    /// Starts the driving task.
    ///
    /// No-op if the task is already running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] once the client has been stopped;
    /// construct a new client to connect again.
    pub fn start(&self) -> Result<()> {
        let mut task = self.task.lock();
        if let Some(handle) = task.as_ref()
            && !handle.is_finished()
        {
            debug!("driving task already running");
            return Ok(());
        }

        let frame_rx = self
            .frame_rx
            .lock()
            .take()
            .ok_or_else(|| Error::invalid_state("client was stopped"))?;

        let shared = Arc::clone(&self.shared);
        *task = Some(tokio::spawn(run_state_machine(shared, frame_rx)));
        info!("client started");
        Ok(())
    }

    /// Requests shutdown and waits (bounded) for the driving task.
    ///
    /// Disables auto-reconnect, lets the machine flush a close frame if
    /// connected, and aborts the task if it fails to exit within
    /// [`STOP_TIMEOUT`].
    pub async fn stop(&self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        self.shared.stop_notify.notify_waiters();

        let handle = self.task.lock().take();
        if let Some(mut handle) = handle {
            match timeout(STOP_TIMEOUT, &mut handle).await {
                Ok(_) => debug!("driving task exited"),
                Err(_) => {
                    warn!("driving task did not exit in time, aborting");
                    handle.abort();
                }
            }
        }
        info!("client stopped");
    }

    /// Enqueues a frame for transmission.
    ///
    /// Ownership of the frame passes to the queue.
    ///
    /// # Errors
    ///
    /// - [`Error::SendTimeout`] if the queue stays full past its bound
    /// - [`Error::InvalidState`] if the client has been stopped
    pub async fn send(&self, frame: OutboundFrame) -> Result<()> {
        self.shared.queue.enqueue(frame).await
    }

    /// Enqueues a text frame.
    ///
    /// # Errors
    ///
    /// Same as [`WsClient::send`].
    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(OutboundFrame::Text(text.into())).await
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.lock()
    }

    /// Returns `true` if the connection is live.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Returns a snapshot of the monotonic counters.
    #[must_use]
    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            sent: self.shared.sent.load(Ordering::Relaxed),
            received: self.shared.received.load(Ordering::Relaxed),
            reconnects: self.shared.reconnects.load(Ordering::Relaxed),
        }
    }

    /// Returns the resolved endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.shared.endpoint
    }
}

// ============================================================================
// Driving Task
// ============================================================================

/// Outcome of one connected session.
enum SessionEnd {
    /// Peer closed, read failed or write failed.
    Lost,
    /// Stop requested; close frame already flushed.
    Stopped,
}

/// The connection state machine loop.
async fn run_state_machine(shared: Arc<ClientShared>, mut frame_rx: mpsc::Receiver<OutboundFrame>) {
    info!("connection task started");
    set_state(&shared, ConnectionState::Initializing);

    // Consecutive failed-cycle counter; resets on a successful handshake.
    // Distinct from the monotonic reconnect statistic.
    let mut attempt_streak: u32 = 0;
    let mut pending_request = None;

    loop {
        let state = *shared.state.lock();

        if shared.stopping()
            && matches!(
                state,
                ConnectionState::Idle
                    | ConnectionState::Initializing
                    | ConnectionState::Reconnecting
                    | ConnectionState::Error
            )
        {
            set_state(&shared, ConnectionState::Idle);
            break;
        }

        match state {
            ConnectionState::Idle => {
                park(&shared, PARK_INTERVAL).await;
            }

            ConnectionState::Initializing => {
                match shared.endpoint.request_url().into_client_request() {
                    Ok(request) => {
                        pending_request = Some(request);
                        set_state(&shared, ConnectionState::Connecting);
                    }
                    Err(err) => {
                        error!(error = %err, "failed to build connect request");
                        set_state(&shared, ConnectionState::Error);
                        emit(&shared, WsEvent::Error(err.to_string()));
                    }
                }
            }

            ConnectionState::Connecting => {
                let Some(request) = pending_request.take() else {
                    set_state(&shared, ConnectionState::Disconnected);
                    continue;
                };

                info!(endpoint = %shared.endpoint, "connecting");
                match timeout(shared.options.connect_timeout, connect_async(request)).await {
                    Ok(Ok((socket, response))) => {
                        info!(status = %response.status(), "websocket handshake accepted");
                        attempt_streak = 0;
                        set_state(&shared, ConnectionState::Connected);
                        emit(&shared, WsEvent::Connected);

                        let keepalive = spawn_keepalive(Arc::clone(&shared));
                        let end = drive_connected(&shared, socket, &mut frame_rx).await;
                        keepalive.abort();

                        if matches!(end, SessionEnd::Stopped) {
                            set_state(&shared, ConnectionState::Disconnecting);
                        }
                        set_state(&shared, ConnectionState::Disconnected);
                    }
                    Ok(Err(err)) => {
                        log_connect_failure(&err);
                        set_state(&shared, ConnectionState::Disconnected);
                    }
                    Err(_) => {
                        warn!(
                            timeout_ms = shared.options.connect_timeout.as_millis() as u64,
                            "connect attempt timed out"
                        );
                        set_state(&shared, ConnectionState::Disconnected);
                    }
                }
            }

            // Transient; the Connecting arm moves through it while
            // flushing the close frame.
            ConnectionState::Connected | ConnectionState::Disconnecting => {
                set_state(&shared, ConnectionState::Disconnected);
            }

            ConnectionState::Disconnected => {
                let discarded = drain_queue(&mut frame_rx);
                if discarded > 0 {
                    debug!(discarded, "dropped queued frames on disconnect");
                }
                emit(&shared, WsEvent::Disconnected);

                if shared.options.auto_reconnect && !shared.stopping() {
                    attempt_streak += 1;
                    shared.reconnects.fetch_add(1, Ordering::Relaxed);
                    set_state(&shared, ConnectionState::Reconnecting);
                } else {
                    set_state(&shared, ConnectionState::Idle);
                    if shared.stopping() {
                        break;
                    }
                }
            }

            ConnectionState::Reconnecting => {
                let delay = reconnect_delay(shared.options.reconnect_delay, attempt_streak);
                info!(
                    delay_ms = delay.as_millis() as u64,
                    attempt = attempt_streak,
                    "reconnecting after backoff"
                );
                park(&shared, delay).await;
                if !shared.stopping() {
                    set_state(&shared, ConnectionState::Initializing);
                }
            }

            ConnectionState::Error => {
                park(&shared, PARK_INTERVAL).await;
            }
        }
    }

    let discarded = drain_queue(&mut frame_rx);
    if discarded > 0 {
        debug!(discarded, "dropped queued frames on shutdown");
    }
    info!("connection task ended");
}

/// Drives one live connection until it is lost or stop is requested.
async fn drive_connected(
    shared: &ClientShared,
    socket: WsStream,
    frame_rx: &mut mpsc::Receiver<OutboundFrame>,
) -> SessionEnd {
    let (mut sink, mut reader) = socket.split();

    loop {
        let stopped = shared.stop_notify.notified();
        tokio::pin!(stopped);

        if shared.stopping() {
            return flush_close(&mut sink).await;
        }

        tokio::select! {
            frame = frame_rx.recv() => {
                let Some(frame) = frame else {
                    return SessionEnd::Lost;
                };
                if !transmit(shared, &mut sink, frame).await {
                    return SessionEnd::Lost;
                }
            }

            message = reader.next() => {
                match handle_inbound(shared, message) {
                    ReadOutcome::Continue => {}
                    ReadOutcome::Reply(frame) => {
                        if shared.queue.enqueue(frame).await.is_err() {
                            warn!("failed to enqueue pong reply");
                        }
                    }
                    ReadOutcome::Disconnect => return SessionEnd::Lost,
                }
            }

            _ = &mut stopped => {
                return flush_close(&mut sink).await;
            }
        }
    }
}

/// Flushes a close frame as part of the graceful stop path.
async fn flush_close(sink: &mut WsSink) -> SessionEnd {
    debug!("stop requested, flushing close frame");
    if let Err(err) = sink.send(Message::Close(None)).await {
        warn!(error = %err, "failed to send close frame");
    }
    SessionEnd::Stopped
}

/// Transmits one frame; returns `false` if the connection must be torn down.
async fn transmit(shared: &ClientShared, sink: &mut WsSink, frame: OutboundFrame) -> bool {
    let kind = frame.kind();
    let sent_text = match &frame {
        OutboundFrame::Text(text) => Some(text.clone()),
        _ => None,
    };

    trace!(?kind, "sending frame");
    match sink.send(frame.into_message()).await {
        Ok(()) => {
            shared.sent.fetch_add(1, Ordering::Relaxed);
            if let Some(text) = sent_text {
                emit(shared, WsEvent::MessageSent(text));
            }
            true
        }
        Err(err) => {
            warn!(error = %err, ?kind, "failed to send frame");
            false
        }
    }
}

/// What to do after one read.
enum ReadOutcome {
    Continue,
    Reply(OutboundFrame),
    Disconnect,
}

/// Decodes one inbound frame and updates counters/events.
fn handle_inbound(
    shared: &ClientShared,
    message: Option<std::result::Result<Message, WsError>>,
) -> ReadOutcome {
    match message {
        Some(Ok(Message::Text(text))) => {
            trace!(len = text.len(), "received text frame");
            shared.received.fetch_add(1, Ordering::Relaxed);
            emit(shared, WsEvent::MessageReceived(text.as_str().to_owned()));
            ReadOutcome::Continue
        }

        Some(Ok(Message::Binary(payload))) => {
            trace!(len = payload.len(), "received binary frame");
            shared.received.fetch_add(1, Ordering::Relaxed);
            emit(
                shared,
                WsEvent::MessageReceived(String::from_utf8_lossy(&payload).into_owned()),
            );
            ReadOutcome::Continue
        }

        Some(Ok(Message::Ping(payload))) => {
            trace!("received ping, replying with pong");
            ReadOutcome::Reply(OutboundFrame::Pong(payload.to_vec()))
        }

        Some(Ok(Message::Pong(_))) => {
            trace!("received pong");
            ReadOutcome::Continue
        }

        Some(Ok(Message::Close(close))) => {
            debug!(?close, "received close frame");
            ReadOutcome::Disconnect
        }

        // Raw frames are not surfaced by tungstenite outside manual mode.
        Some(Ok(Message::Frame(_))) => ReadOutcome::Continue,

        Some(Err(err)) => {
            warn!(error = %err, "read error");
            ReadOutcome::Disconnect
        }

        None => {
            debug!("socket stream ended");
            ReadOutcome::Disconnect
        }
    }
}

/// Keep-alive timer task; only ever enqueues ping frames.
///
/// The first ping fires after the shorter initial delay so a dead
/// connection is noticed quickly; afterwards the steady interval applies.
fn spawn_keepalive(shared: Arc<ClientShared>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut delay = shared.options.initial_ping_delay;
        loop {
            sleep(delay).await;
            trace!("keep-alive timer fired");
            if shared
                .queue
                .enqueue(OutboundFrame::Ping(PING_PAYLOAD.to_vec()))
                .await
                .is_err()
            {
                break;
            }
            delay = shared.options.ping_interval;
        }
    })
}

/// Discards every queued frame, returning how many were dropped.
fn drain_queue(frame_rx: &mut mpsc::Receiver<OutboundFrame>) -> usize {
    let mut discarded = 0;
    while frame_rx.try_recv().is_ok() {
        discarded += 1;
    }
    discarded
}

/// Sleeps up to `duration`, waking early on a stop request.
async fn park(shared: &ClientShared, duration: Duration) {
    let stopped = shared.stop_notify.notified();
    tokio::pin!(stopped);

    if shared.stopping() {
        return;
    }

    tokio::select! {
        _ = &mut stopped => {}
        _ = sleep(duration) => {}
    }
}

/// Logs a connect failure with its distinguishable reason.
fn log_connect_failure(err: &WsError) {
    match err {
        WsError::Http(response) => {
            let status = response.status().as_u16();
            match status {
                400 => error!(status, "handshake rejected: bad request, check URL and token"),
                401 => error!(status, "handshake rejected: unauthorized, invalid token"),
                _ => error!(status, "handshake rejected"),
            }
        }
        other => warn!(error = %other, "connect failed"),
    }
}

// ============================================================================
// Tests
// ============================================================================
