//! The realtime session loop.
//!
//! A [`Session`] ties the two directions of a connection together:
//!
//! - any number of outbound producers, each holding an [`EventSender`]
//! - one inbound consumer that polls the transport with a bounded wait,
//!   decodes each frame and hands it to an [`EventHandler`]
//!
//! A single writer task owns the transport sink, so producers never contend
//! for it. Shutdown is cooperative: the session runs on a child of the
//! caller's [`CancellationToken`], and every task re-checks it at each await
//! point.
//!
//! ```text
//! Idle -> Connected -> Active -> Draining -> Closed
//! ```

mod handler;
mod producer;

use std::{
    fmt,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use futures::future::BoxFuture;
pub use handler::{dispatch, EventHandler};
pub use producer::{paced, sequence, EventSender};
use producer::Outbound;
use realtime_protocol::realtime::{decode_str, WireDialect};
use tokio::{
    sync::{mpsc, watch},
    task::{JoinError, JoinSet},
    time::{timeout, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::{
    config::{DEFAULT_OUTBOUND_BUFFER, DEFAULT_RECEIVE_TIMEOUT},
    error::{SessionError, SessionResult},
    transport::{Frame, FrameSink, FrameStream, Transport, TransportError, TransportResult},
};

/// Tuning knobs for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on a single wait for an inbound frame. Also bounds how
    /// long draining waits for producers and for queued frames to flush.
    pub receive_timeout: Duration,
    pub dialect: WireDialect,
    /// Capacity of the outbound queue between producers and the writer.
    pub outbound_buffer: usize,
    /// End the session once every producer has finished.
    pub close_when_producers_done: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            dialect: WireDialect::default(),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            close_when_producers_done: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connected,
    Active,
    Draining,
    Closed,
}

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The token was cancelled, by the caller or through
    /// [`EventSender::request_shutdown`].
    Cancelled,
    /// The server ended the stream.
    EndOfStream,
    /// Every producer finished and the session was configured to stop then.
    ProducersDone,
    /// A transport, producer or handler error ended the session.
    Failed(String),
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("cancelled"),
            Self::EndOfStream => f.write_str("end of stream"),
            Self::ProducersDone => f.write_str("producers done"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Outcome of [`Session::run`].
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub reason: ShutdownReason,
    /// Frames written to the transport.
    pub frames_sent: u64,
    /// Frames read from the transport, of any kind.
    pub frames_received: u64,
    /// Frames decoded into a typed server event.
    pub events_dispatched: u64,
    /// JSON frames the decoder could not type.
    pub unparsed: u64,
    /// Binary or non-JSON frames.
    pub skipped: u64,
    pub elapsed: Duration,
}

impl SessionReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.reason, ShutdownReason::Failed(_))
    }
}

#[derive(Debug, Default)]
struct Counters {
    sent: AtomicU64,
    received: AtomicU64,
    dispatched: AtomicU64,
    unparsed: AtomicU64,
    skipped: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn report(&self, reason: ShutdownReason, elapsed: Duration) -> SessionReport {
        SessionReport {
            reason,
            frames_sent: self.sent.load(Ordering::Relaxed),
            frames_received: self.received.load(Ordering::Relaxed),
            events_dispatched: self.dispatched.load(Ordering::Relaxed),
            unparsed: self.unparsed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            elapsed,
        }
    }
}

type ProducerFuture = BoxFuture<'static, SessionResult<()>>;

/// One realtime conversation over one transport.
pub struct Session {
    config: SessionConfig,
    token: CancellationToken,
    state: watch::Sender<SessionState>,
    sender: EventSender,
    outbound: Option<mpsc::Receiver<Outbound>>,
    producers: Vec<(String, ProducerFuture)>,
    counters: Arc<Counters>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .field("producers", &self.producers.len())
            .finish()
    }
}

impl Session {
    /// Create an idle session. Cancelling `parent` shuts it down; internal
    /// failures never cancel `parent`.
    pub fn new(config: SessionConfig, parent: &CancellationToken) -> Self {
        let token = parent.child_token();
        let (tx, rx) = mpsc::channel(config.outbound_buffer.max(1));
        let sender = EventSender::new(tx, config.dialect, token.clone());
        let (state, _) = watch::channel(SessionState::Idle);

        Self {
            config,
            token,
            state,
            sender,
            outbound: Some(rx),
            producers: Vec::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Watch the lifecycle state.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// The session's own token, a child of the one passed to [`Session::new`].
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Register an outbound flow. It starts when [`Session::run`] does and is
    /// given a sender plus the session token to observe.
    pub fn add_producer<F, Fut>(&mut self, name: impl Into<String>, producer: F)
    where
        F: FnOnce(EventSender, CancellationToken) -> Fut,
        Fut: Future<Output = SessionResult<()>> + Send + 'static,
    {
        let future = producer(self.sender.clone(), self.token.clone());
        self.producers.push((name.into(), Box::pin(future)));
    }

    fn set_state(&self, state: SessionState) {
        self.state.send_replace(state);
        debug!(?state, "Session state changed");
    }

    /// Drive the session until it is cancelled, the server hangs up, every
    /// producer is done (if so configured) or something fails.
    ///
    /// The transport is closed exactly once before this returns. Failures are
    /// reported through [`SessionReport::reason`]; the only error returned is
    /// [`SessionError::AlreadyStarted`].
    pub async fn run<T, H>(&mut self, transport: T, handler: &mut H) -> SessionResult<SessionReport>
    where
        T: Transport,
        H: EventHandler + ?Sized,
    {
        let outbound = self.outbound.take().ok_or(SessionError::AlreadyStarted)?;
        let started = Instant::now();
        let receive_timeout = self.config.receive_timeout;

        let (sink, mut stream) = transport.split();
        self.set_state(SessionState::Connected);

        let writer_stop = CancellationToken::new();
        let mut writer = tokio::spawn(write_loop(
            sink,
            outbound,
            writer_stop.clone(),
            self.counters.clone(),
            receive_timeout,
        ));

        let mut producers = JoinSet::new();
        for (name, future) in self.producers.drain(..) {
            debug!(producer = %name, "Starting producer");
            producers.spawn(async move { (name, future.await) });
        }
        self.set_state(SessionState::Active);
        info!(
            producers = producers.len(),
            dialect = ?self.config.dialect,
            "Session active"
        );

        let mut writer_result = None;
        let reason = loop {
            if self.config.close_when_producers_done && producers.is_empty() {
                break ShutdownReason::ProducersDone;
            }

            tokio::select! {
                biased;

                _ = self.token.cancelled() => break ShutdownReason::Cancelled,

                joined = &mut writer => {
                    let reason = writer_failure(&joined);
                    writer_result = Some(joined);
                    break reason;
                }

                Some(joined) = producers.join_next(), if !producers.is_empty() => {
                    if let Some(reason) = producer_outcome(joined) {
                        break reason;
                    }
                }

                received = timeout(receive_timeout, stream.next_frame()) => match received {
                    Err(_) => trace!("No inbound frame within receive timeout"),
                    Ok(None) => break ShutdownReason::EndOfStream,
                    Ok(Some(Err(e))) => break ShutdownReason::Failed(e.to_string()),
                    Ok(Some(Ok(frame))) => match self.consume(frame, handler).await {
                        Ok(()) => {}
                        Err(SessionError::Cancelled) => break ShutdownReason::Cancelled,
                        Err(e) => break ShutdownReason::Failed(format!("handler: {e}")),
                    },
                },
            }
        };

        self.set_state(SessionState::Draining);
        match &reason {
            ShutdownReason::Failed(cause) => error!(%cause, "Session failed, draining"),
            reason => info!(%reason, "Session draining"),
        }
        self.token.cancel();

        // Producers get one receive cycle to notice the token.
        let drained = timeout(receive_timeout, async {
            while let Some(joined) = producers.join_next().await {
                producer_outcome(joined);
            }
        })
        .await;
        if drained.is_err() {
            warn!(
                remaining = producers.len(),
                "Producers ignored cancellation, aborting"
            );
        }
        producers.shutdown().await;

        // The writer abandons a stalled send when stopped and flushes for at
        // most one receive cycle. Anything past a second cycle is a hang.
        let writer_result = match writer_result {
            Some(joined) => Some(joined),
            None => {
                writer_stop.cancel();
                match timeout(receive_timeout * 2, &mut writer).await {
                    Ok(joined) => Some(joined),
                    Err(_) => {
                        writer.abort();
                        None
                    }
                }
            }
        };
        match writer_result {
            Some(Ok((mut sink, result))) => {
                if let Err(e) = result {
                    debug!(error = %e, "Writer stopped with error");
                }
                match timeout(receive_timeout, sink.close()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(error = %e, "Failed to close transport"),
                    Err(_) => warn!("Timed out closing transport"),
                }
            }
            Some(Err(e)) => error!(error = %e, "Writer task failed, transport not closed"),
            None => error!("Writer did not stop, aborted without closing transport"),
        }

        self.set_state(SessionState::Closed);
        let report = self.counters.report(reason, started.elapsed());
        info!(
            reason = %report.reason,
            sent = report.frames_sent,
            received = report.frames_received,
            unparsed = report.unparsed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Session closed"
        );
        Ok(report)
    }

    async fn consume<H>(&self, frame: Frame, handler: &mut H) -> SessionResult<()>
    where
        H: EventHandler + ?Sized,
    {
        Counters::bump(&self.counters.received);

        let text = match frame {
            Frame::Text(text) => text,
            Frame::Binary(bytes) => {
                debug!(len = bytes.len(), "Skipping binary frame");
                Counters::bump(&self.counters.skipped);
                return Ok(());
            }
        };

        let decoded = match decode_str(&text) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, frame = %text, "Skipping non-JSON frame");
                Counters::bump(&self.counters.skipped);
                return Ok(());
            }
        };

        if decoded.is_event() {
            Counters::bump(&self.counters.dispatched);
        } else {
            Counters::bump(&self.counters.unparsed);
        }
        trace!(event_type = ?decoded.event_type(), "Dispatching server frame");
        dispatch(handler, decoded, &self.sender).await
    }
}

/// Returns a shutdown reason if this producer's exit should end the session.
fn producer_outcome(
    joined: Result<(String, SessionResult<()>), JoinError>,
) -> Option<ShutdownReason> {
    match joined {
        Ok((name, Ok(()))) => {
            debug!(producer = %name, "Producer finished");
            None
        }
        Ok((name, Err(SessionError::Cancelled))) => {
            debug!(producer = %name, "Producer stopped by cancellation");
            None
        }
        Ok((name, Err(e))) => {
            error!(producer = %name, error = %e, "Producer failed");
            Some(ShutdownReason::Failed(format!("producer {name}: {e}")))
        }
        Err(e) if e.is_cancelled() => None,
        Err(e) => Some(ShutdownReason::Failed(format!("producer panicked: {e}"))),
    }
}

type WriterOutput<S> = (S, TransportResult<()>);

fn writer_failure<S>(joined: &Result<WriterOutput<S>, JoinError>) -> ShutdownReason {
    match joined {
        Ok((_, Err(e))) => ShutdownReason::Failed(e.to_string()),
        Ok((_, Ok(()))) => ShutdownReason::Failed(TransportError::Closed.to_string()),
        Err(e) => ShutdownReason::Failed(format!("writer panicked: {e}")),
    }
}

async fn send_outbound<S: FrameSink>(
    sink: &mut S,
    outbound: Outbound,
    counters: &Counters,
) -> TransportResult<()> {
    let Outbound { event_type, text } = outbound;
    sink.send(Frame::Text(text)).await?;
    Counters::bump(&counters.sent);
    trace!(event_type, "Sent client event");
    Ok(())
}

/// Sole owner of the sink. On `stop`, flushes what is already queued (bounded
/// by `flush_timeout`) and hands the sink back for closing.
///
/// A send still in flight when `stop` fires is dropped and nothing else is
/// flushed, since the sink is not accepting frames.
async fn write_loop<S: FrameSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Outbound>,
    stop: CancellationToken,
    counters: Arc<Counters>,
    flush_timeout: Duration,
) -> WriterOutput<S> {
    loop {
        let Some(outbound) = (tokio::select! {
            biased;
            _ = stop.cancelled() => None,
            next = rx.recv() => next,
        }) else {
            break;
        };
        let event_type = outbound.event_type;
        tokio::select! {
            biased;
            _ = stop.cancelled() => {
                warn!(event_type, "Dropped client event stalled in transport");
                rx.close();
                return (sink, Err(TransportError::Send(format!("{event_type} stalled"))));
            }
            sent = send_outbound(&mut sink, outbound, &counters) => {
                if let Err(e) = sent {
                    return (sink, Err(e));
                }
            }
        }
    }

    rx.close();
    let flush = async {
        while let Some(outbound) = rx.recv().await {
            send_outbound(&mut sink, outbound, &counters).await?;
        }
        Ok::<(), TransportError>(())
    };
    let result = match timeout(flush_timeout, flush).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Timed out flushing queued client events");
            Ok(())
        }
    };
    (sink, result)
}
