//! Outbound side of a session: the cloneable sender and built-in producers.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use realtime_protocol::realtime::{to_wire_string, ClientEvent, WireDialect};
use tokio::{
    sync::mpsc,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::{
    error::{SessionError, SessionResult},
    transport::TransportError,
};

/// A serialized client event waiting for the writer task.
#[derive(Debug)]
pub(crate) struct Outbound {
    pub event_type: &'static str,
    pub text: String,
}

/// Handle for sending client events into a running session.
///
/// Events are serialized with the session's [`WireDialect`] before they are
/// queued, so a malformed event fails at the call site. Clones share one
/// queue and each clone preserves its own send order.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Outbound>,
    dialect: WireDialect,
    token: CancellationToken,
    queued: Arc<AtomicU64>,
}

impl EventSender {
    pub(crate) fn new(
        tx: mpsc::Sender<Outbound>,
        dialect: WireDialect,
        token: CancellationToken,
    ) -> Self {
        Self {
            tx,
            dialect,
            token,
            queued: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queue an event for the writer, waiting if the queue is full.
    ///
    /// Fails with [`SessionError::Cancelled`] once the session is shutting
    /// down, including while waiting for queue space.
    pub async fn send(&self, event: ClientEvent) -> SessionResult<()> {
        if self.token.is_cancelled() {
            return Err(SessionError::Cancelled);
        }
        let text = to_wire_string(&event, self.dialect)?;
        let outbound = Outbound {
            event_type: event.event_type(),
            text,
        };
        tokio::select! {
            biased;
            _ = self.token.cancelled() => return Err(SessionError::Cancelled),
            sent = self.tx.send(outbound) => sent.map_err(|_| TransportError::Closed)?,
        }
        self.queued.fetch_add(1, Ordering::Relaxed);
        trace!(event_type = event.event_type(), "Queued client event");
        Ok(())
    }

    pub fn dialect(&self) -> WireDialect {
        self.dialect
    }

    /// Ask the session to wind down. Equivalent to cancelling its token.
    pub fn request_shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Events queued through this sender and all of its clones.
    pub fn queued(&self) -> u64 {
        self.queued.load(Ordering::Relaxed)
    }
}

/// Send `events` in order, stopping early if `token` is cancelled.
pub async fn sequence<I>(sender: EventSender, events: I, token: CancellationToken) -> SessionResult<()>
where
    I: IntoIterator<Item = ClientEvent>,
    I::IntoIter: Send,
{
    for event in events {
        if token.is_cancelled() {
            return Ok(());
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            sent = sender.send(event) => sent?,
        }
    }
    Ok(())
}

/// Send one event per `period`, the first immediately.
///
/// Events are pulled from the iterator only when due, so lazily built events
/// (timestamps, encoded chunks) reflect the moment they are sent. A slow
/// send delays the schedule rather than bursting to catch up.
pub async fn paced<I>(
    sender: EventSender,
    events: I,
    period: Duration,
    token: CancellationToken,
) -> SessionResult<()>
where
    I: IntoIterator<Item = ClientEvent>,
    I::IntoIter: Send,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for event in events {
        tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            _ = ticker.tick() => {}
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            sent = sender.send(event) => sent?,
        }
    }
    Ok(())
}
