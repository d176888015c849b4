//! In-process event channel between the webhook and the adapter's consumer.
//!
//! Inbound events flow through one bounded mpsc queue read by `stream()` subscribers.
//! Replies are published under a correlation key and land in the [`CorrelationTable`].
//! One channel lives from `connect` to `disconnect`; after `close` nothing is accepted and
//! every stream ends.

use crate::activity::InboundEvent;
use crate::alexa::PlatformResponse;
use crate::correlation::CorrelationTable;
use crate::schema::{self, Operation};
use futures_util::Stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};

pub struct EventChannel {
    inbound_tx: mpsc::Sender<InboundEvent>,
    inbound_rx: Mutex<mpsc::Receiver<InboundEvent>>,
    closed_tx: watch::Sender<bool>,
    replies: CorrelationTable,
}

impl EventChannel {
    pub fn new(buffer: usize, reply_timeout: Duration) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer.max(1));
        let (closed_tx, _) = watch::channel(false);
        Self {
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            closed_tx,
            replies: CorrelationTable::new(reply_timeout),
        }
    }

    pub fn replies(&self) -> &CorrelationTable {
        &self.replies
    }

    pub fn is_closed(&self) -> bool {
        *self.closed_tx.borrow()
    }

    /// Queue an event for subscribers. Returns false once the channel is closed, or if the
    /// queue stays full for longer than the reply timeout.
    pub async fn publish_event(&self, event: InboundEvent) -> bool {
        let mut closed = self.closed_tx.subscribe();
        if *closed.borrow() {
            return false;
        }
        let key = event.correlation_key.clone();
        tokio::select! {
            biased;
            _ = closed.wait_for(|c| *c) => false,
            sent = tokio::time::timeout(self.replies.timeout(), self.inbound_tx.send(event)) => match sent {
                Ok(r) => r.is_ok(),
                Err(_) => {
                    log::warn!("events: queue full for {:?}, dropping {}", self.replies.timeout(), key);
                    false
                }
            },
        }
    }

    /// Route a reply to whichever request is waiting on `key`.
    pub async fn publish_reply(&self, key: &str, response: PlatformResponse) -> bool {
        self.replies.deliver(key, response).await
    }

    /// Next queued event, or None once the channel is closed. Events still queued at close
    /// are discarded: their replies were dropped with it.
    pub async fn next_event(&self) -> Option<InboundEvent> {
        let mut closed = self.closed_tx.subscribe();
        if *closed.borrow() {
            return None;
        }
        let mut rx = self.inbound_rx.lock().await;
        tokio::select! {
            biased;
            _ = closed.wait_for(|c| *c) => None,
            ev = rx.recv() => ev,
        }
    }

    /// Stop accepting events, end all streams, and drop every pending reply.
    pub async fn close(&self) {
        self.closed_tx.send_replace(true);
        let dropped = self.replies.clear().await;
        if dropped > 0 {
            log::info!("events: closed, {} pending replies dropped", dropped);
        }
    }

    /// Lazy stream of validated events. Each call starts a new stream over the shared queue.
    ///
    /// Events whose reply is no longer pending (expired while queued) are skipped. Events that
    /// fail validation are logged and skipped, and their pending reply is expired so the waiting
    /// request is acknowledged instead of held until timeout.
    pub fn stream(self: Arc<Self>) -> impl Stream<Item = InboundEvent> + Send + 'static {
        futures_util::stream::unfold(self, |channel| async move {
            loop {
                let event = channel.next_event().await?;
                if !channel.replies.is_pending(&event.correlation_key).await {
                    log::debug!("listen: skipping {}, no request is waiting", event.correlation_key);
                    continue;
                }
                let checked = serde_json::to_value(&event)
                    .map_err(|e| e.to_string())
                    .and_then(|v| schema::validate(&v, Operation::Event).map_err(|e| e.to_string()));
                match checked {
                    Ok(()) => return Some((event, channel)),
                    Err(e) => {
                        log::warn!("listen: dropping invalid event {}: {}", event.correlation_key, e);
                        channel.replies.expire(&event.correlation_key).await;
                    }
                }
            }
        })
    }
}
