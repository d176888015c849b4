//! Correlation table: correlation key -> one-shot reply action, with bounded lifetime.
//!
//! Every registration ends exactly once: either `deliver` removes it and invokes the callback,
//! or the expiry timer (or an explicit `expire`) removes it without invoking anything.
//! Removal and the triggering action happen under the same lock, so the first one wins and
//! the other finds nothing.

use crate::alexa::PlatformResponse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Callback invoked with the reply for a registered key.
pub type ReplyFn = Box<dyn FnOnce(PlatformResponse) + Send + 'static>;

struct Pending {
    on_reply: ReplyFn,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct Counters {
    delivered: AtomicU64,
    expired: AtomicU64,
    unmatched: AtomicU64,
}

/// Lifetime counters: replies delivered, registrations expired, deliveries that matched nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrelationStats {
    pub delivered: u64,
    pub expired: u64,
    pub unmatched: u64,
}

/// Shared, cloneable handle to one adapter's pending replies.
#[derive(Clone)]
pub struct CorrelationTable {
    inner: Arc<Mutex<HashMap<String, Pending>>>,
    counters: Arc<Counters>,
    timeout: Duration,
}

impl CorrelationTable {
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            counters: Arc::new(Counters::default()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Store `on_reply` under `key` and start its expiry timer.
    /// Returns false (and keeps the existing registration) if `key` is already registered.
    pub async fn register<F>(&self, key: impl Into<String>, on_reply: F) -> bool
    where
        F: FnOnce(PlatformResponse) + Send + 'static,
    {
        let key = key.into();
        let mut g = self.inner.lock().await;
        if g.contains_key(&key) {
            log::debug!("correlation: key {} already registered, ignoring", key);
            return false;
        }
        // The timer cannot touch the map before the insert below: it needs this lock.
        let timer = self.spawn_expiry(key.clone());
        g.insert(
            key,
            Pending {
                on_reply: Box::new(on_reply),
                timer,
            },
        );
        true
    }

    /// Hand `response` to the callback registered under `key`, once. Unmatched keys are a no-op.
    pub async fn deliver(&self, key: &str, response: PlatformResponse) -> bool {
        let pending = self.inner.lock().await.remove(key);
        match pending {
            Some(p) => {
                p.timer.abort();
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
                (p.on_reply)(response);
                true
            }
            None => {
                self.counters.unmatched.fetch_add(1, Ordering::Relaxed);
                log::debug!("correlation: no pending reply for {}, dropping", key);
                false
            }
        }
    }

    /// Drop the registration under `key` without invoking it. No-op if already gone.
    pub async fn expire(&self, key: &str) -> bool {
        match self.inner.lock().await.remove(key) {
            Some(p) => {
                p.timer.abort();
                self.counters.expired.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Drop every registration and cancel every timer. Callbacks are not invoked.
    pub async fn clear(&self) -> usize {
        let drained: Vec<Pending> = {
            let mut g = self.inner.lock().await;
            g.drain().map(|(_, p)| p).collect()
        };
        for p in &drained {
            p.timer.abort();
        }
        drained.len()
    }

    pub async fn is_pending(&self, key: &str) -> bool {
        self.inner.lock().await.contains_key(key)
    }

    /// Number of registrations still awaiting a reply.
    pub async fn pending(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub fn stats(&self) -> CorrelationStats {
        CorrelationStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            expired: self.counters.expired.load(Ordering::Relaxed),
            unmatched: self.counters.unmatched.load(Ordering::Relaxed),
        }
    }

    fn spawn_expiry(&self, key: String) -> JoinHandle<()> {
        let table = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(table.timeout).await;
            // Not `expire`: aborting our own handle here would be pointless.
            let removed = table.inner.lock().await.remove(&key);
            if removed.is_some() {
                table.counters.expired.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "correlation: no reply for {} within {:?}, dropping",
                    key,
                    table.timeout
                );
            }
        })
    }
}
