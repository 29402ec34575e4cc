//! # Subscriber registry
//! Live observers and best-effort fan-out of text updates to them.
//!
//! Delivery is at-most-once with no acknowledgment. A failed push is counted
//! and ignored; membership only changes through `connect`/`disconnect`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use metrics::{counter, gauge};
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::error::DeliveryError;

pub type SubscriberId = u64;

/// Anything that can receive a pushed text message without blocking.
pub trait Subscriber: Send + Sync {
    fn push(&self, message: &str) -> Result<(), DeliveryError>;
}

/// Transport-side sink backed by a bounded queue drained by the connection task.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    tx: mpsc::Sender<String>,
}

impl ChannelSubscriber {
    /// Returns the sink and the receiver the connection task forwards from.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

impl Subscriber for ChannelSubscriber {
    fn push(&self, message: &str) -> Result<(), DeliveryError> {
        self.tx.try_send(message.to_string()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Lagging,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct SubscriberRegistry {
    members: RwLock<HashMap<SubscriberId, Arc<dyn Subscriber>>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id and register the sink under it.
    pub fn register(&self, sink: Arc<dyn Subscriber>) -> SubscriberId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connect(id, sink);
        id
    }

    /// Idempotent: connecting an existing id replaces its sink.
    pub fn connect(&self, id: SubscriberId, sink: Arc<dyn Subscriber>) {
        let n = {
            let mut members = self.members.write();
            members.insert(id, sink);
            members.len()
        };
        gauge!("subscribers_connected").set(n as f64);
        tracing::debug!(subscriber = id, connected = n, "subscriber connected");
    }

    /// Returns false if the id was not registered; that is not an error.
    pub fn disconnect(&self, id: SubscriberId) -> bool {
        let (removed, n) = {
            let mut members = self.members.write();
            let removed = members.remove(&id).is_some();
            (removed, members.len())
        };
        if removed {
            gauge!("subscribers_connected").set(n as f64);
            tracing::debug!(subscriber = id, connected = n, "subscriber disconnected");
        }
        removed
    }

    /// Push `message` to every member of a membership snapshot.
    pub fn broadcast(&self, message: &str) -> BroadcastReport {
        let snapshot: Vec<(SubscriberId, Arc<dyn Subscriber>)> = self
            .members
            .read()
            .iter()
            .map(|(id, s)| (*id, Arc::clone(s)))
            .collect();

        let mut report = BroadcastReport::default();
        for (id, sink) in snapshot {
            match sink.push(message) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    counter!("broadcast_delivery_failures_total").increment(1);
                    tracing::debug!(subscriber = id, error = %e, "delivery failed");
                }
            }
        }
        report
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }
}
