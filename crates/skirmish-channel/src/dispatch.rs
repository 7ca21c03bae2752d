//! Push demultiplexer - routes inbound messages by entity-type key
//!
//! A single push may carry several entity keys at once. The whole message
//! is stored as latest-received first, then a processing pass fans each key
//! out to its subscribers, so one slow callback cannot block storage of the
//! next message. The stored message is discarded after a short grace window
//! to bound memory growth from rapid successive pushes. Discard is lazy:
//! the slot is cleared when queried past the window or overwritten by the
//! next message, so a quiet channel holds at most one stale message and
//! never hands it out.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use skirmish_core::{PushMessage, PushPayload, ENTITY_NOTIFICATION};

use crate::{Subscription, SubscriptionRegistry};

/// How long the latest inbound message stays queryable after delivery
pub const DISPATCH_GRACE: Duration = Duration::from_secs(1);

/// Delivery counters, in the spirit of a runtime stats block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub messages: u64,
    pub delivered: u64,
    pub panicked: u64,
    pub unrouted: u64,
}

struct Buffered {
    message: PushMessage,
    received_at: Instant,
}

/// Demultiplexer with a separate notification registry. Entity payloads are
/// passed through uninterpreted; the only structural inspection is the
/// notification-shape check on the `notification` key.
pub struct Dispatcher {
    entities: SubscriptionRegistry,
    notifications: SubscriptionRegistry,
    latest: Mutex<Option<Buffered>>,
    grace: Duration,
    messages: AtomicU64,
    delivered: AtomicU64,
    panicked: AtomicU64,
    unrouted: AtomicU64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_grace(DISPATCH_GRACE)
    }

    /// Build a dispatcher with a custom grace window (tests shrink it).
    pub fn with_grace(grace: Duration) -> Self {
        Dispatcher {
            entities: SubscriptionRegistry::new(),
            notifications: SubscriptionRegistry::new(),
            latest: Mutex::new(None),
            grace,
            messages: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
            unrouted: AtomicU64::new(0),
        }
    }

    /// Register interest in an entity-type key.
    pub fn subscribe(
        &self,
        entity_key: impl Into<String>,
        callback: impl Fn(&PushPayload) + Send + Sync + 'static,
    ) -> Subscription {
        self.entities.subscribe(entity_key, callback)
    }

    /// Register interest in user-directed notifications. These are routed
    /// by the shape of the `notification` field, not by channel identity.
    pub fn subscribe_notifications(
        &self,
        callback: impl Fn(&PushPayload) + Send + Sync + 'static,
    ) -> Subscription {
        self.notifications.subscribe(ENTITY_NOTIFICATION, callback)
    }

    /// Take delivery of one inbound message: buffer it whole, then run the
    /// processing pass. Each callback invocation is the single delivery of
    /// that value; consumers must not assume the buffer outlives the grace
    /// window.
    pub fn receive(&self, message: PushMessage) {
        self.messages.fetch_add(1, Ordering::Relaxed);
        *self.latest.lock() = Some(Buffered {
            message: message.clone(),
            received_at: Instant::now(),
        });
        self.process(&message);
    }

    /// The buffered latest message, if the grace window has not elapsed.
    ///
    /// An expired message is dropped here rather than by a timer, so it
    /// may linger in the slot until the next query or the next inbound
    /// message. At most one message is ever retained.
    pub fn latest(&self) -> Option<PushMessage> {
        let mut slot = self.latest.lock();
        match slot.as_ref() {
            Some(buffered) if buffered.received_at.elapsed() <= self.grace => {
                Some(buffered.message.clone())
            }
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            messages: self.messages.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            unrouted: self.unrouted.load(Ordering::Relaxed),
        }
    }

    fn process(&self, message: &PushMessage) {
        for (key, payload) in message.entries() {
            let callbacks = if key == ENTITY_NOTIFICATION && payload.is_entity_shaped() {
                self.notifications.snapshot(ENTITY_NOTIFICATION)
            } else {
                self.entities.snapshot(key)
            };

            if callbacks.is_empty() {
                self.unrouted.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key, "push key has no subscribers, ignoring");
                continue;
            }

            for callback in callbacks {
                // A panicking callback must not prevent delivery to the
                // remaining callbacks for the same message.
                let outcome = catch_unwind(AssertUnwindSafe(|| callback(payload)));
                match outcome {
                    Ok(()) => {
                        self.delivered.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(_) => {
                        self.panicked.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(key, "push subscriber panicked during delivery");
                    }
                }
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new()
    }
}
