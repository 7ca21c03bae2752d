//! Subscription registry - entity-type key to callback buckets
//!
//! Registries are owned objects, never module-level state: each channel
//! holds its own instance, so independent tests (and independent sessions)
//! cannot leak subscribers into each other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use skirmish_core::PushPayload;

/// Callback invoked once per inbound payload routed to its entity key
pub type UpdateCallback = Arc<dyn Fn(&PushPayload) + Send + Sync>;

#[derive(Default)]
struct RegistryInner {
    buckets: Mutex<HashMap<String, Vec<(u64, UpdateCallback)>>>,
    next_id: AtomicU64,
}

/// Mapping from entity-type key to a set of callbacks. Multiple independent
/// callbacks may register for the same key; each fires once per message
/// carrying that key.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
    inner: Arc<RegistryInner>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        SubscriptionRegistry::default()
    }

    /// Register interest in an entity-type key. The returned handle removes
    /// exactly this registration.
    pub fn subscribe(
        &self,
        entity_key: impl Into<String>,
        callback: impl Fn(&PushPayload) + Send + Sync + 'static,
    ) -> Subscription {
        let key = entity_key.into();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .buckets
            .lock()
            .entry(key.clone())
            .or_default()
            .push((id, Arc::new(callback)));

        Subscription {
            registry: Arc::clone(&self.inner),
            key,
            id,
            active: AtomicBool::new(true),
        }
    }

    /// Snapshot of the callbacks registered for a key, taken before any of
    /// them runs so one callback cannot mutate the set mid-delivery.
    pub fn snapshot(&self, entity_key: &str) -> Vec<UpdateCallback> {
        self.inner
            .buckets
            .lock()
            .get(entity_key)
            .map(|bucket| bucket.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default()
    }

    /// Number of callbacks registered for a key.
    pub fn subscriber_count(&self, entity_key: &str) -> usize {
        self.inner
            .buckets
            .lock()
            .get(entity_key)
            .map_or(0, |bucket| bucket.len())
    }

    /// Whether any key has subscribers.
    pub fn is_empty(&self) -> bool {
        self.inner.buckets.lock().is_empty()
    }
}

/// Handle removing one registration. `unsubscribe` is idempotent; dropping
/// the handle without calling it leaves the registration in place.
pub struct Subscription {
    registry: Arc<RegistryInner>,
    key: String,
    id: u64,
    active: AtomicBool,
}

impl Subscription {
    /// Remove this registration. Cleans up the key's bucket when it becomes
    /// empty. Safe to call more than once.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        let mut buckets = self.registry.buckets.lock();
        if let Some(bucket) = buckets.get_mut(&self.key) {
            bucket.retain(|(id, _)| *id != self.id);
            if bucket.is_empty() {
                buckets.remove(&self.key);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
