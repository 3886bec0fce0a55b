//! Event bus: fan-out pub/sub of task-update events.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use crate::domain::{SubscriptionId, TaskUpdateEvent};

type SubscriberFn = Arc<dyn Fn(&TaskUpdateEvent) + Send + Sync>;

/// Fan-out pub/sub for `TaskUpdateEvent`.
///
/// Design:
/// - `publish` iterates a snapshot of the subscriber list taken outside
///   the lock, so a callback may unsubscribe (itself or others) without
///   deadlocking the publish loop.
/// - Each callback invocation is isolated: a panicking subscriber is
///   logged and skipped, delivery to the rest continues.
/// - Events for one task arrive in mutation order because the engine
///   publishes synchronously from its mutation path. There is no ordering
///   guarantee across tasks.
pub struct EventBus {
    subscribers: Mutex<HashMap<SubscriptionId, SubscriberFn>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a callback under a caller-supplied id.
    pub fn subscribe(
        &self,
        id: SubscriptionId,
        callback: impl Fn(&TaskUpdateEvent) + Send + Sync + 'static,
    ) {
        self.subscribers
            .lock()
            .unwrap()
            .insert(id, Arc::new(callback));
    }

    /// Remove a subscriber. Returns false if the id was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.lock().unwrap().remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    /// Deliver one event to every current subscriber.
    pub fn publish(&self, event: &TaskUpdateEvent) {
        // Snapshot under the lock, invoke outside it.
        let snapshot: Vec<(SubscriptionId, SubscriberFn)> = {
            let guard = self.subscribers.lock().unwrap();
            guard.iter().map(|(id, f)| (*id, Arc::clone(f))).collect()
        };

        for (id, callback) in snapshot {
            let result = catch_unwind(AssertUnwindSafe(|| callback(event)));
            if result.is_err() {
                tracing::warn!(subscription = %id, task = %event.task_id, "subscriber panicked during delivery");
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
