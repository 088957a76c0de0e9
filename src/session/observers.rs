// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Session observer registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use super::SessionState;

type Callback = Arc<dyn Fn(&SessionState) + Send + Sync>;

/// Callbacks registered through [`super::SessionStore::observe`].
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: AtomicU64,
    callbacks: DashMap<u64, Callback>,
}

impl ObserverRegistry {
    pub(crate) fn register(self: &Arc<Self>, callback: Callback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks.insert(id, callback);

        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    /// Invoke every callback in registration order.
    ///
    /// Callbacks run outside the map locks, so a callback may drop its own
    /// subscription.
    pub(crate) fn notify(&self, state: &SessionState) {
        let mut snapshot: Vec<(u64, Callback)> = self
            .callbacks
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        snapshot.sort_by_key(|(id, _)| *id);

        for (_, callback) in snapshot {
            callback(state);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.callbacks.len()
    }
}

/// Handle returned by `observe`. Dropping it unregisters the callback.
#[must_use = "dropping a Subscription immediately unregisters the observer"]
pub struct Subscription {
    id: u64,
    registry: Weak<ObserverRegistry>,
}

impl Subscription {
    /// Stop receiving notifications.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.callbacks.remove(&self.id);
        }
    }
}
