//! Shared storage area with change notifications.
//!
//! This module provides the process-wide key/value area that client
//! instances share, the analog of a browser's `localStorage`. Every
//! effective mutation is announced to subscribed listeners as a
//! [`StorageEvent`], which is what the fallback logout medium rides on:
//! a sentinel key is written and immediately removed, and receivers react
//! to the write event alone.
//!
//! Events carry the mutating instance's id (when the mutation came from a
//! coordinator) so an instance can ignore its own writes, the same way
//! native storage-change notifications never fire in the window that
//! performed the mutation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use uuid::Uuid;

/// Capacity of the change-event channel. Events are tiny and consumed
/// promptly; a lagging listener resubscribes to the tail.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A single storage mutation, as observed by listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// The key that changed.
    pub key: String,
    /// The value after the change. `None` means the key was removed.
    pub new_value: Option<String>,
    /// Instance that performed the mutation, when known.
    pub origin: Option<Uuid>,
}

/// Process-wide key/value area with per-mutation change events.
///
/// Cloning yields another handle onto the same area; all handles observe
/// the same values and the same event stream. Mutations that do not
/// change anything (setting a key to its current value, removing an
/// absent key) emit no event, matching native storage-change semantics.
#[derive(Debug, Clone)]
pub struct SharedStorage {
    inner: Arc<StorageInner>,
}

#[derive(Debug)]
struct StorageInner {
    values: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl SharedStorage {
    /// Creates a new, empty storage area.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(StorageInner {
                values: RwLock::new(HashMap::new()),
                events,
            }),
        }
    }

    /// Returns the current value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<String> {
        let values = self.inner.values.read().unwrap();
        values.get(key).cloned()
    }

    /// Sets `key` to `value`, notifying listeners when the value actually
    /// changed.
    pub fn set(&self, key: &str, value: &str) {
        self.set_tagged(key, value, None);
    }

    /// Removes `key`, notifying listeners when it was present.
    pub fn remove(&self, key: &str) {
        self.remove_tagged(key, None);
    }

    /// Subscribes to change events. Only mutations performed after the
    /// call are delivered.
    pub fn events(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.events.subscribe()
    }

    /// `set` with the mutating instance recorded on the event.
    pub(crate) fn set_tagged(&self, key: &str, value: &str, origin: Option<Uuid>) {
        let changed = {
            let mut values = self.inner.values.write().unwrap();
            values.insert(key.to_string(), value.to_string()).as_deref() != Some(value)
        };
        if changed {
            self.emit(StorageEvent {
                key: key.to_string(),
                new_value: Some(value.to_string()),
                origin,
            });
        }
    }

    /// `remove` with the mutating instance recorded on the event.
    pub(crate) fn remove_tagged(&self, key: &str, origin: Option<Uuid>) {
        let removed = {
            let mut values = self.inner.values.write().unwrap();
            values.remove(key).is_some()
        };
        if removed {
            self.emit(StorageEvent {
                key: key.to_string(),
                new_value: None,
                origin,
            });
        }
    }

    fn emit(&self, event: StorageEvent) {
        // No listeners is fine; a lone instance mutates into the void.
        let _ = self.inner.events.send(event);
    }
}

impl Default for SharedStorage {
    fn default() -> Self {
        Self::new()
    }
}
