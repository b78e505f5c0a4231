//! Store Implementation
//!
//! A Store is the reactive state container: a map from key to [`Value`]
//! that notifies its subscribers whenever a write changes a value.
//!
//! # How Stores Work
//!
//! 1. All reads and writes go through [`Store::get`] and [`Store::set`].
//!
//! 2. A write is a change only when the new value is not strictly equal to
//!    the old one (see [`Value::strict_equals`]). The assignment always
//!    happens; notification happens only on change.
//!
//! 3. Subscribers run synchronously, in subscription order, before `set`
//!    returns. There is no batching: two changing writes mean two rounds of
//!    notification.
//!
//! # Sharing
//!
//! A store is a handle. Clones share one underlying map, so the handle the
//! host keeps and the one the binder evaluates against are the same
//! instance. Locks are released before subscribers run, which lets a
//! subscriber read and write the store re-entrantly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::subscriber::{Subscriber, SubscriberId};
use crate::error::StoreError;
use crate::value::Value;

/// Counter for generating unique store IDs.
static STORE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique store ID.
fn next_store_id() -> u64 {
    STORE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A reactive key-value state container.
///
/// # Example
///
/// ```rust
/// use glint_core::reactive::Store;
/// use glint_core::Value;
///
/// let store = Store::new([("count", 0)]);
/// assert_eq!(store.get("count"), Value::from(0));
///
/// assert!(store.set("count", 1));
/// assert!(!store.set("count", 1));
/// assert_eq!(store.get("missing"), Value::Undefined);
/// ```
#[derive(Clone)]
pub struct Store {
    /// Unique identifier for this store.
    id: u64,

    /// Current state, in key insertion order.
    values: Arc<RwLock<IndexMap<String, Value>>>,

    /// Change subscribers, notified in registration order.
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
}

impl Store {
    /// Create a store from an initial mapping.
    pub fn new<K, V, I>(initial: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let values = initial
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            id: next_store_id(),
            values: Arc::new(RwLock::new(values)),
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create an empty store.
    pub fn empty() -> Self {
        Self::new(std::iter::empty::<(String, Value)>())
    }

    /// Create a store from a JSON object.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        match serde_json::from_str::<serde_json::Value>(json)? {
            serde_json::Value::Object(map) => {
                Ok(Self::new(map.into_iter().map(|(k, v)| (k, Value::from(v)))))
            }
            serde_json::Value::Null => Err(StoreError::NotAnObject("null")),
            serde_json::Value::Bool(_) => Err(StoreError::NotAnObject("boolean")),
            serde_json::Value::Number(_) => Err(StoreError::NotAnObject("number")),
            serde_json::Value::String(_) => Err(StoreError::NotAnObject("string")),
            serde_json::Value::Array(_) => Err(StoreError::NotAnObject("array")),
        }
    }

    /// Get the store's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether both handles refer to the same store.
    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }

    /// Get the current value of `key`, or `Undefined` if it was never set.
    pub fn get(&self, key: &str) -> Value {
        self.values.read().get(key).cloned().unwrap_or_default()
    }

    /// Whether `key` has been set.
    pub fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    /// Assign `value` to `key` and notify subscribers if it changed.
    ///
    /// Returns whether the write was a change.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let value = value.into();

        let changed = {
            let mut values = self.values.write();
            let changed = values
                .get(&key)
                .map_or(true, |old| !old.strict_equals(&value));
            tracing::trace!(store = self.id, key = %key, changed, "store write");
            values.insert(key, value);
            changed
        };

        if changed {
            self.notify_subscribers();
        }
        changed
    }

    /// Update a value using a function of the current one.
    pub fn update<F>(&self, key: &str, f: F) -> bool
    where
        F: FnOnce(&Value) -> Value,
    {
        let new_value = f(&self.get(key));
        self.set(key, new_value)
    }

    /// Keys currently present, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Whether no key has been set.
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> IndexMap<String, Value> {
        self.values.read().clone()
    }

    /// Register a change subscriber.
    pub fn subscribe(&self, subscriber: Subscriber) -> SubscriberId {
        let id = subscriber.id();
        self.subscribers.write().push(subscriber);
        id
    }

    /// Remove a subscriber.
    pub fn unsubscribe(&self, subscriber_id: SubscriberId) {
        self.subscribers
            .write()
            .retain(|subscriber| subscriber.id() != subscriber_id);
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Notify all subscribers that a value has changed.
    fn notify_subscribers(&self) {
        let subscribers = self.subscribers.read().clone();
        for subscriber in &subscribers {
            subscriber.notify();
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("values", &*self.values.read())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
