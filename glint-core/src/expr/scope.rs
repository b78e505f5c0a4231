//! Evaluation Contexts
//!
//! An expression's free identifiers resolve against a [`Scope`]. The two
//! scopes the binder uses are built over a [`Store`]:
//!
//! - [`SnapshotScope`] copies the store's values when created and rejects
//!   assignment. Display expressions run against one of these.
//! - [`StoreScope`] reads the store live and writes assignments straight
//!   through [`Store::set`], so every changing assignment notifies. Event
//!   handlers run against one of these, with the event bound as `event`.

use indexmap::IndexMap;

use crate::dom::Event;
use crate::error::ExprError;
use crate::reactive::Store;
use crate::value::Value;

/// Name under which handlers see the triggering event.
pub const EVENT_BINDING: &str = "event";

/// The name-to-value scope an expression runs against.
pub trait Scope {
    /// Resolve a name, or `None` if this scope does not bind it.
    fn lookup(&self, name: &str) -> Option<Value>;

    /// Assign a name.
    fn assign(&mut self, name: &str, value: Value) -> Result<(), ExprError>;

    /// Every name this scope binds.
    fn names(&self) -> Vec<String>;
}

/// Read-only copy of a store's state taken at construction.
#[derive(Debug, Clone, Default)]
pub struct SnapshotScope {
    values: IndexMap<String, Value>,
}

impl SnapshotScope {
    pub fn new(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn of(store: &Store) -> Self {
        Self::new(store.snapshot())
    }
}

impl Scope for SnapshotScope {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    fn assign(&mut self, name: &str, _value: Value) -> Result<(), ExprError> {
        Err(ExprError::ReadOnly(name.to_string()))
    }

    fn names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// Live, write-through view of a store.
pub struct StoreScope<'a> {
    store: &'a Store,
    event: Option<Value>,
}

impl<'a> StoreScope<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store, event: None }
    }

    /// Bind `event` for the duration of a handler.
    pub fn with_event(mut self, event: &Event) -> Self {
        self.event = Some(event.to_value());
        self
    }
}

impl Scope for StoreScope<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        if name == EVENT_BINDING {
            if let Some(event) = &self.event {
                return Some(event.clone());
            }
        }
        self.store.contains(name).then(|| self.store.get(name))
    }

    fn assign(&mut self, name: &str, value: Value) -> Result<(), ExprError> {
        if name == EVENT_BINDING && self.event.is_some() {
            return Err(ExprError::ReadOnly(name.to_string()));
        }
        self.store.set(name, value);
        Ok(())
    }

    fn names(&self) -> Vec<String> {
        let mut names = self.store.keys();
        if self.event.is_some() && !names.iter().any(|n| n == EVENT_BINDING) {
            names.push(EVENT_BINDING.to_string());
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_does_not_follow_later_writes() {
        let store = Store::new([("count", 1)]);
        let scope = SnapshotScope::of(&store);
        store.set("count", 2);
        assert_eq!(scope.lookup("count"), Some(Value::from(1)));
        assert_eq!(scope.lookup("other"), None);
    }

    #[test]
    fn snapshot_rejects_assignment() {
        let mut scope = SnapshotScope::of(&Store::new([("count", 1)]));
        assert_eq!(
            scope.assign("count", Value::from(2)),
            Err(ExprError::ReadOnly("count".into()))
        );
    }

    #[test]
    fn store_scope_writes_through() {
        let store = Store::new([("count", 1)]);
        let mut scope = StoreScope::new(&store);
        scope.assign("count", Value::from(5)).unwrap();
        assert_eq!(store.get("count"), Value::from(5));
        assert_eq!(scope.lookup("count"), Some(Value::from(5)));
    }

    #[test]
    fn store_scope_binds_event_read_only() {
        let store = Store::new([("count", 1)]);
        let event = Event::new("click");
        let mut scope = StoreScope::new(&store).with_event(&event);

        let bound = scope.lookup(EVENT_BINDING).unwrap();
        assert_eq!(bound.type_of(), "object");
        assert_eq!(scope.names(), vec!["count".to_string(), "event".to_string()]);
        assert!(scope.assign(EVENT_BINDING, Value::Null).is_err());
    }

    #[test]
    fn store_scope_without_event_treats_it_as_a_key() {
        let store = Store::empty();
        let mut scope = StoreScope::new(&store);
        assert_eq!(scope.lookup(EVENT_BINDING), None);
        scope.assign(EVENT_BINDING, Value::from(1)).unwrap();
        assert_eq!(store.get(EVENT_BINDING), Value::from(1));
    }
}
