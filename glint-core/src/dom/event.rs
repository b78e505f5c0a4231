//! Events
//!
//! An [`Event`] names its type and carries arbitrary detail fields. Handler
//! expressions see it as a plain object bound to `event`.

use indexmap::IndexMap;

use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    bubbles: bool,
    detail: IndexMap<String, Value>,
    target: Option<Value>,
}

impl Event {
    /// A bubbling event of type `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles: true,
            detail: IndexMap::new(),
            target: None,
        }
    }

    /// Attach a detail field, visible to handlers as `event.<key>`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.detail.insert(key.into(), value.into());
        self
    }

    /// Deliver only to the target element.
    pub fn non_bubbling(mut self) -> Self {
        self.bubbles = false;
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.detail.get(key)
    }

    /// The target element as handlers see it, once dispatched.
    pub fn target(&self) -> Option<&Value> {
        self.target.as_ref()
    }

    pub(crate) fn set_target(&mut self, target: Value) {
        self.target = Some(target);
    }

    /// The object handlers see: `type`, `bubbles`, each detail field, and
    /// `target` once dispatched.
    pub fn to_value(&self) -> Value {
        let mut map = IndexMap::with_capacity(self.detail.len() + 3);
        map.insert("type".to_string(), Value::from(self.event_type.as_str()));
        map.insert("bubbles".to_string(), Value::from(self.bubbles));
        for (key, value) in &self.detail {
            map.insert(key.clone(), value.clone());
        }
        if let Some(target) = &self.target {
            map.insert("target".to_string(), target.clone());
        }
        Value::Object(std::sync::Arc::new(map))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_defaults_to_bubbling() {
        let event = Event::new("click");
        assert_eq!(event.event_type(), "click");
        assert!(event.bubbles());
        assert!(!event.non_bubbling().bubbles());
    }

    #[test]
    fn to_value_exposes_type_and_detail() {
        let event = Event::new("input").with("value", "abc").with("key", "c");
        let Value::Object(map) = event.to_value() else {
            panic!("event should be an object");
        };
        assert_eq!(map["type"], Value::from("input"));
        assert_eq!(map["value"], Value::from("abc"));
        assert_eq!(map["key"], Value::from("c"));
        assert!(!map.contains_key("target"));
    }

    #[test]
    fn target_is_included_once_set() {
        let mut event = Event::new("click");
        event.set_target(Value::object([("tagName", Value::from("button"))]));
        let Value::Object(map) = event.to_value() else {
            panic!("event should be an object");
        };
        assert_eq!(map["target"], Value::object([("tagName", Value::from("button"))]));
    }
}
