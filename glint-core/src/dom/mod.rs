//! Host Document Tree
//!
//! A minimal document model for the binder to work on: a [`Document`] owns
//! a body [`Element`], elements own their children, and events are
//! delivered with [`Document::dispatch`].
//!
//! # How Dispatch Works
//!
//! 1. Under the document lock, the path from the body to the target is
//!    found and the matching listeners are collected: the target's first,
//!    then (for bubbling events) each ancestor's up to the body
//! 2. The lock is released
//! 3. Each collected listener runs in order
//!
//! Listeners therefore may read or rewrite the document, which the binder's
//! handlers do when their state writes trigger a render pass.

mod element;
mod event;
pub mod markup;
mod node;
pub mod walk;

pub use element::{is_void, Element, Listener, ListenerFn, VOID_ELEMENTS};
pub use event::Event;
pub use node::{Node, NodeId};
pub use walk::{traverse, traverse_mut, Preorder};

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::error::MarkupError;
use crate::value::Value;

/// Shared handle to a document tree.
///
/// Cloning a `Document` is cheap and yields a handle to the same tree.
#[derive(Clone)]
pub struct Document {
    body: Arc<Mutex<Element>>,
}

impl Document {
    /// Create a document around an existing body element.
    pub fn new(body: Element) -> Self {
        Self {
            body: Arc::new(Mutex::new(body)),
        }
    }

    /// A document with an empty `<body>`.
    pub fn empty() -> Self {
        Self::new(Element::new("body"))
    }

    /// Build a document from a markup fragment.
    ///
    /// If the fragment is a single `<body>` element it becomes the body;
    /// otherwise the fragment's nodes are placed inside a new `<body>`.
    pub fn parse(src: &str) -> Result<Self, MarkupError> {
        let mut nodes = markup::parse_fragment(src)?;
        let is_body = |node: &Node| node.as_element().is_some_and(|e| e.tag() == "body");
        let significant: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| !matches!(node, Node::Text(t) if t.trim().is_empty()))
            .filter(|(_, node)| !matches!(node, Node::Comment(_)))
            .map(|(i, _)| i)
            .collect();
        if let [only] = significant[..] {
            if is_body(&nodes[only]) {
                if let Node::Element(body) = nodes.swap_remove(only) {
                    return Ok(Self::new(body));
                }
            }
        }
        let mut body = Element::new("body");
        for node in nodes {
            body.append_child(node);
        }
        Ok(Self::new(body))
    }

    /// Whether both handles share one tree.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }

    /// Node id of the body element.
    pub fn body_id(&self) -> NodeId {
        self.body.lock().id()
    }

    /// Run `f` with shared access to the body.
    ///
    /// The document is locked for the duration; `f` must not call back into
    /// this document.
    pub fn with_body<R>(&self, f: impl FnOnce(&Element) -> R) -> R {
        f(&*self.body.lock())
    }

    /// Run `f` with exclusive access to the body.
    pub fn with_body_mut<R>(&self, f: impl FnOnce(&mut Element) -> R) -> R {
        f(&mut *self.body.lock())
    }

    /// Run `f` on the element `id`, if it is in the tree.
    pub fn with_element<R>(&self, id: NodeId, f: impl FnOnce(&Element) -> R) -> Option<R> {
        self.body.lock().find(id).map(f)
    }

    /// Run `f` with exclusive access to the element `id`, if it is in the tree.
    pub fn with_element_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut Element) -> R) -> Option<R> {
        self.body.lock().find_mut(id).map(f)
    }

    /// Text content of the element `id`.
    pub fn text_content(&self, id: NodeId) -> Option<String> {
        self.with_element(id, Element::text_content)
    }

    /// Node id of the first element whose `id` attribute is `html_id`.
    pub fn get_element_by_id(&self, html_id: &str) -> Option<NodeId> {
        self.body.lock().element_by_html_id(html_id).map(Element::id)
    }

    /// Node ids of every element carrying attribute `name`, in document order.
    pub fn elements_with_attribute(&self, name: &str) -> Vec<NodeId> {
        let body = self.body.lock();
        Preorder::new(&*body)
            .filter(|element| element.has_attribute(name))
            .map(Element::id)
            .collect()
    }

    /// Serialize the body as markup.
    pub fn to_markup(&self) -> String {
        self.body.lock().to_string()
    }

    /// Deliver `event` to `target` and, if it bubbles, to each ancestor.
    ///
    /// Returns the number of listeners invoked; zero if `target` is not in
    /// the tree.
    pub fn dispatch(&self, target: NodeId, mut event: Event) -> usize {
        let listeners = {
            let body = self.body.lock();
            let Some(path) = body.path_to(target) else {
                tracing::trace!(%target, event_type = event.event_type(), "dispatch target not in document");
                return 0;
            };
            let mut listeners = Vec::new();
            let mut first = true;
            for id in path.iter().rev() {
                if !first && !event.bubbles() {
                    break;
                }
                if let Some(element) = body.find(*id) {
                    if first {
                        event.set_target(target_value(element));
                    }
                    listeners.extend(element.listeners_for(event.event_type()));
                }
                first = false;
            }
            listeners
        };

        tracing::trace!(
            %target,
            event_type = event.event_type(),
            listeners = listeners.len(),
            "dispatching event"
        );
        for listener in &listeners {
            listener.invoke(&event);
        }
        listeners.len()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("body", &self.body_id())
            .finish()
    }
}

/// How an event's target element appears to handlers: `tagName`, `id`, and
/// each of its attributes.
fn target_value(element: &Element) -> Value {
    let mut map = IndexMap::new();
    map.insert("tagName".to_string(), Value::from(element.tag().to_ascii_uppercase()));
    map.insert(
        "id".to_string(),
        Value::from(element.attribute("id").unwrap_or_default()),
    );
    for (name, value) in element.attributes() {
        map.entry(name.to_string()).or_insert_with(|| Value::from(value));
    }
    Value::Object(Arc::new(map))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_listener(event_type: &str, hits: &Arc<AtomicUsize>) -> Listener {
        let hits = Arc::clone(hits);
        Listener::new(event_type, move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn parse_wraps_fragment_in_body() {
        let doc = Document::parse("<p>a</p><p>b</p>").unwrap();
        doc.with_body(|body| {
            assert_eq!(body.tag(), "body");
            assert_eq!(body.child_elements().count(), 2);
        });
    }

    #[test]
    fn parse_keeps_explicit_body() {
        let doc = Document::parse("\n<body class=main><p>a</p></body>\n").unwrap();
        doc.with_body(|body| {
            assert_eq!(body.attribute("class"), Some("main"));
            assert_eq!(body.child_elements().count(), 1);
        });
    }

    #[test]
    fn get_element_by_id_and_text() {
        let doc = Document::parse(r#"<div><span id="out">hello</span></div>"#).unwrap();
        let out = doc.get_element_by_id("out").unwrap();
        assert_eq!(doc.text_content(out).as_deref(), Some("hello"));
        assert!(doc.get_element_by_id("missing").is_none());
    }

    #[test]
    fn dispatch_bubbles_target_first() {
        let doc = Document::parse(r#"<div id="outer"><button id="btn">x</button></div>"#).unwrap();
        let outer = doc.get_element_by_id("outer").unwrap();
        let btn = doc.get_element_by_id("btn").unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        for (id, name) in [(outer, "outer"), (btn, "btn")] {
            let order = Arc::clone(&order);
            doc.with_element_mut(id, |el| {
                el.add_listener(Listener::new("click", move |_| order.lock().push(name)));
            });
        }

        assert_eq!(doc.dispatch(btn, Event::new("click")), 2);
        assert_eq!(*order.lock(), ["btn", "outer"]);
    }

    #[test]
    fn non_bubbling_event_stays_on_target() {
        let doc = Document::parse(r#"<div id="outer"><input id="field"></div>"#).unwrap();
        let outer = doc.get_element_by_id("outer").unwrap();
        let field = doc.get_element_by_id("field").unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        doc.with_element_mut(outer, |el| el.add_listener(counter_listener("focus", &hits)));

        assert_eq!(doc.dispatch(field, Event::new("focus").non_bubbling()), 0);
        assert_eq!(doc.dispatch(field, Event::new("focus")), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispatch_to_unknown_target_invokes_nothing() {
        let doc = Document::empty();
        assert_eq!(doc.dispatch(NodeId::new(), Event::new("click")), 0);
    }

    #[test]
    fn listeners_may_mutate_the_document() {
        let doc = Document::parse(r#"<p id="label">before</p><button id="btn"></button>"#).unwrap();
        let label = doc.get_element_by_id("label").unwrap();
        let btn = doc.get_element_by_id("btn").unwrap();
        let handle = doc.clone();
        doc.with_element_mut(btn, |el| {
            el.add_listener(Listener::new("click", move |_| {
                handle.with_element_mut(label, |p| p.set_text_content("after"));
            }));
        });

        doc.dispatch(btn, Event::new("click"));
        assert_eq!(doc.text_content(label).as_deref(), Some("after"));
    }

    #[test]
    fn dispatch_sets_target() {
        let doc = Document::parse(r#"<input id="name" value="Ann">"#).unwrap();
        let input = doc.get_element_by_id("name").unwrap();
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        doc.with_element_mut(input, |el| {
            el.add_listener(Listener::new("input", move |event| {
                *slot.lock() = event.target().cloned();
            }));
        });

        doc.dispatch(input, Event::new("input"));
        let target = seen.lock().clone().unwrap();
        let Value::Object(map) = target else {
            panic!("target should be an object");
        };
        assert_eq!(map["tagName"], Value::from("INPUT"));
        assert_eq!(map["value"], Value::from("Ann"));
    }

    #[test]
    fn elements_with_attribute_in_document_order() {
        let doc = Document::parse(r#"<b @data="a"></b><i><u @data="b"></u></i><s></s>"#).unwrap();
        let found = doc.elements_with_attribute("@data");
        assert_eq!(found.len(), 2);
        assert_eq!(doc.with_element(found[1], |el| el.tag().to_string()).as_deref(), Some("u"));
    }
}
