//! Elements
//!
//! An [`Element`] has a tag, ordered attributes, child nodes and the
//! listeners registered on it.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::event::Event;
use super::node::{Node, NodeId};

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Callback invoked when a matching event reaches an element.
pub type ListenerFn = dyn Fn(&Event) + Send + Sync;

/// A listener registered for one event type.
#[derive(Clone)]
pub struct Listener {
    event_type: String,
    callback: Arc<ListenerFn>,
}

impl Listener {
    pub fn new<F>(event_type: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        Self {
            event_type: event_type.into(),
            callback: Arc::new(callback),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn invoke(&self, event: &Event) {
        (self.callback)(event);
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

/// An element in a document tree.
///
/// A clone keeps the original's [`NodeId`] and listeners.
#[derive(Debug, Clone)]
pub struct Element {
    id: NodeId,
    tag: String,
    attributes: IndexMap<String, String>,
    children: Vec<Node>,
    listeners: Vec<Listener>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            tag: tag.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Builder form of [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder form of [`append_child`](Self::append_child).
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.append_child(child);
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    // ------------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------------

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    /// Attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // ------------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------------

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn append_child(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Detach and return every child, leaving the element empty.
    pub fn take_children(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    /// Child elements in document order, skipping text and comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
                Node::Comment(_) => {}
            }
        }
    }

    /// Replace every child with a single text node.
    ///
    /// The text is stored as-is; markup characters in it are not parsed.
    pub fn set_text_content(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
    }

    // ------------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------------

    pub fn add_listener(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    /// Listeners for `event_type`, in registration order.
    pub fn listeners_for(&self, event_type: &str) -> Vec<Listener> {
        self.listeners
            .iter()
            .filter(|l| l.event_type == event_type)
            .cloned()
            .collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    /// Find an element in this subtree by node id.
    pub fn find(&self, id: NodeId) -> Option<&Element> {
        if self.id == id {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        if self.id == id {
            return Some(self);
        }
        self.child_elements_mut().find_map(|child| child.find_mut(id))
    }

    /// Ids from this element down to `id`, both ends included.
    pub fn path_to(&self, id: NodeId) -> Option<Vec<NodeId>> {
        if self.id == id {
            return Some(vec![self.id]);
        }
        self.child_elements().find_map(|child| {
            child.path_to(id).map(|mut path| {
                path.insert(0, self.id);
                path
            })
        })
    }

    /// First element in this subtree whose `id` attribute is `html_id`.
    pub fn element_by_html_id(&self, html_id: &str) -> Option<&Element> {
        super::walk::Preorder::new(self).find(|element| element.attribute("id") == Some(html_id))
    }
}

fn escape_text(text: &str, out: &mut fmt::Formatter<'_>) -> fmt::Result {
    for c in text.chars() {
        match c {
            '&' => out.write_str("&amp;")?,
            '<' => out.write_str("&lt;")?,
            '>' => out.write_str("&gt;")?,
            c => fmt::Write::write_char(out, c)?,
        }
    }
    Ok(())
}

fn escape_attribute(value: &str, out: &mut fmt::Formatter<'_>) -> fmt::Result {
    for c in value.chars() {
        match c {
            '&' => out.write_str("&amp;")?,
            '"' => out.write_str("&quot;")?,
            '<' => out.write_str("&lt;")?,
            c => fmt::Write::write_char(out, c)?,
        }
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(element) => fmt::Display::fmt(element, f),
            Node::Text(text) => escape_text(text, f),
            Node::Comment(text) => write!(f, "<!--{text}-->"),
        }
    }
}

/// Serializes the element and its subtree as markup.
impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attributes {
            write!(f, " {name}")?;
            if !value.is_empty() {
                f.write_str("=\"")?;
                escape_attribute(value, f)?;
                f.write_str("\"")?;
            }
        }
        f.write_str(">")?;
        if is_void(&self.tag) {
            return Ok(());
        }
        for child in &self.children {
            fmt::Display::fmt(child, f)?;
        }
        write!(f, "</{}>", self.tag)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample() -> Element {
        Element::new("div")
            .with_attribute("id", "root")
            .with_child(Element::new("span").with_attribute("@data", "count").with_child("0"))
            .with_child(" and ")
            .with_child(Element::new("b").with_child("bold"))
    }

    #[test]
    fn attributes_keep_order() {
        let mut el = Element::new("input")
            .with_attribute("type", "text")
            .with_attribute("@input", "v = 1");
        el.set_attribute("value", "x");
        let names: Vec<&str> = el.attributes().map(|(n, _)| n).collect();
        assert_eq!(names, ["type", "@input", "value"]);
        assert_eq!(el.remove_attribute("type").as_deref(), Some("text"));
        assert!(!el.has_attribute("type"));
    }

    #[test]
    fn text_content_concatenates_descendants() {
        assert_eq!(sample().text_content(), "0 and bold");
    }

    #[test]
    fn set_text_content_replaces_children() {
        let mut el = sample();
        el.set_text_content("<b>not markup</b>");
        assert_eq!(el.children().len(), 1);
        assert_eq!(el.child_elements().count(), 0);
        assert_eq!(el.text_content(), "<b>not markup</b>");

        el.set_text_content("");
        assert!(el.children().is_empty());
    }

    #[test]
    fn listeners_filter_by_type() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let mut el = Element::new("button");
        el.add_listener(Listener::new("click", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        el.add_listener(Listener::new("input", |_| {}));

        let clicks = el.listeners_for("click");
        assert_eq!(clicks.len(), 1);
        clicks[0].invoke(&Event::new("click"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(el.listener_count(), 2);
    }

    #[test]
    fn find_and_path() {
        let root = sample();
        let span_id = root.child_elements().next().unwrap().id();
        assert_eq!(root.find(span_id).map(Element::tag), Some("span"));
        assert_eq!(root.path_to(span_id), Some(vec![root.id(), span_id]));
        assert!(root.path_to(NodeId::new()).is_none());
        assert_eq!(root.element_by_html_id("root").map(Element::id), Some(root.id()));
    }

    #[test]
    fn display_writes_markup() {
        let el = Element::new("p")
            .with_attribute("title", "a \"b\"")
            .with_attribute("hidden", "")
            .with_child("1 < 2")
            .with_child(Element::new("br"));
        assert_eq!(el.to_string(), r#"<p title="a &quot;b&quot;" hidden>1 &lt; 2<br></p>"#);
    }
}
