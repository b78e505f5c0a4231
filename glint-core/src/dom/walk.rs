//! Tree Walker
//!
//! Depth-first, pre-order visits over an element subtree: the root first,
//! then each child element in document order, each fully before its next
//! sibling. Text and comment nodes are not visited.
//!
//! Both walks use an explicit stack so deep trees do not grow the call
//! stack. [`traverse_mut`] reads each element's children only after the
//! visitor has returned for it, so a visitor that replaces an element's
//! content is followed into the new content.

use super::element::Element;

/// Pre-order iterator over a subtree.
pub struct Preorder<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Preorder<'a> {
    pub fn new(root: &'a Element) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        // Reversed so the first child is popped next.
        let start = self.stack.len();
        self.stack.extend(element.child_elements());
        self.stack[start..].reverse();
        Some(element)
    }
}

/// Visit `root` and every descendant element in pre-order.
pub fn traverse<'a, F>(root: &'a Element, visitor: F)
where
    F: FnMut(&'a Element),
{
    Preorder::new(root).for_each(visitor);
}

/// Visit `root` and every descendant element in pre-order, mutably.
pub fn traverse_mut<F>(root: &mut Element, mut visitor: F)
where
    F: FnMut(&mut Element),
{
    let mut stack = vec![root];
    while let Some(element) = stack.pop() {
        visitor(&mut *element);
        let start = stack.len();
        stack.extend(element.child_elements_mut());
        stack[start..].reverse();
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::node::Node;

    /// div#a > (p#b > i#c), span#d
    fn tree() -> Element {
        Element::new("div")
            .with_attribute("id", "a")
            .with_child(
                Element::new("p")
                    .with_attribute("id", "b")
                    .with_child("text")
                    .with_child(Element::new("i").with_attribute("id", "c")),
            )
            .with_child(Element::new("span").with_attribute("id", "d"))
    }

    fn ids(root: &Element) -> Vec<String> {
        let mut seen = Vec::new();
        traverse(root, |el| seen.push(el.attribute("id").unwrap_or("").to_string()));
        seen
    }

    #[test]
    fn traverse_is_preorder_in_document_order() {
        assert_eq!(ids(&tree()), ["a", "b", "c", "d"]);
    }

    #[test]
    fn childless_root_visits_once() {
        let root = Element::new("body");
        assert_eq!(Preorder::new(&root).count(), 1);
    }

    #[test]
    fn traverse_mut_matches_traverse_order() {
        let mut root = tree();
        let mut seen = Vec::new();
        traverse_mut(&mut root, |el| seen.push(el.attribute("id").unwrap_or("").to_string()));
        assert_eq!(seen, ids(&root));
    }

    #[test]
    fn traverse_mut_follows_replaced_content() {
        let mut root = tree();
        let mut visited = 0;
        traverse_mut(&mut root, |el| {
            visited += 1;
            if el.attribute("id") == Some("b") {
                el.set_text_content("flat");
            }
        });
        // `i#c` was removed before the walker reached it.
        assert_eq!(visited, 3);
        assert_eq!(ids(&root), ["a", "b", "d"]);
    }

    #[test]
    fn iterative_walk_handles_deep_trees() {
        let mut root = Element::new("div");
        for _ in 0..2_000 {
            root = Element::new("div").with_child(root);
        }
        assert_eq!(Preorder::new(&root).count(), 2_001);
    }

    #[test]
    fn iterative_mutable_walk_handles_deep_trees() {
        let mut root = Element::new("div");
        for _ in 0..50_000 {
            root = Element::new("div").with_child(root);
        }
        let mut visited = 0;
        traverse_mut(&mut root, |el| {
            visited += 1;
            el.set_attribute("seen", "");
        });
        assert_eq!(visited, 50_001);
        assert_eq!(Preorder::new(&root).filter(|el| el.has_attribute("seen")).count(), 50_001);

        // Unwind by hand; the recursive drop would be as deep as the tree.
        let mut level = root;
        while let Some(Node::Element(child)) = level.take_children().pop() {
            level = child;
        }
    }
}
