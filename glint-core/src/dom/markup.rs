//! Markup Reader
//!
//! Reads an HTML fragment into nodes. This is a small, strict reader for
//! authored templates rather than an HTML5 parser: tags must nest and close
//! properly (void elements excepted), and there is no implied-tag recovery.
//!
//! Supported: elements, quoted, unquoted and bare attributes, text,
//! comments, `<!doctype>` (skipped), void elements, self-closing `/>`, and
//! the common named and numeric character references.

use super::element::{is_void, Element};
use super::node::Node;
use crate::error::MarkupError;

/// Open elements beyond this depth are rejected.
pub const MAX_NESTING: usize = 512;

/// Parse `src` into its top-level nodes.
pub fn parse_fragment(src: &str) -> Result<Vec<Node>, MarkupError> {
    Reader::new(src).run()
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
    /// Open elements, innermost last.
    open: Vec<Element>,
    top: Vec<Node>,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            open: Vec::new(),
            top: Vec::new(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn push_node(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.append_child(node),
            None => self.top.push(node),
        }
    }

    fn run(mut self) -> Result<Vec<Node>, MarkupError> {
        while self.pos < self.src.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.comment()?;
            } else if rest.starts_with("</") {
                self.close_tag()?;
            } else if rest.starts_with("<!") {
                // doctype and similar declarations
                let end = rest.find('>').ok_or(MarkupError::UnexpectedEof("declaration"))?;
                self.pos += end + 1;
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                self.open_tag()?;
            } else {
                self.text();
            }
        }
        if let Some(unclosed) = self.open.last() {
            return Err(MarkupError::Unclosed(unclosed.tag().to_string()));
        }
        Ok(self.top)
    }

    fn comment(&mut self) -> Result<(), MarkupError> {
        let body = &self.rest()[4..];
        let end = body.find("-->").ok_or(MarkupError::UnexpectedEof("comment"))?;
        let text = body[..end].to_string();
        self.pos += 4 + end + 3;
        self.push_node(Node::Comment(text));
        Ok(())
    }

    fn text(&mut self) {
        let rest = self.rest();
        // A `<` that does not start a tag is literal text.
        let first = rest.chars().next().map_or(1, char::len_utf8);
        let end = rest[first..].find('<').map_or(rest.len(), |i| i + first);
        let raw = &rest[..end];
        self.pos += end;
        self.push_node(Node::Text(decode_entities(raw)));
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn tag_name(&mut self) -> Result<String, MarkupError> {
        let offset = self.pos;
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':');
        if name.is_empty() {
            return Err(MarkupError::MissingTagName(offset));
        }
        Ok(name.to_ascii_lowercase())
    }

    fn open_tag(&mut self) -> Result<(), MarkupError> {
        self.pos += 1;
        let mut element = Element::new(self.tag_name()?);
        let self_closing = loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(MarkupError::UnexpectedEof("tag"));
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                break true;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break false;
            }
            let name = self.take_while(|c| {
                !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\'')
            });
            if name.is_empty() {
                // stray `/` or quote inside a tag
                self.pos += self.rest().chars().next().map_or(1, char::len_utf8);
                continue;
            }
            let name = name.to_string();
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.attribute_value()?
            } else {
                String::new()
            };
            element.set_attribute(name, value);
        };

        if self_closing || is_void(element.tag()) {
            self.push_node(Node::Element(element));
        } else {
            if self.open.len() >= MAX_NESTING {
                return Err(MarkupError::Unclosed(element.tag().to_string()));
            }
            self.open.push(element);
        }
        Ok(())
    }

    fn attribute_value(&mut self) -> Result<String, MarkupError> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                let end = body
                    .find(quote)
                    .ok_or(MarkupError::UnexpectedEof("attribute value"))?;
                self.pos += end + 2;
                Ok(decode_entities(&body[..end]))
            }
            Some(_) => {
                let raw = self.take_while(|c| !c.is_whitespace() && c != '>');
                Ok(decode_entities(raw))
            }
            None => Err(MarkupError::UnexpectedEof("attribute value")),
        }
    }

    fn close_tag(&mut self) -> Result<(), MarkupError> {
        let offset = self.pos;
        self.pos += 2;
        let found = self.tag_name()?;
        self.skip_whitespace();
        if !self.rest().starts_with('>') {
            return Err(MarkupError::UnexpectedEof("closing tag"));
        }
        self.pos += 1;

        let Some(element) = self.open.pop() else {
            return Err(MarkupError::UnmatchedClose { tag: found, offset });
        };
        if element.tag() != found {
            return Err(MarkupError::MismatchedClose {
                expected: element.tag().to_string(),
                found,
                offset,
            });
        }
        self.push_node(Node::Element(element));
        Ok(())
    }
}

/// Replace character references with the characters they name. Unknown
/// references are left untouched.
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match rest.find(';').and_then(|semi| Some((semi, entity(&rest[1..semi])?))) {
            Some((semi, c)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn single(src: &str) -> Element {
        let mut nodes = parse_fragment(src).unwrap();
        assert_eq!(nodes.len(), 1, "expected one top-level node in {src:?}");
        match nodes.remove(0) {
            Node::Element(element) => element,
            other => panic!("expected an element, got {other:?}"),
        }
    }

    #[test]
    fn parses_nested_elements_and_text() {
        let el = single("<div><span>a</span> b <em>c</em></div>");
        assert_eq!(el.tag(), "div");
        assert_eq!(el.children().len(), 3);
        assert_eq!(el.text_content(), "a b c");
    }

    #[test]
    fn parses_attribute_forms() {
        let el = single(r#"<button @click="count = count + 1" class=primary disabled data-x='1'>go</button>"#);
        assert_eq!(el.attribute("@click"), Some("count = count + 1"));
        assert_eq!(el.attribute("class"), Some("primary"));
        assert_eq!(el.attribute("disabled"), Some(""));
        assert_eq!(el.attribute("data-x"), Some("1"));
    }

    #[test]
    fn attribute_values_may_contain_markup_characters() {
        let el = single(r#"<p @data="a > b ? 'yes' : 'no'"></p>"#);
        assert_eq!(el.attribute("@data"), Some("a > b ? 'yes' : 'no'"));
    }

    #[test]
    fn void_and_self_closing_elements() {
        let el = single("<form><input name=a><br/><custom-tag /></form>");
        let tags: Vec<&str> = el.child_elements().map(Element::tag).collect();
        assert_eq!(tags, ["input", "br", "custom-tag"]);
    }

    #[test]
    fn comments_and_doctype() {
        let nodes = parse_fragment("<!doctype html><!-- note --><p>x</p>").unwrap();
        assert!(matches!(&nodes[0], Node::Comment(c) if c == " note "));
        assert!(matches!(&nodes[1], Node::Element(_)));
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#65;&#x42; &bogus; &"), "a & b <c> AB &bogus; &");
        let el = single(r#"<p title="&quot;hi&quot;">1 &lt; 2</p>"#);
        assert_eq!(el.attribute("title"), Some("\"hi\""));
        assert_eq!(el.text_content(), "1 < 2");
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let el = single("<p>1 < 2</p>");
        assert_eq!(el.text_content(), "1 < 2");
    }

    #[test]
    fn tag_names_are_lowercased() {
        let el = single("<DIV></div>");
        assert_eq!(el.tag(), "div");
    }

    #[test]
    fn rejects_mismatched_close() {
        let err = parse_fragment("<div><span></div>").unwrap_err();
        assert_eq!(
            err,
            MarkupError::MismatchedClose {
                expected: "span".into(),
                found: "div".into(),
                offset: 11,
            }
        );
    }

    #[test]
    fn rejects_unclosed_and_unmatched() {
        assert_eq!(parse_fragment("<div>").unwrap_err(), MarkupError::Unclosed("div".into()));
        assert!(matches!(
            parse_fragment("</p>").unwrap_err(),
            MarkupError::UnmatchedClose { .. }
        ));
        assert_eq!(
            parse_fragment("<p title=\"x").unwrap_err(),
            MarkupError::UnexpectedEof("attribute value")
        );
    }

    #[test]
    fn display_round_trips() {
        let src = r#"<div id="app"><span @data="count">0</span><input value="a&amp;b"></div>"#;
        assert_eq!(single(src).to_string(), src);
    }
}
