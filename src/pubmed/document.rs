//! Minimal element tree built from `quick-xml` events.
//!
//! The tree is only as strict as the payload needs: tags must balance and the
//! document must have a root, otherwise the whole payload is rejected. Text
//! and attribute values are kept *escaped* and are decoded on access, so a bad
//! entity inside one record only fails that record.

use quick_xml::Reader;
use quick_xml::escape::{EscapeError, unescape};
use quick_xml::events::Event;
use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// Errors that reject an entire payload.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML syntax error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("unexpected closing tag </{0}>")]
    UnexpectedEnd(String),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("document has no root element")]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Element(Element),
    /// Escaped character data, including entity references.
    Text(String),
    /// CDATA content, already literal.
    CData(String),
}

/// An XML element keyed by its local name (prefix dropped).
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn new(name: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            name,
            attributes,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decoded value of an attribute, if present.
    pub fn attr(&self, name: &str) -> Option<Result<String, EscapeError>> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, raw)| unescape(raw).map(|v| v.into_owned()))
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Follow a `/`-separated path of direct children.
    pub fn path(&self, path: &str) -> Option<&Element> {
        path.split('/')
            .try_fold(self, |current, segment| current.child(segment))
    }

    /// First descendant (depth-first, document order) with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given name, in document order.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for child in self.elements() {
            if child.name == name {
                out.push(child);
            }
            child.collect_named(name, out);
        }
    }

    /// All text inside this element, including nested markup such as
    /// `<i>` or `<sup>`, decoded and trimmed.
    pub fn text(&self) -> Result<String, EscapeError> {
        let mut out = String::new();
        self.collect_text(&mut out)?;
        Ok(out.trim().to_string())
    }

    fn collect_text(&self, out: &mut String) -> Result<(), EscapeError> {
        for node in &self.children {
            match node {
                Node::Element(e) => e.collect_text(out)?,
                Node::Text(raw) => out.push_str(&unescape(raw)?),
                Node::CData(literal) => out.push_str(literal),
            }
        }
        Ok(())
    }
}

fn local_name(qname: &[u8]) -> String {
    let local = match qname.iter().position(|b| *b == b':') {
        Some(pos) => &qname[pos + 1..],
        None => qname,
    };
    String::from_utf8_lossy(local).into_owned()
}

fn open_element(start: &quick_xml::events::BytesStart<'_>) -> Result<Element, ParseError> {
    let name = local_name(start.name().as_ref());
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        attributes.push((
            local_name(attr.key.as_ref()),
            String::from_utf8_lossy(&attr.value).into_owned(),
        ));
    }
    Ok(Element::new(name, attributes))
}

/// Parse `xml` into its root element.
pub fn parse_document(xml: &str) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(xml);
    // Tracks open elements; the bottom entry is a synthetic holder for the root.
    let mut stack: Vec<Element> = vec![Element::new(String::new(), Vec::new())];

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(open_element(&start)?),
            Event::Empty(start) => {
                let element = open_element(&start)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Element(element));
                }
            }
            Event::End(end) => {
                let name = local_name(end.name().as_ref());
                if stack.len() < 2 {
                    return Err(ParseError::UnexpectedEnd(name));
                }
                let element = stack.pop().ok_or(ParseError::UnexpectedEnd(name))?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Element(element));
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .children
                        .push(Node::Text(String::from_utf8_lossy(&text).into_owned()));
                }
            }
            Event::GeneralRef(entity) => {
                if let Some(current) = stack.last_mut() {
                    let name = String::from_utf8_lossy(&entity);
                    current.children.push(Node::Text(format!("&{name};")));
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .children
                        .push(Node::CData(String::from_utf8_lossy(&data).into_owned()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() > 1 {
        let open = stack.pop().map(|e| e.name).unwrap_or_default();
        return Err(ParseError::Unclosed(open));
    }
    stack
        .pop()
        .and_then(|holder| {
            holder.children.into_iter().find_map(|node| match node {
                Node::Element(e) => Some(e),
                _ => None,
            })
        })
        .ok_or(ParseError::Empty)
}
