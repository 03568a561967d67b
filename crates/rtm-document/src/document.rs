//! Document tree and XML ingress/egress
//!
//! A [`Document`] is an ordered tree of [`Element`]s. Sibling tags may repeat;
//! attribute names are unique per element and keep their insertion order.

use std::fmt::Write as _;
use std::str::FromStr;

use indexmap::IndexMap;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::path::{DocPath, Leaf};

/// XML declaration carried through parse and render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// `version` pseudo-attribute
    pub version: String,
    /// `encoding` pseudo-attribute, if present
    pub encoding: Option<String>,
}

/// Node of a document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    tag: String,
    attributes: IndexMap<String, String>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    /// Create an empty element
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Builder: set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder: append a child
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    #[inline]
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set attribute value, replacing any previous value in place
    #[inline]
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Remove attribute, keeping the order of the others
    #[inline]
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First child with the given tag
    #[must_use]
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// First child with the given tag (mutable)
    pub fn child_mut(&mut self, tag: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.tag == tag)
    }

    /// All children with the given tag
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Index of the first child with the given tag
    #[must_use]
    pub fn position(&self, tag: &str) -> Option<usize> {
        self.children.iter().position(|c| c.tag == tag)
    }

    /// Append a child as the last child
    #[inline]
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Insert a child at `index`
    #[inline]
    pub fn insert_child(&mut self, index: usize, child: Element) {
        self.children.insert(index, child);
    }

    /// Remove every child with the given tag, returning how many went
    pub fn remove_children(&mut self, tag: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|c| c.tag != tag);
        before - self.children.len()
    }

    /// First child with the given tag, created as the last child if missing
    pub fn child_or_insert(&mut self, tag: &str) -> &mut Element {
        let index = match self.position(tag) {
            Some(index) => index,
            None => {
                self.children.push(Element::new(tag));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    fn write_xml(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{indent}<{}", self.tag);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {name}=\"{}\"", escape(value.as_str()));
        }

        match (&self.text, self.children.is_empty()) {
            (None, true) => out.push_str("/>\n"),
            (Some(text), true) => {
                let _ = writeln!(out, ">{}</{}>", escape(text.as_str()), self.tag);
            }
            (text, false) => {
                out.push('>');
                if let Some(text) = text {
                    out.push_str(&escape(text.as_str()));
                }
                out.push('\n');
                for child in &self.children {
                    child.write_xml(out, depth + 1);
                }
                let _ = writeln!(out, "{indent}</{}>", self.tag);
            }
        }
    }
}

/// Value found at a [`DocPath`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node<'a> {
    /// An element
    Element(&'a Element),
    /// An attribute value
    Attribute(&'a str),
}

/// Structured input document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    declaration: Option<Declaration>,
    root: Element,
}

impl Document {
    /// Create a document around a root element
    #[inline]
    #[must_use]
    pub fn new(root: Element) -> Self {
        Self {
            declaration: None,
            root,
        }
    }

    /// Builder: attach an XML declaration
    #[inline]
    #[must_use]
    pub fn with_declaration(mut self, declaration: Declaration) -> Self {
        self.declaration = Some(declaration);
        self
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    #[inline]
    #[must_use]
    pub fn declaration(&self) -> Option<&Declaration> {
        self.declaration.as_ref()
    }

    /// Element at the given segments (first match at every step)
    #[must_use]
    pub fn element(&self, segments: &[String]) -> Option<&Element> {
        let (first, rest) = segments.split_first()?;
        if *first != self.root.tag {
            return None;
        }
        rest.iter()
            .try_fold(&self.root, |current, seg| current.child(seg))
    }

    /// Element at the given segments (mutable)
    pub fn element_mut(&mut self, segments: &[String]) -> Option<&mut Element> {
        let (first, rest) = segments.split_first()?;
        if *first != self.root.tag {
            return None;
        }
        rest.iter()
            .try_fold(&mut self.root, |current, seg| current.child_mut(seg))
    }

    /// Resolve a path to an element or attribute
    ///
    /// Every step selects the first matching child. For the `anchor:elem:tag`
    /// form resolution starts at the first `tag` sibling in the anchor's
    /// parent and continues through the inner steps. Deletion is wider: it
    /// removes all siblings sharing the final tag under the resolved parent.
    #[must_use]
    pub fn resolve(&self, path: &DocPath) -> Option<Node<'_>> {
        match path.leaf() {
            Leaf::Element => self.element(path.segments()).map(Node::Element),
            Leaf::Attribute(name) => self
                .element(path.segments())
                .and_then(|e| e.attribute(name))
                .map(Node::Attribute),
            Leaf::After(inserted) => {
                self.element(path.segments())?;
                let parent = self.element(path.parent()?.segments())?;
                let element = inserted
                    .chain()
                    .try_fold(parent, |current, seg| current.child(seg))?;
                match inserted.attribute() {
                    Some(name) => element.attribute(name).map(Node::Attribute),
                    None => Some(Node::Element(element)),
                }
            }
        }
    }

    /// Text or attribute value at a path
    #[must_use]
    pub fn value(&self, path: &DocPath) -> Option<&str> {
        match self.resolve(path)? {
            Node::Element(element) => element.text(),
            Node::Attribute(value) => Some(value),
        }
    }

    /// Convenience: text or attribute value at a textual path
    ///
    /// Returns `None` for unparsable paths.
    #[must_use]
    pub fn value_at(&self, path: &str) -> Option<&str> {
        let path = path.parse::<DocPath>().ok()?;
        self.value(&path)
    }

    /// Parse a document from XML text
    ///
    /// Comments, processing instructions and doctype declarations are dropped.
    /// Whitespace around text content is trimmed.
    ///
    /// # Errors
    /// Returns error if the text is not a well-formed single-root document
    pub fn parse_xml(input: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(true);

        let mut declaration = None;
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let position = reader.buffer_position() as u64;
            let event = reader
                .read_event()
                .map_err(|e| DocumentError::syntax(position, e))?;

            match event {
                Event::Decl(decl) => {
                    let version = decl
                        .version()
                        .map_err(|e| DocumentError::syntax(position, e))?;
                    let encoding = match decl.encoding() {
                        Some(enc) => Some(
                            String::from_utf8_lossy(
                                &enc.map_err(|e| DocumentError::syntax(position, e))?,
                            )
                            .into_owned(),
                        ),
                        None => None,
                    };
                    declaration = Some(Declaration {
                        version: String::from_utf8_lossy(&version).into_owned(),
                        encoding,
                    });
                }
                Event::Start(start) => stack.push(element_from_start(&start, position)?),
                Event::Empty(start) => {
                    let element = element_from_start(&start, position)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or(DocumentError::Syntax {
                        position,
                        message: "unexpected closing tag".to_string(),
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| DocumentError::syntax(position, e))?;
                    push_text(&mut stack, &text);
                }
                Event::CData(data) => {
                    let data = data.into_inner();
                    push_text(&mut stack, &String::from_utf8_lossy(&data));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(DocumentError::Unclosed(open.tag));
        }
        let root = root.ok_or(DocumentError::Empty)?;

        Ok(Self { declaration, root })
    }

    /// Render the document as indented XML
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        if let Some(decl) = &self.declaration {
            let _ = write!(out, "<?xml version=\"{}\"", decl.version);
            if let Some(encoding) = &decl.encoding {
                let _ = write!(out, " encoding=\"{encoding}\"");
            }
            out.push_str("?>\n");
        }
        self.root.write_xml(&mut out, 0);
        out
    }
}

impl FromStr for Document {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_xml(s)
    }
}

fn element_from_start(start: &BytesStart<'_>, position: u64) -> Result<Element, DocumentError> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DocumentError::syntax(position, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| DocumentError::syntax(position, e))?
            .into_owned();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DocumentError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_some() {
        return Err(DocumentError::MultipleRoots(element.tag));
    } else {
        *root = Some(element);
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(current) = stack.last_mut() {
        match &mut current.text {
            Some(existing) => existing.push_str(text),
            None => current.text = Some(text.to_string()),
        }
    }
}

/// Errors raised while reading a document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// Malformed XML
    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// No root element
    #[error("document has no root element")]
    Empty,

    /// A second top-level element
    #[error("document has more than one root element (found '{0}')")]
    MultipleRoots(String),

    /// Element opened but never closed
    #[error("element '{0}' is never closed")]
    Unclosed(String),
}

impl DocumentError {
    fn syntax(position: u64, error: impl std::fmt::Display) -> Self {
        Self::Syntax {
            position,
            message: error.to_string(),
        }
    }
}
