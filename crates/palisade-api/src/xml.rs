// Generic XML element tree for the device's configuration grammar.
//
// The configuration API speaks plain nested elements with occasional
// attributes (`entry name="..."`) and `<member>` lists. A small owned tree
// is easier to build and walk than streaming events at every call site;
// quick-xml does the tokenizing on the parse side.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use quick_xml::Reader;
use quick_xml::events::Event;
use quick_xml::name::QName;

use crate::error::Error;

/// An owned XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Element tag name.
    pub tag: String,
    /// XML attributes keyed by name.
    pub attributes: BTreeMap<String, String>,
    /// Child elements.
    pub children: Vec<Element>,
    /// Optional text content.
    pub text: Option<String>,
}

impl Element {
    /// Create a new element with no attributes, children, or text.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Create a leaf element holding text content.
    pub fn text_node(tag: impl Into<String>, text: impl Into<String>) -> Self {
        let mut el = Self::new(tag);
        el.text = Some(text.into());
        el
    }

    /// Create a `<tag><member>..</member>..</tag>` list element.
    ///
    /// Returns `None` for an empty value list so callers can skip emitting
    /// the container entirely.
    pub fn member_list(tag: impl Into<String>, values: &[String]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut el = Self::new(tag);
        el.children = values
            .iter()
            .map(|v| Self::text_node("member", v.clone()))
            .collect();
        Some(el)
    }

    // ── Builder helpers ──────────────────────────────────────────────

    /// Set an attribute (builder style).
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Append a child element (builder style).
    #[must_use]
    pub fn push(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child element if present (builder style).
    #[must_use]
    pub fn push_opt(mut self, child: Option<Element>) -> Self {
        if let Some(child) = child {
            self.children.push(child);
        }
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// Return the first child with the provided tag.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Return all children with the provided tag.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// An attribute value by name.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Walk a nested child path and return the terminal node's text.
    pub fn text_of(&self, path: &[&str]) -> Option<&str> {
        let mut current = self;
        for segment in path {
            current = current.child(segment)?;
        }
        current.text.as_deref()
    }

    /// Collect the `<member>` texts of the child with the provided tag.
    ///
    /// Missing container or empty members both yield an empty list.
    pub fn members_of(&self, tag: &str) -> Vec<String> {
        self.child(tag)
            .map(|c| {
                c.children_named("member")
                    .filter_map(|m| m.text.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    // ── Parsing ──────────────────────────────────────────────────────

    /// Parse an XML document into an element tree.
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let mut reader = Reader::from_reader(xml.as_bytes());
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        let malformed = |message: &str| Error::Xml {
            message: message.into(),
            body: xml.into(),
        };

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| Error::Xml {
                message: e.to_string(),
                body: xml.into(),
            })?;
            match event {
                Event::Start(e) => {
                    let el = element_from_start(&e, &reader, xml)?;
                    stack.push(el);
                }
                Event::Empty(e) => {
                    let el = element_from_start(&e, &reader, xml)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(el),
                        None if root.is_none() => root = Some(el),
                        None => return Err(malformed("multiple top-level elements")),
                    }
                }
                Event::Text(e) => {
                    if let Some(current) = stack.last_mut() {
                        let text = e.unescape().map_err(|e| Error::Xml {
                            message: e.to_string(),
                            body: xml.into(),
                        })?;
                        if !text.trim().is_empty() {
                            match &mut current.text {
                                Some(existing) => existing.push_str(&text),
                                None => current.text = Some(text.into_owned()),
                            }
                        }
                    }
                }
                Event::CData(e) => {
                    if let Some(current) = stack.last_mut() {
                        let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                        if !text.trim().is_empty() {
                            match &mut current.text {
                                Some(existing) => existing.push_str(&text),
                                None => current.text = Some(text),
                            }
                        }
                    }
                }
                Event::End(_) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| malformed("closing tag without open tag"))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(el),
                        None if root.is_none() => root = Some(el),
                        None => return Err(malformed("multiple top-level elements")),
                    }
                }
                Event::Eof => break,
                Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(malformed("unclosed element at end of document"));
        }
        root.ok_or_else(|| malformed("no root element"))
    }
}

fn element_from_start(
    e: &quick_xml::events::BytesStart<'_>,
    reader: &Reader<&[u8]>,
    body: &str,
) -> Result<Element, Error> {
    let xml_err = |message: String| Error::Xml {
        message,
        body: body.into(),
    };

    let tag = qname_to_string(e.name()).map_err(xml_err)?;
    let mut el = Element::new(tag);

    for attr in e.attributes() {
        let attr = attr.map_err(|e| xml_err(e.to_string()))?;
        let key = qname_to_string(attr.key).map_err(xml_err)?;
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| xml_err(e.to_string()))?
            .into_owned();
        el.attributes.insert(key, value);
    }

    Ok(el)
}

fn qname_to_string(name: QName<'_>) -> Result<String, String> {
    std::str::from_utf8(name.as_ref())
        .map(ToString::to_string)
        .map_err(|e| e.to_string())
}

// ── Rendering ───────────────────────────────────────────────────────

fn escape_into(f: &mut Formatter<'_>, raw: &str, quote_attr: bool) -> fmt::Result {
    for c in raw.chars() {
        match c {
            '&' => f.write_str("&amp;")?,
            '<' => f.write_str("&lt;")?,
            '>' => f.write_str("&gt;")?,
            '"' if quote_attr => f.write_str("&quot;")?,
            '\'' if quote_attr => f.write_str("&apos;")?,
            _ => write!(f, "{c}")?,
        }
    }
    Ok(())
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (key, value) in &self.attributes {
            write!(f, " {key}=\"")?;
            escape_into(f, value, true)?;
            write!(f, "\"")?;
        }

        if self.children.is_empty() && self.text.is_none() {
            return write!(f, "/>");
        }

        write!(f, ">")?;
        if let Some(text) = &self.text {
            escape_into(f, text, false)?;
        }
        for child in &self.children {
            write!(f, "{child}")?;
        }
        write!(f, "</{}>", self.tag)
    }
}
