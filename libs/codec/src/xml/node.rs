//! A small owned XML element tree.
//!
//! [`XmlNode`] is the native in-memory structure of the XML codec. Text and CDATA
//! children are kept apart so that payloads carried as CDATA are written back as
//! CDATA instead of being re-escaped.

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

/// Errors that can occur when reading or writing XML.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The XML is not well-formed.
    #[error("XML syntax error at byte {position}: {source}")]
    Syntax {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// An attribute is not well-formed.
    #[error("invalid XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Character data, an attribute value or the declaration could not be decoded.
    #[error("invalid XML content: {0}")]
    Content(String),

    /// An element or attribute name is not valid UTF-8 or not a valid XML name.
    #[error("invalid XML name '{0}'")]
    InvalidName(String),

    /// The document has no root element.
    #[error("XML document has no root element")]
    MissingRoot,

    /// The document has content after the root element.
    #[error("XML document has more than one root element")]
    MultipleRoots,

    /// An end tag does not match the open element.
    #[error("mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEnd { expected: String, found: String },

    /// Writing the document failed.
    #[error("failed to write XML: {0}")]
    Write(String),
}

/// A child of an [`XmlNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlContent {
    Element(XmlNode),
    Text(String),
    CData(String),
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlContent>,
}

/// A parsed document: the root element plus the declared encoding, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub declared_encoding: Option<String>,
    pub root: XmlNode,
}

impl XmlNode {
    /// Creates an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(XmlContent::Element(child));
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlContent::Text(text.into()));
        self
    }

    #[must_use]
    pub fn with_cdata(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlContent::CData(text.into()));
        self
    }

    /// Sets an attribute, replacing an existing one of the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn push(&mut self, content: XmlContent) {
        self.children.push(content);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[XmlContent] {
        &self.children
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlNode> {
        self.children.iter().filter_map(|c| match c {
            XmlContent::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.elements().find(|e| e.name == name)
    }

    /// Concatenated text and CDATA of the direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlContent::Text(t) | XmlContent::CData(t) => Some(t.as_str()),
                XmlContent::Element(_) => None,
            })
            .collect()
    }

    /// Parses a single element from XML text, ignoring any declaration.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        parse_document(xml).map(|doc| doc.root)
    }

    /// Writes the element without an XML declaration.
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        write_document(self, None)
    }
}

/// Returns true if `name` can be used as an element or attribute name.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let start_ok = first.is_alphabetic() || first == '_' || first == ':';
    start_ok && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}

/// Parses a document into its root element.
///
/// Whitespace-only text between elements is dropped; comments and processing
/// instructions are skipped.
pub fn parse_document(xml: &str) -> Result<XmlDocument, XmlError> {
    let mut reader = Reader::from_str(xml);
    let mut declared_encoding = None;
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event = reader.read_event().map_err(|source| XmlError::Syntax {
            position: reader.buffer_position() as u64,
            source,
        })?;
        match event {
            Event::Decl(decl) => {
                if let Some(encoding) = decl.encoding() {
                    let encoding = encoding.map_err(|e| XmlError::Content(e.to_string()))?;
                    declared_encoding = Some(String::from_utf8_lossy(&encoding).into_owned());
                }
            }
            Event::Start(start) => {
                stack.push(element_from_start(&start)?);
            }
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(end) => {
                let found = decode_name(end.name().as_ref())?;
                let element = stack.pop().ok_or_else(|| XmlError::MismatchedEnd {
                    expected: String::new(),
                    found: found.clone(),
                })?;
                if element.name != found {
                    return Err(XmlError::MismatchedEnd {
                        expected: element.name,
                        found,
                    });
                }
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| XmlError::Content(e.to_string()))?;
                if text.trim().is_empty() {
                    continue;
                }
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlContent::Text(text.into_owned())),
                    None => return Err(XmlError::MultipleRoots),
                }
            }
            Event::CData(cdata) => {
                let text = String::from_utf8(cdata.into_inner().into_owned())
                    .map_err(|e| XmlError::Content(e.to_string()))?;
                match stack.last_mut() {
                    Some(parent) => append_cdata(parent, text),
                    None => return Err(XmlError::MultipleRoots),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::MismatchedEnd {
            expected: open.name,
            found: String::new(),
        });
    }
    let root = root.ok_or(XmlError::MissingRoot)?;
    Ok(XmlDocument {
        declared_encoding,
        root,
    })
}

/// Writes an element, preceded by a declaration when `encoding` is given.
pub fn write_document(root: &XmlNode, encoding: Option<&str>) -> Result<String, XmlError> {
    let mut writer = Writer::new(Vec::new());
    if let Some(encoding) = encoding {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some(encoding), None)))
            .map_err(|e| XmlError::Write(e.to_string()))?;
    }
    write_element(&mut writer, root)?;
    String::from_utf8(writer.into_inner()).map_err(|e| XmlError::Write(e.to_string()))
}

fn write_element(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<(), XmlError> {
    if !is_valid_name(&node.name) {
        return Err(XmlError::InvalidName(node.name.clone()));
    }
    let mut start = BytesStart::new(node.name.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| XmlError::Write(e.to_string()));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| XmlError::Write(e.to_string()))?;
    for child in &node.children {
        match child {
            XmlContent::Element(element) => write_element(writer, element)?,
            XmlContent::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| XmlError::Write(e.to_string()))?,
            XmlContent::CData(text) => write_cdata(writer, text)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.name.as_str())))
        .map_err(|e| XmlError::Write(e.to_string()))
}

/// `]]>` cannot appear inside a CDATA section, so it is split across two.
fn write_cdata(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<(), XmlError> {
    let mut rest = text;
    loop {
        let (chunk, tail) = match rest.find("]]>") {
            Some(i) => (&rest[..i + 2], Some(&rest[i + 2..])),
            None => (rest, None),
        };
        writer
            .write_event(Event::CData(BytesCData::new(chunk)))
            .map_err(|e| XmlError::Write(e.to_string()))?;
        match tail {
            Some(tail) => rest = tail,
            None => return Ok(()),
        }
    }
}

/// Adjacent CDATA sections are merged back into one child.
fn append_cdata(parent: &mut XmlNode, text: String) {
    if let Some(XmlContent::CData(existing)) = parent.children.last_mut() {
        existing.push_str(&text);
    } else {
        parent.children.push(XmlContent::CData(text));
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlNode, XmlError> {
    let mut node = XmlNode::new(decode_name(start.name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = decode_name(attribute.key.as_ref())?;
        let value = attribute
            .unescape_value()
            .map_err(|e| XmlError::Content(e.to_string()))?;
        node.attributes.push((key, value.into_owned()));
    }
    Ok(node)
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    element: XmlNode,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlContent::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(XmlError::MultipleRoots),
    }
    Ok(())
}

fn decode_name(raw: &[u8]) -> Result<String, XmlError> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|_| XmlError::InvalidName(String::from_utf8_lossy(raw).into_owned()))
}
