//! Minimal XML element tree used for control plane documents.
//!
//! Response payloads (`<VM>…</VM>`, `<HOST_POOL>…</HOST_POOL>`) and the
//! XML-RPC envelope itself are parsed into [`XmlNode`] trees with
//! `quick-xml`. Lookups are slash-separated element paths relative to a
//! node, e.g. `TEMPLATE/DISK/IMAGE_ID`, and always return matches in
//! document order.

use std::fmt;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{ClientError, Result};

/// One XML element with its attributes, text and child elements.
///
/// Mixed content is not preserved: an element that has child elements
/// keeps no text of its own.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlNode {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                ClientError::Parse(format!("at byte {}: {}", reader.buffer_position(), e))
            })?;

            match event {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let node = Self::from_start(&start)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::End(_) => {
                    let mut node = stack
                        .pop()
                        .ok_or_else(|| ClientError::Parse("unbalanced closing tag".to_string()))?;
                    if !node.children.is_empty() {
                        node.text.clear();
                    }
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        let unescaped = text
                            .unescape()
                            .map_err(|e| ClientError::Parse(e.to_string()))?;
                        current.text.push_str(&unescaped);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(ClientError::Parse(format!(
                "unexpected end of document inside <{}>",
                open.name
            )));
        }

        root.ok_or_else(|| ClientError::Parse("document has no root element".to_string()))
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut node = XmlNode::new(String::from_utf8_lossy(start.name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ClientError::Parse(e.to_string()))?;
            let value = attr
                .unescape_value()
                .map_err(|e| ClientError::Parse(e.to_string()))?;
            node.attributes.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                value.into_owned(),
            ));
        }
        Ok(node)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text content of the element (empty for elements with children).
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Append a new child element and return it for further building.
    pub fn create_element(&mut self, name: impl Into<String>) -> &mut XmlNode {
        self.children.push(XmlNode::new(name));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// All elements matching a slash-separated path, in document order.
    ///
    /// An empty path matches the node itself.
    pub fn find(&self, path: &str) -> Vec<&XmlNode> {
        let mut current: Vec<&XmlNode> = vec![self];
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|node| node.children.iter().filter(move |c| c.name == segment))
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }

    /// First element matching `path`.
    pub fn find_first(&self, path: &str) -> Option<&XmlNode> {
        self.find(path).into_iter().next()
    }

    /// Serialize the subtree back to XML text.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        self.write_into(&mut xml);
        xml
    }

    fn write_into(&self, xml: &mut String) {
        xml.push('<');
        xml.push_str(&self.name);
        for (key, value) in &self.attributes {
            xml.push_str(&format!(" {}=\"{}\"", key, escape(value.as_str())));
        }

        if self.children.is_empty() && self.text.is_empty() {
            xml.push_str("/>");
            return;
        }

        xml.push('>');
        if self.children.is_empty() {
            xml.push_str(&escape(self.text.as_str()));
        }
        for child in &self.children {
            child.write_into(xml);
        }
        xml.push_str(&format!("</{}>", self.name));
    }
}

impl fmt::Display for XmlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        Ok(())
    } else if root.is_none() {
        *root = Some(node);
        Ok(())
    } else {
        Err(ClientError::Parse(format!(
            "second root element <{}>",
            node.name
        )))
    }
}
