//! Minimal navigable element tree built from an XML fragment.
//!
//! Only element names, leading text and child order are kept; attributes,
//! comments and processing instructions are dropped.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use pagesmith_shared::{PagesmithError, Result};

/// One element of a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// Element name as written (prefix included).
    pub name: String,
    /// Text between the start tag and the first child element, unescaped.
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given name, in order. Does not recurse.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// Parse an XML fragment with exactly one root element.
///
/// Fails on malformed markup, unclosed or mismatched tags, a second root
/// element, or non-whitespace text outside the root.
pub fn parse_document(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            PagesmithError::parse(format!(
                "XML error near byte {}: {e}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(e) => {
                if root.is_some() && stack.is_empty() {
                    return Err(PagesmithError::parse("document has more than one root element"));
                }
                stack.push(new_node(&e)?);
            }
            Event::Empty(e) => {
                let node = new_node(&e)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| PagesmithError::parse("closing tag without an open element"))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|e| PagesmithError::parse(format!("bad text content: {e}")))?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(e) => {
                let text = std::str::from_utf8(&e)
                    .map_err(|e| PagesmithError::parse(format!("CDATA is not UTF-8: {e}")))?;
                push_text(&mut stack, text)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(PagesmithError::parse(format!(
            "unclosed element <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| PagesmithError::parse("document has no root element"))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_node(start: &BytesStart<'_>) -> Result<XmlNode> {
    let qname = start.name();
    let name = std::str::from_utf8(qname.as_ref())
        .map_err(|e| PagesmithError::parse(format!("element name is not UTF-8: {e}")))?;
    Ok(XmlNode {
        name: name.to_string(),
        ..Default::default()
    })
}

/// Hand a finished element to its parent, or make it the root.
fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => {
            return Err(PagesmithError::parse(
                "document has more than one root element",
            ));
        }
    }
    Ok(())
}

fn push_text(stack: &mut [XmlNode], text: &str) -> Result<()> {
    match stack.last_mut() {
        // Only leading text counts; text after a child element is a tail.
        Some(node) if node.children.is_empty() => node.text.push_str(text),
        Some(_) => {}
        None if text.trim().is_empty() => {}
        None => {
            return Err(PagesmithError::parse(
                "text content outside the root element",
            ));
        }
    }
    Ok(())
}
