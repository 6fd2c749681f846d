//! Serializers for filled templates.
//!
//! A filled template is rendered twice, independently: once to Markdown for
//! the per-page file, and once to a `<page>` [`Element`] that is later wrapped
//! into the aggregate XML document.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use pagesmith_shared::{PagesmithError, Result, TemplateNode};

/// Tag of each page element in the aggregate document.
pub const PAGE_TAG: &str = "page";
/// Root tag of the aggregate document.
pub const AGGREGATE_ROOT_TAG: &str = "knowledge_base";

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

/// Render a filled template as Markdown.
///
/// Top-level keys are visited in template order:
/// - a list emits `### heading` and a body line per item (`heading` falling
///   back to `title`, `body` falling back to `content`);
/// - a nested map emits each of its values as a paragraph;
/// - anything else emits its text as a paragraph.
pub fn to_markdown(filled: &TemplateNode) -> String {
    let mut out = String::new();

    match filled {
        TemplateNode::Map(entries) => {
            for (_, value) in entries {
                match value {
                    TemplateNode::List(items) => {
                        items.iter().for_each(|item| push_item(&mut out, item))
                    }
                    TemplateNode::Map(nested) => {
                        for (_, v) in nested {
                            push_paragraph(&mut out, &v.to_text());
                        }
                    }
                    other => push_paragraph(&mut out, &other.to_text()),
                }
            }
        }
        TemplateNode::List(items) => items.iter().for_each(|item| push_item(&mut out, item)),
        other => out.push_str(&other.to_text()),
    }

    out
}

fn push_item(out: &mut String, item: &TemplateNode) {
    let (heading, body) = match item {
        TemplateNode::Map(_) => (
            first_text(item, &["heading", "title"]),
            first_text(item, &["body", "content"]),
        ),
        other => (String::new(), other.to_text()),
    };
    out.push_str(&format!("\n### {heading}\n{body}\n"));
}

fn push_paragraph(out: &mut String, text: &str) {
    out.push_str(text);
    out.push_str("\n\n");
}

/// Text of the first key present in a map node, or empty.
fn first_text(node: &TemplateNode, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| node.get(key))
        .map(TemplateNode::to_text)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// An owned XML element: tag, attributes, text, children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All direct children with the given tag.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.tag == tag)
    }
}

/// Convert a filled template into a `<page id="...">` element.
///
/// Per top-level key: a list yields one child per item named after the key
/// (map items get one grandchild per item key); a map yields one child with a
/// grandchild per nested key; a scalar yields one child holding its text.
pub fn to_element(page_id: &str, filled: &TemplateNode) -> Element {
    let mut page = Element::new(PAGE_TAG);

    match filled {
        TemplateNode::Map(entries) => {
            for (key, value) in entries {
                let tag = xml_name(key);
                match value {
                    TemplateNode::List(items) => {
                        for item in items {
                            page.children.push(match item {
                                TemplateNode::Map(fields) => field_element(&tag, fields),
                                other => Element::new(tag.clone()).with_text(other.to_text()),
                            });
                        }
                    }
                    TemplateNode::Map(fields) => page.children.push(field_element(&tag, fields)),
                    other => page
                        .children
                        .push(Element::new(tag).with_text(other.to_text())),
                }
            }
        }
        other => page.text = other.to_text(),
    }

    page.set_attribute("id", page_id);
    page
}

fn field_element(tag: &str, fields: &[(String, TemplateNode)]) -> Element {
    let mut element = Element::new(tag);
    element.children = fields
        .iter()
        .map(|(k, v)| Element::new(xml_name(k)).with_text(v.to_text()))
        .collect();
    element
}

/// Make a template key usable as an XML element name.
///
/// Characters outside `[A-Za-z0-9_.-]` become `_`, and a name that does not
/// start with a letter or `_` gets a `_` prefix.
pub fn xml_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}

// ---------------------------------------------------------------------------
// Aggregate document
// ---------------------------------------------------------------------------

/// Serialize page elements into the aggregate XML document.
///
/// Output carries a UTF-8 declaration and depends only on the elements, so
/// identical input yields identical bytes.
pub fn aggregate_document(pages: &[Element]) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_error)?;

    if pages.is_empty() {
        writer
            .write_event(Event::Empty(BytesStart::new(AGGREGATE_ROOT_TAG)))
            .map_err(write_error)?;
    } else {
        writer
            .write_event(Event::Start(BytesStart::new(AGGREGATE_ROOT_TAG)))
            .map_err(write_error)?;
        for page in pages {
            write_element(&mut writer, page)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(AGGREGATE_ROOT_TAG)))
            .map_err(write_error)?;
    }

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.tag.as_str());
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if element.text.is_empty() && element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(write_error)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.tag.as_str())))
        .map_err(write_error)
}

fn write_error(e: impl std::fmt::Display) -> PagesmithError {
    PagesmithError::Serialize(format!("XML write failed: {e}"))
}
