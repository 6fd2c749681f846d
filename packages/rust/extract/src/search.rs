//! Document lookup over a raw XML export.
//!
//! [`DocumentSearch`] is the seam the extractor calls into; [`XmlExport`] is
//! the built-in implementation that scans an in-memory export for the first
//! element carrying a matching `id` attribute.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use pagesmith_shared::{PagesmithError, Result};

/// Answers "give me the sub-document whose identifier attribute equals X".
pub trait DocumentSearch {
    /// Raw text of the matching sub-document, or `None` if nothing matches.
    fn find_by_id(&self, id: &str) -> Result<Option<String>>;
}

/// A whole XML export held in memory.
#[derive(Debug, Clone)]
pub struct XmlExport {
    raw: String,
}

impl XmlExport {
    /// Read an export file from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| PagesmithError::io(path, e))?;
        debug!(path = %path.display(), bytes = raw.len(), "loaded XML export");
        Ok(Self { raw })
    }

    /// Wrap an export that is already in memory.
    pub fn from_xml(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

impl DocumentSearch for XmlExport {
    fn find_by_id(&self, id: &str) -> Result<Option<String>> {
        let mut reader = Reader::from_str(&self.raw);

        loop {
            let event = reader.read_event().map_err(|e| {
                PagesmithError::parse(format!(
                    "export XML error near byte {}: {e}",
                    reader.buffer_position()
                ))
            })?;

            match event {
                Event::Start(e) if has_id(&e, id)? => {
                    let tag_end = reader.buffer_position() as usize;
                    reader.read_to_end(e.name()).map_err(|err| {
                        PagesmithError::parse(format!("unterminated element for id '{id}': {err}"))
                    })?;
                    let end = reader.buffer_position() as usize;
                    return Ok(Some(self.slice_from_tag(tag_end, end)));
                }
                Event::Empty(e) if has_id(&e, id)? => {
                    let end = reader.buffer_position() as usize;
                    return Ok(Some(self.slice_from_tag(end, end)));
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl XmlExport {
    /// Raw text from the `<` opening the tag that ends at `tag_end` up to `end`.
    ///
    /// A well-formed start tag never contains a literal `<`, so the last one
    /// before `tag_end` opens it.
    fn slice_from_tag(&self, tag_end: usize, end: usize) -> String {
        let start = self.raw[..tag_end].rfind('<').unwrap_or(0);
        self.raw[start..end].to_string()
    }
}

fn has_id(start: &BytesStart<'_>, id: &str) -> Result<bool> {
    let attr = start
        .try_get_attribute("id")
        .map_err(|e| PagesmithError::parse(format!("bad attribute in export: {e}")))?;

    match attr {
        Some(attr) => {
            let value = attr
                .unescape_value()
                .map_err(|e| PagesmithError::parse(format!("bad id attribute in export: {e}")))?;
            Ok(value == id)
        }
        None => Ok(false),
    }
}
