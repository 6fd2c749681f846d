//! Content extraction from the raw XML export.
//!
//! Given a page id and a [`DocumentSearch`], [`extract_content`] locates the
//! page's sub-document, parses it, and reads a fixed set of fields into a
//! [`ContentMap`]. Nothing here fails: missing documents, malformed markup and
//! absent fields all degrade to visible placeholder text.

mod search;
mod tree;

use tracing::{debug, instrument, warn};

use pagesmith_shared::ContentMap;

pub use search::{DocumentSearch, XmlExport};
pub use tree::{XmlNode, parse_document};

/// Fixed heading paired with `section_1_content`.
pub const SECTION_1_HEADING: &str = "Overview";
/// Fixed heading paired with `section_2_content`.
pub const SECTION_2_HEADING: &str = "Details";
/// Fixed title paired with `step_1_content`.
pub const STEP_1_TITLE: &str = "Step One";
/// Fixed title paired with `step_2_content`.
pub const STEP_2_TITLE: &str = "Step Two";
/// Fixed question for the second FAQ entry.
pub const FAQ_2_QUESTION: &str = "Where does this content come from?";
/// Fixed answer paired with [`FAQ_2_QUESTION`].
pub const FAQ_2_ANSWER: &str = "This content was extracted from the original XML knowledge base.";

/// Where a page's content came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// A matching sub-document was found and parsed.
    Document,
    /// No sub-document carries the page id.
    NotFound,
    /// The lookup or the parse failed; holds the error message.
    Unreadable(String),
}

/// Result of extracting one page.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub content: ContentMap,
    pub source: ContentSource,
}

/// Extract the content map for `page_id`.
///
/// When no document matches or it cannot be parsed, the map is built from an
/// empty document: every extracted field holds its placeholder and the
/// literal fields keep their fixed values.
#[instrument(skip(search))]
pub fn extract_content(search: &dyn DocumentSearch, page_id: &str) -> ExtractedContent {
    let empty = XmlNode::default();

    let raw = match search.find_by_id(page_id) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            warn!(page_id, "no export document matches page id");
            return ExtractedContent {
                content: content_from_root(page_id, &empty),
                source: ContentSource::NotFound,
            };
        }
        Err(e) => {
            warn!(page_id, error = %e, "export lookup failed");
            return ExtractedContent {
                content: content_from_root(page_id, &empty),
                source: ContentSource::Unreadable(e.to_string()),
            };
        }
    };

    match parse_document(&raw) {
        Ok(root) => {
            debug!(page_id, children = root.children.len(), "parsed page document");
            ExtractedContent {
                content: content_from_root(page_id, &root),
                source: ContentSource::Document,
            }
        }
        Err(e) => {
            warn!(page_id, error = %e, "page document failed to parse");
            ExtractedContent {
                content: content_from_root(page_id, &empty),
                source: ContentSource::Unreadable(e.to_string()),
            }
        }
    }
}

/// Read every content field out of a parsed page document.
pub fn content_from_root(page_id: &str, root: &XmlNode) -> ContentMap {
    ContentMap {
        page_title: title_from_id(page_id),
        introduction: text_at_path(root, "introduction"),
        conclusion: text_at_path(root, "conclusion"),
        section_1_heading: SECTION_1_HEADING.to_string(),
        section_1_content: nth_section_text(root, 1),
        section_2_heading: SECTION_2_HEADING.to_string(),
        section_2_content: nth_section_text(root, 2),
        faq_1_question: text_at_path(root, "faq/q"),
        faq_1_answer: text_at_path(root, "faq/a"),
        faq_2_question: FAQ_2_QUESTION.to_string(),
        faq_2_answer: FAQ_2_ANSWER.to_string(),
        step_1_title: STEP_1_TITLE.to_string(),
        step_1_content: text_at_path(root, "steps/step1"),
        step_2_title: STEP_2_TITLE.to_string(),
        step_2_content: text_at_path(root, "steps/step2"),
    }
}

/// Follow a slash-separated path of child names from `root`.
///
/// Returns the trimmed text of the final element, or `"[<path> not found]"`
/// if a segment is missing or the element has no text.
pub fn text_at_path(root: &XmlNode, path: &str) -> String {
    let mut node = root;
    for segment in path.split('/') {
        match node.child(segment) {
            Some(child) => node = child,
            None => return format!("[{path} not found]"),
        }
    }

    if node.text.is_empty() {
        format!("[{path} not found]")
    } else {
        node.text.trim().to_string()
    }
}

/// Trimmed text of the `n`th (1-indexed) `section` child directly under `root`.
///
/// Nested sections and other siblings are ignored. Returns
/// `"[section <n> not found]"` when there are fewer than `n`.
pub fn nth_section_text(root: &XmlNode, n: usize) -> String {
    n.checked_sub(1)
        .and_then(|index| root.children_named("section").nth(index))
        .map(|section| section.text.trim().to_string())
        .unwrap_or_else(|| format!("[section {n} not found]"))
}

/// Human title from a page id: last path segment, dashes to spaces, title-cased.
///
/// Title-casing upper-cases the first letter of every run of letters and
/// lower-cases the rest, so `"api-v2-faq"` becomes `"Api V2 Faq"`.
pub fn title_from_id(page_id: &str) -> String {
    let segment = page_id.rsplit('/').next().unwrap_or(page_id);

    let mut title = String::with_capacity(segment.len());
    let mut in_word = false;
    for c in segment.replace('-', " ").chars() {
        if c.is_alphabetic() {
            if in_word {
                title.extend(c.to_lowercase());
            } else {
                title.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            title.push(c);
            in_word = false;
        }
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesmith_shared::{CONTENT_KEYS, PagesmithError, Result};

    struct FakeSearch(Option<&'static str>);

    impl DocumentSearch for FakeSearch {
        fn find_by_id(&self, _id: &str) -> Result<Option<String>> {
            Ok(self.0.map(String::from))
        }
    }

    struct FailingSearch;

    impl DocumentSearch for FailingSearch {
        fn find_by_id(&self, _id: &str) -> Result<Option<String>> {
            Err(PagesmithError::parse("export is truncated"))
        }
    }

    const FULL_PAGE: &str = r#"<page id="guides/getting-started">
  <introduction>  Welcome aboard.  </introduction>
  <section>First part.</section>
  <note>ignored</note>
  <section>
    Second part.
    <section>nested</section>
  </section>
  <faq><q>Is it free?</q><a>Yes.</a></faq>
  <steps><step1>Download.</step1><step2>Run.</step2></steps>
  <conclusion>Done.</conclusion>
</page>"#;

    fn root(xml: &str) -> XmlNode {
        parse_document(xml).unwrap()
    }

    #[test]
    fn extracts_every_field_from_a_full_page() {
        let extracted = extract_content(&FakeSearch(Some(FULL_PAGE)), "guides/getting-started");
        assert_eq!(extracted.source, ContentSource::Document);

        let c = extracted.content;
        assert_eq!(c.page_title, "Getting Started");
        assert_eq!(c.introduction, "Welcome aboard.");
        assert_eq!(c.conclusion, "Done.");
        assert_eq!(c.section_1_heading, "Overview");
        assert_eq!(c.section_1_content, "First part.");
        assert_eq!(c.section_2_heading, "Details");
        assert_eq!(c.section_2_content, "Second part.");
        assert_eq!(c.faq_1_question, "Is it free?");
        assert_eq!(c.faq_1_answer, "Yes.");
        assert_eq!(c.faq_2_question, FAQ_2_QUESTION);
        assert_eq!(c.faq_2_answer, FAQ_2_ANSWER);
        assert_eq!(c.step_1_title, "Step One");
        assert_eq!(c.step_1_content, "Download.");
        assert_eq!(c.step_2_title, "Step Two");
        assert_eq!(c.step_2_content, "Run.");
    }

    #[test]
    fn unmatched_page_gets_placeholders_for_every_field() {
        let extracted = extract_content(&FakeSearch(None), "missing/page-id");
        assert_eq!(extracted.source, ContentSource::NotFound);

        let c = extracted.content;
        for key in CONTENT_KEYS {
            assert!(c.get(key).is_some(), "missing {key}");
        }
        assert_eq!(c.page_title, "Page Id");
        assert_eq!(c.introduction, "[introduction not found]");
        assert_eq!(c.section_1_content, "[section 1 not found]");
        assert_eq!(c.faq_1_answer, "[faq/a not found]");
        assert_eq!(c.step_2_content, "[steps/step2 not found]");
        assert_eq!(c.step_1_title, "Step One");
    }

    #[test]
    fn malformed_document_degrades_to_placeholders() {
        let extracted = extract_content(&FakeSearch(Some("<page><introduction>")), "p");
        assert!(matches!(extracted.source, ContentSource::Unreadable(_)));
        assert_eq!(extracted.content.introduction, "[introduction not found]");
    }

    #[test]
    fn failed_lookup_degrades_to_placeholders() {
        let extracted = extract_content(&FailingSearch, "p");
        assert_eq!(
            extracted.source,
            ContentSource::Unreadable("parse error: export is truncated".into())
        );
        assert_eq!(extracted.content.conclusion, "[conclusion not found]");
    }

    #[test]
    fn path_lookup_missing_first_segment_keeps_full_path() {
        let doc = root("<page><other/></page>");
        assert_eq!(text_at_path(&doc, "steps/step1"), "[steps/step1 not found]");
        assert_eq!(text_at_path(&doc, "a/b/c/d"), "[a/b/c/d not found]");
    }

    #[test]
    fn path_lookup_missing_deeper_segment_or_empty_text() {
        let doc = root("<page><faq><q></q></faq><steps/></page>");
        assert_eq!(text_at_path(&doc, "faq/a"), "[faq/a not found]");
        assert_eq!(text_at_path(&doc, "faq/q"), "[faq/q not found]");
        assert_eq!(text_at_path(&doc, "steps/step1"), "[steps/step1 not found]");
    }

    #[test]
    fn path_lookup_takes_first_matching_child() {
        let doc = root("<page><faq><q>one</q><q>two</q></faq></page>");
        assert_eq!(text_at_path(&doc, "faq/q"), "one");
    }

    #[test]
    fn positional_lookup_ignores_other_siblings_and_nesting() {
        let doc = root(
            "<page><intro>x</intro><section> a </section><div><section>deep</section></div>\
             <section>b<section>inner</section></section></page>",
        );
        assert_eq!(nth_section_text(&doc, 1), "a");
        assert_eq!(nth_section_text(&doc, 2), "b");
        assert_eq!(nth_section_text(&doc, 3), "[section 3 not found]");
        assert_eq!(nth_section_text(&doc, 0), "[section 0 not found]");
    }

    #[test]
    fn positional_lookup_empty_section_is_empty_string() {
        let doc = root("<page><section/></page>");
        assert_eq!(nth_section_text(&doc, 1), "");
    }

    #[test]
    fn title_from_id_matches_title_case() {
        assert_eq!(title_from_id("guides/getting-started"), "Getting Started");
        assert_eq!(title_from_id("faq"), "Faq");
        assert_eq!(title_from_id("api/v2-REST-api"), "V2 Rest Api");
        assert_eq!(title_from_id("setup/2fa-guide"), "2Fa Guide");
    }
}
