//! Core domain types for Pagesmith knowledge bases.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PagesmithError, Result};

/// Current schema version for the build manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one build run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Structure (category tree)
// ---------------------------------------------------------------------------

/// Root of the structure file: `knowledge_base: [CategoryNode]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Structure {
    /// Top-level categories, in file order.
    #[serde(rename = "knowledge_base")]
    pub categories: Vec<CategoryNode>,
}

/// A category in the knowledge-base tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryNode {
    /// Display name. Not used for output paths.
    #[serde(default)]
    pub name: String,
    /// Template inherited by pages and subcategories that set none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Pages directly in this category.
    #[serde(default)]
    pub pages: Vec<PageRef>,
    /// Nested categories.
    #[serde(default)]
    pub subcategories: Vec<CategoryNode>,
}

/// A single page reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    /// Unique identifier: export lookup key and output path stem.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Overrides the inherited template for this page only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl Structure {
    /// Total number of pages across the whole tree.
    pub fn page_count(&self) -> usize {
        fn count(node: &CategoryNode) -> usize {
            node.pages.len() + node.subcategories.iter().map(count).sum::<usize>()
        }
        self.categories.iter().map(count).sum()
    }

    /// Reject trees where two pages share an id (they would overwrite each other's output).
    pub fn validate(&self) -> Result<()> {
        fn visit<'a>(node: &'a CategoryNode, seen: &mut HashSet<&'a str>) -> Result<()> {
            for page in &node.pages {
                if !seen.insert(page.id.as_str()) {
                    return Err(PagesmithError::config(format!(
                        "duplicate page id '{}' in category '{}'",
                        page.id, node.name
                    )));
                }
            }
            node.subcategories.iter().try_for_each(|sub| visit(sub, seen))
        }

        let mut seen = HashSet::new();
        self.categories
            .iter()
            .try_for_each(|category| visit(category, &mut seen))
    }
}

// ---------------------------------------------------------------------------
// ContentMap
// ---------------------------------------------------------------------------

/// Every field name a template may reference, in canonical order.
pub const CONTENT_KEYS: [&str; 15] = [
    "page_title",
    "introduction",
    "conclusion",
    "section_1_heading",
    "section_1_content",
    "section_2_heading",
    "section_2_content",
    "faq_1_question",
    "faq_1_answer",
    "faq_2_question",
    "faq_2_answer",
    "step_1_title",
    "step_1_content",
    "step_2_title",
    "step_2_content",
];

/// Normalized content for one page.
///
/// One field per key in [`CONTENT_KEYS`], so a content map can never be
/// missing a key; fields that could not be extracted hold a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentMap {
    pub page_title: String,
    pub introduction: String,
    pub conclusion: String,
    pub section_1_heading: String,
    pub section_1_content: String,
    pub section_2_heading: String,
    pub section_2_content: String,
    pub faq_1_question: String,
    pub faq_1_answer: String,
    pub faq_2_question: String,
    pub faq_2_answer: String,
    pub step_1_title: String,
    pub step_1_content: String,
    pub step_2_title: String,
    pub step_2_content: String,
}

impl ContentMap {
    /// Look up a field by name. `None` means the name is not part of the vocabulary.
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "page_title" => &self.page_title,
            "introduction" => &self.introduction,
            "conclusion" => &self.conclusion,
            "section_1_heading" => &self.section_1_heading,
            "section_1_content" => &self.section_1_content,
            "section_2_heading" => &self.section_2_heading,
            "section_2_content" => &self.section_2_content,
            "faq_1_question" => &self.faq_1_question,
            "faq_1_answer" => &self.faq_1_answer,
            "faq_2_question" => &self.faq_2_question,
            "faq_2_answer" => &self.faq_2_answer,
            "step_1_title" => &self.step_1_title,
            "step_1_content" => &self.step_1_content,
            "step_2_title" => &self.step_2_title,
            "step_2_content" => &self.step_2_content,
            _ => return None,
        };
        Some(value)
    }

    /// `(key, value)` pairs in [`CONTENT_KEYS`] order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        CONTENT_KEYS
            .into_iter()
            .filter_map(|key| self.get(key).map(|value| (key, value)))
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// A non-string leaf in a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    /// Numbers keep the textual form they were written in.
    Number(String),
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(n),
        }
    }
}

/// A node in a template (or filled template) tree.
///
/// Maps keep their keys in source order; rendering depends on it.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// A string leaf; may contain `{field}` placeholders before filling.
    Text(String),
    List(Vec<TemplateNode>),
    Map(Vec<(String, TemplateNode)>),
    Scalar(Scalar),
}

impl TemplateNode {
    /// Look up a key in a map node. Returns `None` for other variants.
    pub fn get(&self, key: &str) -> Option<&TemplateNode> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Stringify the node. Lists join items with `", "`, maps render `key: value` pairs.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Scalar(s) => s.to_string(),
            Self::List(items) => items
                .iter()
                .map(TemplateNode::to_text)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Map(entries) => entries
                .iter()
                .map(|(k, v)| format!("{k}: {}", v.to_text()))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// A named template as loaded from the templates directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub root: TemplateNode,
}

// ---------------------------------------------------------------------------
// BuildManifest
// ---------------------------------------------------------------------------

/// A page that produced no output, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPage {
    pub id: String,
    pub reason: String,
}

/// The `manifest.json` written next to the aggregate document after each run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Identifier of the run that wrote this manifest.
    pub run_id: RunId,
    /// Tool version that ran the build.
    pub tool_version: String,
    /// When the build finished.
    pub generated_at: DateTime<Utc>,
    /// Pages written to the aggregate document.
    pub page_count: usize,
    /// Aggregate file name, relative to the output directory.
    pub aggregate_file: String,
    /// SHA-256 of the aggregate document bytes.
    pub aggregate_sha256: String,
    /// Pages that were skipped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedPage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: &str) -> PageRef {
        PageRef {
            id: id.into(),
            title: id.into(),
            template: None,
        }
    }

    #[test]
    fn structure_deserializes_nested_tree() {
        let json = r#"{
            "knowledge_base": [
                {
                    "name": "Guides",
                    "template": "guide",
                    "pages": [{"id": "guides/intro", "title": "Intro"}],
                    "subcategories": [
                        {"name": "Advanced", "pages": [{"id": "guides/deep", "title": "Deep", "template": "tutorial"}]}
                    ]
                },
                {"name": "Empty"}
            ]
        }"#;

        let structure: Structure = serde_json::from_str(json).expect("deserialize");
        assert_eq!(structure.categories.len(), 2);
        assert_eq!(structure.categories[0].template.as_deref(), Some("guide"));
        assert_eq!(
            structure.categories[0].subcategories[0].pages[0].template.as_deref(),
            Some("tutorial")
        );
        assert!(structure.categories[1].pages.is_empty());
        assert_eq!(structure.page_count(), 2);
    }

    #[test]
    fn validate_rejects_duplicate_ids_across_levels() {
        let structure = Structure {
            categories: vec![CategoryNode {
                name: "Root".into(),
                pages: vec![page("a")],
                subcategories: vec![CategoryNode {
                    name: "Child".into(),
                    pages: vec![page("a")],
                    ..Default::default()
                }],
                ..Default::default()
            }],
        };

        let err = structure.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate page id 'a'"));
    }

    #[test]
    fn content_map_lookup_covers_every_key() {
        let content = ContentMap {
            page_title: "T".into(),
            introduction: "i".into(),
            conclusion: "c".into(),
            section_1_heading: "Overview".into(),
            section_1_content: "s1".into(),
            section_2_heading: "Details".into(),
            section_2_content: "s2".into(),
            faq_1_question: "q1".into(),
            faq_1_answer: "a1".into(),
            faq_2_question: "q2".into(),
            faq_2_answer: "a2".into(),
            step_1_title: "Step One".into(),
            step_1_content: "st1".into(),
            step_2_title: "Step Two".into(),
            step_2_content: "st2".into(),
        };

        for key in CONTENT_KEYS {
            assert!(content.get(key).is_some(), "missing {key}");
        }
        assert_eq!(content.get("author"), None);
        assert_eq!(content.iter().count(), CONTENT_KEYS.len());
        assert_eq!(content.iter().next(), Some(("page_title", "T")));
    }

    #[test]
    fn template_node_to_text() {
        let node = TemplateNode::Map(vec![
            ("a".into(), TemplateNode::Scalar(Scalar::Number("1".into()))),
            (
                "b".into(),
                TemplateNode::List(vec![
                    TemplateNode::Text("x".into()),
                    TemplateNode::Scalar(Scalar::Bool(true)),
                ]),
            ),
        ]);
        assert_eq!(node.to_text(), "a: 1, b: x, true");
        assert_eq!(TemplateNode::Scalar(Scalar::Null).to_text(), "");
    }

    #[test]
    fn manifest_serialization() {
        let manifest = BuildManifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            run_id: RunId::new(),
            tool_version: "0.1.0".into(),
            generated_at: Utc::now(),
            page_count: 2,
            aggregate_file: "knowledge_base.xml".into(),
            aggregate_sha256: "00".repeat(32),
            skipped: vec![SkippedPage {
                id: "x".into(),
                reason: "template 'missing' not found".into(),
            }],
        };

        let json = serde_json::to_string_pretty(&manifest).expect("serialize");
        let parsed: BuildManifest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(parsed.page_count, 2);
        assert_eq!(parsed.skipped.len(), 1);
    }
}
