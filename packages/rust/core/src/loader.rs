//! YAML loaders for the category tree and template definitions.

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::debug;

use pagesmith_shared::{PagesmithError, Result, Scalar, Structure, Template, TemplateNode};

/// Top-level key holding the template structure inside a template file.
const TEMPLATE_ROOT_KEY: &str = "page_template";

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// Load and validate the category tree. Any failure here is fatal for the run.
pub fn load_structure(path: &Path) -> Result<Structure> {
    let content = std::fs::read_to_string(path).map_err(|e| PagesmithError::io(path, e))?;
    let structure = parse_structure(&content)
        .map_err(|e| PagesmithError::config(format!("{}: {e}", path.display())))?;

    debug!(
        path = %path.display(),
        categories = structure.categories.len(),
        pages = structure.page_count(),
        "loaded structure"
    );
    Ok(structure)
}

/// Parse a structure document (`knowledge_base: [...]`) and check page ids are unique.
pub fn parse_structure(yaml: &str) -> Result<Structure> {
    let structure: Structure = serde_yaml::from_str(yaml)
        .map_err(|e| PagesmithError::config(format!("invalid structure definition: {e}")))?;
    structure.validate()?;
    Ok(structure)
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Resolves a template name to a parsed template.
pub trait TemplateSource {
    /// Load the template called `name`.
    fn load(&self, name: &str) -> Result<Template>;
}

/// Templates stored as `<dir>/<name>.yaml`, each with a `page_template` key.
#[derive(Debug, Clone)]
pub struct TemplateDir {
    dir: PathBuf,
}

impl TemplateDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File path a template name resolves to.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.yaml"))
    }
}

impl TemplateSource for TemplateDir {
    fn load(&self, name: &str) -> Result<Template> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(PagesmithError::validation(format!(
                "invalid template name '{name}'"
            )));
        }

        let path = self.path_for(name);
        if !path.is_file() {
            return Err(PagesmithError::TemplateNotFound {
                name: name.to_string(),
                path,
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|e| PagesmithError::io(&path, e))?;
        let root = parse_template(&content)
            .map_err(|e| PagesmithError::parse(format!("{}: {e}", path.display())))?;

        debug!(name, path = %path.display(), "loaded template");
        Ok(Template {
            name: name.to_string(),
            root,
        })
    }
}

/// Parse a template document and return the structure under `page_template`.
pub fn parse_template(yaml: &str) -> Result<TemplateNode> {
    let value: Value = serde_yaml::from_str(yaml)
        .map_err(|e| PagesmithError::parse(format!("invalid YAML: {e}")))?;

    let root = match value {
        Value::Mapping(mut mapping) => mapping.remove(TEMPLATE_ROOT_KEY),
        _ => None,
    }
    .ok_or_else(|| PagesmithError::parse(format!("missing top-level '{TEMPLATE_ROOT_KEY}' key")))?;

    node_from_yaml(root)
}

/// Convert a YAML value into a template node, keeping mapping order.
fn node_from_yaml(value: Value) -> Result<TemplateNode> {
    let node = match value {
        Value::String(s) => TemplateNode::Text(s),
        Value::Null => TemplateNode::Scalar(Scalar::Null),
        Value::Bool(b) => TemplateNode::Scalar(Scalar::Bool(b)),
        Value::Number(n) => TemplateNode::Scalar(Scalar::Number(n.to_string())),
        Value::Sequence(items) => TemplateNode::List(
            items
                .into_iter()
                .map(node_from_yaml)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Mapping(mapping) => TemplateNode::Map(
            mapping
                .into_iter()
                .map(|(k, v)| Ok((key_text(k)?, node_from_yaml(v)?)))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Tagged(tagged) => node_from_yaml(tagged.value)?,
    };
    Ok(node)
}

fn key_text(key: Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok("null".to_string()),
        other => Err(PagesmithError::parse(format!(
            "unsupported mapping key in template: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ps-loader-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn parse_template_keeps_key_order_and_types() {
        let root = parse_template(
            r##"
page_template:
  title: "# {page_title}"
  intro: "{introduction}"
  sections:
    - heading: "{section_1_heading}"
      body: "{section_1_content}"
  weight: 3
  draft: false
  extra: ~
"##,
        )
        .unwrap();

        let TemplateNode::Map(entries) = &root else {
            panic!("expected map, got {root:?}");
        };
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["title", "intro", "sections", "weight", "draft", "extra"]);
        assert_eq!(
            root.get("weight"),
            Some(&TemplateNode::Scalar(Scalar::Number("3".into())))
        );
        assert_eq!(
            root.get("draft"),
            Some(&TemplateNode::Scalar(Scalar::Bool(false)))
        );
        assert_eq!(root.get("extra"), Some(&TemplateNode::Scalar(Scalar::Null)));

        let Some(TemplateNode::List(sections)) = root.get("sections") else {
            panic!("expected sections list");
        };
        assert_eq!(
            sections[0].get("body"),
            Some(&TemplateNode::Text("{section_1_content}".into()))
        );
    }

    #[test]
    fn parse_template_requires_root_key() {
        let err = parse_template("other: 1").unwrap_err();
        assert!(err.to_string().contains("page_template"));
        assert!(parse_template("- a\n- b").is_err());
    }

    #[test]
    fn template_dir_loads_by_name() {
        let dir = temp_dir();
        std::fs::write(
            dir.join("guide.yaml"),
            "page_template:\n  body: \"{introduction}\"\n",
        )
        .unwrap();

        let templates = TemplateDir::new(&dir);
        let template = templates.load("guide").unwrap();
        assert_eq!(template.name, "guide");
        assert!(template.root.get("body").is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn template_dir_reports_missing_and_invalid_names() {
        let dir = temp_dir();
        let templates = TemplateDir::new(&dir);

        let err = templates.load("nope").unwrap_err();
        assert!(matches!(err, PagesmithError::TemplateNotFound { ref name, .. } if name == "nope"));

        let err = templates.load("../etc/passwd").unwrap_err();
        assert!(matches!(err, PagesmithError::Validation { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn parse_structure_reads_nested_categories() {
        let structure = parse_structure(
            r#"
knowledge_base:
  - name: Guides
    template: guide
    pages:
      - id: guides/intro
        title: Intro
    subcategories:
      - name: Advanced
        pages:
          - id: guides/advanced/tuning
            title: Tuning
            template: tutorial
  - name: Misc
"#,
        )
        .unwrap();

        assert_eq!(structure.categories.len(), 2);
        assert_eq!(structure.page_count(), 2);
        assert_eq!(structure.categories[0].subcategories[0].name, "Advanced");
    }

    #[test]
    fn parse_structure_rejects_malformed_input() {
        assert!(matches!(
            parse_structure("pages: []").unwrap_err(),
            PagesmithError::Config { .. }
        ));
        assert!(parse_structure("knowledge_base:\n  - pages:\n      - id: x\n").is_err());
    }

    #[test]
    fn load_structure_missing_file_is_io_error() {
        let dir = temp_dir();
        let err = load_structure(&dir.join("structure.yaml")).unwrap_err();
        assert!(matches!(err, PagesmithError::Io { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
