//! Application configuration for Pagesmith.
//!
//! A project config lives at `./pagesmith.toml`, with a user-level fallback at
//! `~/.pagesmith/pagesmith.toml`. CLI flags override config file values, which
//! override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PagesmithError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "pagesmith.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pagesmith";

// ---------------------------------------------------------------------------
// Config structs (matching pagesmith.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Build behaviour.
    #[serde(default)]
    pub build: BuildDefaults,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// The raw XML export that page content is mined from.
    #[serde(default = "default_export")]
    pub export: String,

    /// The category tree definition (YAML).
    #[serde(default = "default_structure")]
    pub structure: String,

    /// Directory holding `<name>.yaml` template definitions.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Root directory for rendered pages and the aggregate document.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            export: default_export(),
            structure: default_structure(),
            templates_dir: default_templates_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_export() -> String {
    "data/export.xml".into()
}
fn default_structure() -> String {
    "config/structure.yaml".into()
}
fn default_templates_dir() -> String {
    "templates".into()
}
fn default_output_dir() -> String {
    "output".into()
}

/// `[build]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildDefaults {
    /// Template used when no category up the tree names one.
    #[serde(default = "default_template")]
    pub default_template: String,

    /// File name of the aggregate XML document inside the output directory.
    #[serde(default = "default_aggregate_file")]
    pub aggregate_file: String,
}

impl Default for BuildDefaults {
    fn default() -> Self {
        Self {
            default_template: default_template(),
            aggregate_file: default_aggregate_file(),
        }
    }
}

fn default_template() -> String {
    "default_page".into()
}
fn default_aggregate_file() -> String {
    "knowledge_base.xml".into()
}

// ---------------------------------------------------------------------------
// Build config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime build configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// XML export file.
    pub export_path: PathBuf,
    /// Category tree file.
    pub structure_path: PathBuf,
    /// Templates directory.
    pub templates_dir: PathBuf,
    /// Output root.
    pub output_dir: PathBuf,
    /// Global default template name.
    pub default_template: String,
    /// Aggregate document file name (relative to `output_dir`).
    pub aggregate_file: String,
    /// Tool version recorded in the build manifest.
    pub tool_version: String,
}

impl From<&AppConfig> for BuildConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            export_path: PathBuf::from(&config.paths.export),
            structure_path: PathBuf::from(&config.paths.structure),
            templates_dir: PathBuf::from(&config.paths.templates_dir),
            output_dir: PathBuf::from(&config.paths.output_dir),
            default_template: config.build.default_template.clone(),
            aggregate_file: config.build.aggregate_file.clone(),
            tool_version: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.pagesmith/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PagesmithError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Find the config file to use: `./pagesmith.toml` first, then the user-level file.
pub fn config_file_path() -> Result<Option<PathBuf>> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local));
    }

    let user = config_dir()?.join(CONFIG_FILE_NAME);
    Ok(user.exists().then_some(user))
}

/// Load the application config. Returns defaults if no config file exists.
pub fn load_config() -> Result<AppConfig> {
    match config_file_path()? {
        Some(path) => load_config_from(&path),
        None => {
            tracing::debug!("no config file found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PagesmithError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PagesmithError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file into `dir`. Refuses to overwrite an existing file.
/// Returns the path to the created file.
pub fn init_config(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(PagesmithError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| PagesmithError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PagesmithError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("templates_dir"));
        assert!(toml_str.contains("default_page"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[paths]
output_dir = "/tmp/kb-out"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.paths.output_dir, "/tmp/kb-out");
        assert_eq!(config.paths.export, "data/export.xml");
        assert_eq!(config.build.aggregate_file, "knowledge_base.xml");
    }

    #[test]
    fn build_config_from_app_config() {
        let app = AppConfig::default();
        let build = BuildConfig::from(&app);
        assert_eq!(build.structure_path, PathBuf::from("config/structure.yaml"));
        assert_eq!(build.default_template, "default_page");
    }

    #[test]
    fn init_config_refuses_overwrite() {
        let dir = std::env::temp_dir().join(format!("ps-config-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();

        let path = init_config(&dir).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.build.default_template, "default_page");

        let err = init_config(&dir).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_config_is_config_error() {
        let dir = std::env::temp_dir().join(format!("ps-config-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[paths\nexport = 3").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, PagesmithError::Config { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
