//! Output assembler.
//!
//! Writes rendered pages, the aggregate XML document and the build manifest
//! under the output root.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use pagesmith_shared::{
    BuildManifest, CURRENT_SCHEMA_VERSION, PagesmithError, Result, RunId, SkippedPage,
};

use crate::render::{self, Element};

/// Output location of the Markdown file for `page_id`.
///
/// Page ids are relative slash-separated paths; ids that are empty, absolute,
/// or contain `.`/`..`/empty segments are rejected so output cannot escape
/// the output root.
pub fn page_output_path(output_root: &Path, page_id: &str) -> Result<PathBuf> {
    let relative = Path::new(page_id);
    let well_formed = !page_id.is_empty()
        && !page_id.starts_with('/')
        && !page_id.contains('\\')
        && page_id.split('/').all(|seg| !seg.is_empty())
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

    if !well_formed {
        return Err(PagesmithError::validation(format!(
            "page id '{page_id}' is not a relative output path"
        )));
    }

    Ok(output_root.join(format!("{page_id}.md")))
}

/// Write one page's Markdown, creating parent directories as needed.
pub fn write_page(output_root: &Path, page_id: &str, markdown: &str) -> Result<PathBuf> {
    let file_path = page_output_path(output_root, page_id)?;

    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PagesmithError::io(parent, e))?;
    }

    std::fs::write(&file_path, markdown).map_err(|e| PagesmithError::io(&file_path, e))?;

    debug!(path = %file_path.display(), page_id, "wrote page");
    Ok(file_path)
}

/// Result of writing the aggregate document.
#[derive(Debug, Clone)]
pub struct AggregateOutput {
    /// Where the aggregate document was written.
    pub path: PathBuf,
    /// SHA-256 of the written bytes (hex).
    pub sha256: String,
    /// Number of page elements in the document.
    pub page_count: usize,
}

/// Serialize all page elements and write the aggregate document atomically
/// (temp file, then rename).
#[instrument(skip_all, fields(path = %path.display(), pages = pages.len()))]
pub fn write_aggregate(path: &Path, pages: &[Element]) -> Result<AggregateOutput> {
    let bytes = render::aggregate_document(pages)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PagesmithError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| PagesmithError::validation(format!("{} has no file name", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, &bytes).map_err(|e| PagesmithError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| PagesmithError::io(path, e))?;

    let sha256 = format!("{:x}", Sha256::digest(&bytes));
    info!(
        path = %path.display(),
        pages = pages.len(),
        size = bytes.len(),
        "wrote aggregate document"
    );

    Ok(AggregateOutput {
        path: path.to_path_buf(),
        sha256,
        page_count: pages.len(),
    })
}

/// Write `manifest.json` describing a finished run.
pub fn write_manifest(
    output_root: &Path,
    aggregate: &AggregateOutput,
    skipped: &[SkippedPage],
    tool_version: &str,
) -> Result<BuildManifest> {
    let aggregate_file = aggregate
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let manifest = BuildManifest {
        schema_version: CURRENT_SCHEMA_VERSION,
        run_id: RunId::new(),
        tool_version: tool_version.to_string(),
        generated_at: Utc::now(),
        page_count: aggregate.page_count,
        aggregate_file,
        aggregate_sha256: aggregate.sha256.clone(),
        skipped: skipped.to_vec(),
    };

    write_json(&output_root.join("manifest.json"), &manifest)?;
    Ok(manifest)
}

/// Write a JSON file (pretty-printed).
fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| PagesmithError::Serialize(format!("JSON serialization failed: {e}")))?;
    std::fs::write(path, json).map_err(|e| PagesmithError::io(path, e))?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}
