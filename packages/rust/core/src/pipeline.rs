//! End-to-end `build` pipeline: structure → pages → aggregate → manifest.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument};

use pagesmith_extract::{ContentSource, DocumentSearch, XmlExport};
use pagesmith_shared::{BuildConfig, BuildManifest, PagesmithError, Result, SkippedPage, Structure};

use crate::assembler;
use crate::loader::{self, TemplateDir, TemplateSource};
use crate::walker::StructureWalker;

/// Result of a full build.
#[derive(Debug)]
pub struct BuildResult {
    /// Output root holding pages, aggregate and manifest.
    pub output_dir: PathBuf,
    /// Path of the aggregate XML document.
    pub aggregate_path: PathBuf,
    /// Pages rendered and included in the aggregate.
    pub page_count: usize,
    /// Built pages whose content came from placeholders (no or unreadable document).
    pub degraded_count: usize,
    /// Pages that produced no output.
    pub skipped: Vec<SkippedPage>,
    /// The manifest written for this run.
    pub manifest: BuildManifest,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting build status.
pub trait BuildProgress {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a page is built.
    fn page_started(
        &self,
        page_id: &str,
        title: &str,
        template: &str,
        current: usize,
        total: usize,
    );
    /// Called when a page's content falls back to placeholders.
    fn content_degraded(&self, page_id: &str, source: &ContentSource);
    /// Called after a page's Markdown is written.
    fn page_built(&self, page_id: &str, path: &Path);
    /// Called when a page is skipped.
    fn page_skipped(&self, page_id: &str, reason: &str);
    /// Called when the build completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl BuildProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_started(&self, _: &str, _: &str, _: &str, _: usize, _: usize) {}
    fn content_degraded(&self, _page_id: &str, _source: &ContentSource) {}
    fn page_built(&self, _page_id: &str, _path: &Path) {}
    fn page_skipped(&self, _page_id: &str, _reason: &str) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Options for [`assemble_knowledge_base`] that do not come from loaded inputs.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    pub output_dir: PathBuf,
    pub default_template: String,
    pub aggregate_file: String,
    pub tool_version: String,
}

impl From<&BuildConfig> for AssembleOptions {
    fn from(config: &BuildConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            default_template: config.default_template.clone(),
            aggregate_file: config.aggregate_file.clone(),
            tool_version: config.tool_version.clone(),
        }
    }
}

/// Run the full `build` pipeline from files on disk.
///
/// 1. Load the structure (fatal on failure)
/// 2. Load the XML export (fatal on failure)
/// 3. Walk the tree, writing one Markdown file per page
/// 4. Write the aggregate document and manifest
#[instrument(
    skip_all,
    fields(
        structure = %config.structure_path.display(),
        out = %config.output_dir.display()
    )
)]
pub fn build_knowledge_base(
    config: &BuildConfig,
    progress: &dyn BuildProgress,
) -> Result<BuildResult> {
    progress.phase("Loading structure");
    let structure = loader::load_structure(&config.structure_path)?;

    progress.phase("Loading export");
    let export = XmlExport::open(&config.export_path).map_err(|e| {
        PagesmithError::config(format!(
            "cannot load export {}: {e}",
            config.export_path.display()
        ))
    })?;

    let templates = TemplateDir::new(&config.templates_dir);

    assemble_knowledge_base(
        &structure,
        &export,
        &templates,
        &AssembleOptions::from(config),
        progress,
    )
}

/// Build every page of an already-loaded structure and write all outputs.
pub fn assemble_knowledge_base(
    structure: &Structure,
    search: &dyn DocumentSearch,
    templates: &dyn TemplateSource,
    options: &AssembleOptions,
    progress: &dyn BuildProgress,
) -> Result<BuildResult> {
    let start = Instant::now();

    info!(
        pages = structure.page_count(),
        default_template = %options.default_template,
        "starting build"
    );

    std::fs::create_dir_all(&options.output_dir)
        .map_err(|e| PagesmithError::io(&options.output_dir, e))?;

    progress.phase("Building pages");
    let outcome = StructureWalker::new(search, templates, &options.output_dir, progress)
        .walk(structure, &options.default_template);

    progress.phase("Writing aggregate document");
    let aggregate_path = options.output_dir.join(&options.aggregate_file);
    let aggregate = assembler::write_aggregate(&aggregate_path, &outcome.elements)?;
    let manifest = assembler::write_manifest(
        &options.output_dir,
        &aggregate,
        &outcome.skipped,
        &options.tool_version,
    )?;

    let degraded_count = outcome
        .built
        .iter()
        .filter(|page| page.source != ContentSource::Document)
        .count();

    let result = BuildResult {
        output_dir: options.output_dir.clone(),
        aggregate_path,
        page_count: aggregate.page_count,
        degraded_count,
        skipped: outcome.skipped,
        manifest,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        page_count = result.page_count,
        skipped = result.skipped.len(),
        degraded = result.degraded_count,
        aggregate = %result.aggregate_path.display(),
        elapsed_ms = result.elapsed.as_millis(),
        "build complete"
    );

    Ok(result)
}
