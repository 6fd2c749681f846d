//! Category tree traversal and per-page build driver.
//!
//! Pages are visited depth-first: a category's own pages first, then its
//! subcategories in order. Each node passes its resolved template name down;
//! a page's own `template` wins for that page only.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, info, warn};

use pagesmith_extract::{ContentSource, DocumentSearch, extract_content};
use pagesmith_shared::{CategoryNode, PageRef, Result, SkippedPage, Structure, Template};

use crate::assembler;
use crate::loader::TemplateSource;
use crate::pipeline::BuildProgress;
use crate::render::{self, Element};
use crate::template;

/// A page paired with its effective template name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPage<'a> {
    pub page: &'a PageRef,
    pub template: &'a str,
}

/// List every page in traversal order with its resolved template name.
pub fn plan_pages<'a>(structure: &'a Structure, default_template: &'a str) -> Vec<PlannedPage<'a>> {
    fn visit<'a>(node: &'a CategoryNode, inherited: &'a str, out: &mut Vec<PlannedPage<'a>>) {
        let template = node.template.as_deref().unwrap_or(inherited);

        out.extend(node.pages.iter().map(|page| PlannedPage {
            page,
            template: page.template.as_deref().unwrap_or(template),
        }));

        for sub in &node.subcategories {
            visit(sub, template, out);
        }
    }

    let mut out = Vec::with_capacity(structure.page_count());
    for category in &structure.categories {
        visit(category, default_template, &mut out);
    }
    out
}

/// A page that was rendered and written.
#[derive(Debug, Clone)]
pub struct BuiltPage {
    pub id: String,
    pub template: String,
    pub output: PathBuf,
    pub source: ContentSource,
}

/// Everything one walk produced.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Page elements for the aggregate document, in traversal order.
    pub elements: Vec<Element>,
    pub built: Vec<BuiltPage>,
    pub skipped: Vec<SkippedPage>,
}

/// Drives extraction, filling and rendering for every page of a tree.
pub struct StructureWalker<'a> {
    search: &'a dyn DocumentSearch,
    templates: &'a dyn TemplateSource,
    output_root: &'a Path,
    progress: &'a dyn BuildProgress,
    cache: HashMap<String, Rc<Template>>,
}

impl<'a> StructureWalker<'a> {
    pub fn new(
        search: &'a dyn DocumentSearch,
        templates: &'a dyn TemplateSource,
        output_root: &'a Path,
        progress: &'a dyn BuildProgress,
    ) -> Self {
        Self {
            search,
            templates,
            output_root,
            progress,
            cache: HashMap::new(),
        }
    }

    /// Build every page. Failures skip the page and are recorded in the outcome.
    pub fn walk(mut self, structure: &Structure, default_template: &str) -> WalkOutcome {
        let plan = plan_pages(structure, default_template);
        let total = plan.len();
        let mut outcome = WalkOutcome::default();

        for (i, planned) in plan.iter().enumerate() {
            let page = planned.page;
            info!(
                page_id = %page.id,
                title = %page.title,
                template = planned.template,
                "building page"
            );
            self.progress
                .page_started(&page.id, &page.title, planned.template, i + 1, total);

            match self.build_page(page, planned.template) {
                Ok((built, element)) => {
                    info!(page_id = %page.id, path = %built.output.display(), "page built");
                    self.progress.page_built(&page.id, &built.output);
                    outcome.elements.push(element);
                    outcome.built.push(built);
                }
                Err(e) => {
                    warn!(
                        page_id = %page.id,
                        template = planned.template,
                        error = %e,
                        "skipping page"
                    );
                    let reason = e.to_string();
                    self.progress.page_skipped(&page.id, &reason);
                    outcome.skipped.push(SkippedPage {
                        id: page.id.clone(),
                        reason,
                    });
                }
            }
        }

        outcome
    }

    fn build_page(&mut self, page: &PageRef, template_name: &str) -> Result<(BuiltPage, Element)> {
        assembler::page_output_path(self.output_root, &page.id)?;
        let template = self.template(template_name)?;

        let extracted = extract_content(self.search, &page.id);
        if extracted.source != ContentSource::Document {
            self.progress.content_degraded(&page.id, &extracted.source);
        }

        let filled = template::fill(&template.root, &extracted.content)?;

        let markdown = render::to_markdown(&filled);
        let output = assembler::write_page(self.output_root, &page.id, &markdown)?;
        let element = render::to_element(&page.id, &filled);

        let built = BuiltPage {
            id: page.id.clone(),
            template: template.name.clone(),
            output,
            source: extracted.source,
        };
        Ok((built, element))
    }

    /// Load a template once per name; failed loads are retried on the next page.
    fn template(&mut self, name: &str) -> Result<Rc<Template>> {
        if let Some(template) = self.cache.get(name) {
            return Ok(Rc::clone(template));
        }

        let template = Rc::new(self.templates.load(name)?);
        debug!(name, "template cached");
        self.cache.insert(name.to_string(), Rc::clone(&template));
        Ok(template)
    }
}
