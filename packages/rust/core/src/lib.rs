//! Core build pipeline for Pagesmith.
//!
//! Loads the category tree and templates, walks every page through
//! extraction, template filling and rendering, and writes the per-page
//! Markdown files, the aggregate XML document and the build manifest.

pub mod assembler;
pub mod loader;
pub mod pipeline;
pub mod render;
pub mod template;
pub mod walker;
