//! Pagesmith CLI: rebuild a structured knowledge base from a raw XML export.
//!
//! Reads a category tree and YAML page templates, fills each template with
//! content mined from the export, and writes Markdown pages plus one
//! aggregate XML document.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
