//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use pagesmith_core::pipeline::{BuildProgress, BuildResult, build_knowledge_base};
use pagesmith_extract::{ContentSource, XmlExport, extract_content};
use pagesmith_shared::{
    AppConfig, BuildConfig, config_file_path, init_config, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Pagesmith: rebuild documentation pages from a raw XML export.
#[derive(Parser)]
#[command(
    name = "pagesmith",
    version,
    about = "Rebuild a structured knowledge base from a raw XML export and YAML templates.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build every page, the aggregate document and the manifest.
    Build(BuildArgs),

    /// Print the extracted content for a single page as JSON.
    Extract {
        /// Page id to look up in the export.
        page_id: String,

        /// Config file (defaults to ./pagesmith.toml, then ~/.pagesmith/pagesmith.toml).
        #[arg(long)]
        config: Option<PathBuf>,

        /// XML export file.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `pagesmith build`. Each one overrides the config file.
#[derive(Args, Debug, Default)]
pub(crate) struct BuildArgs {
    /// Config file (defaults to ./pagesmith.toml, then ~/.pagesmith/pagesmith.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// XML export file.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Category tree (YAML).
    #[arg(long)]
    pub structure: Option<PathBuf>,

    /// Templates directory.
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Output directory.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Template used where no category or page names one.
    #[arg(long)]
    pub default_template: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default pagesmith.toml into the current directory.
    Init,
    /// Show resolved configuration.
    Show {
        /// Config file (defaults to ./pagesmith.toml, then ~/.pagesmith/pagesmith.toml).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pagesmith=warn",
        1 => "pagesmith=info",
        2 => "pagesmith=debug",
        _ => "pagesmith=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build(args) => cmd_build(&args),
        Command::Extract {
            page_id,
            config,
            export,
        } => cmd_extract(&page_id, config.as_deref(), export),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show { config } => cmd_config_show(config.as_deref()),
        },
    }
}

/// Load the config file named on the command line, or the default lookup chain.
fn resolve_config(explicit: Option<&Path>) -> Result<AppConfig> {
    Ok(resolve_config_source(explicit)?.1)
}

/// Like [`resolve_config`], also returning the file the values came from
/// (`None` when built-in defaults are used).
fn resolve_config_source(explicit: Option<&Path>) -> Result<(Option<PathBuf>, AppConfig)> {
    match explicit {
        Some(path) => Ok((Some(path.to_path_buf()), load_config_from(path)?)),
        None => {
            let source = config_file_path()?;
            Ok((source, load_config()?))
        }
    }
}

/// Merge config file values with command-line overrides.
fn build_config(app: &AppConfig, args: &BuildArgs) -> BuildConfig {
    let mut config = BuildConfig::from(app);

    if let Some(export) = &args.export {
        config.export_path = export.clone();
    }
    if let Some(structure) = &args.structure {
        config.structure_path = structure.clone();
    }
    if let Some(templates) = &args.templates {
        config.templates_dir = templates.clone();
    }
    if let Some(out) = &args.out {
        config.output_dir = out.clone();
    }
    if let Some(name) = &args.default_template {
        config.default_template = name.clone();
    }
    config.tool_version = env!("CARGO_PKG_VERSION").to_string();

    config
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_build(args: &BuildArgs) -> Result<()> {
    let app = resolve_config(args.config.as_deref())?;
    let config = build_config(&app, args);

    info!(
        export = %config.export_path.display(),
        structure = %config.structure_path.display(),
        out = %config.output_dir.display(),
        "building knowledge base"
    );

    let reporter = CliProgress::new();
    let result = build_knowledge_base(&config, &reporter)?;

    println!();
    println!("  Knowledge base built.");
    println!("  Pages:     {}", result.page_count);
    println!("  Degraded:  {}", result.degraded_count);
    println!("  Skipped:   {}", result.skipped.len());
    for skipped in &result.skipped {
        println!("    - {}: {}", skipped.id, skipped.reason);
    }
    println!("  Aggregate: {}", result.aggregate_path.display());
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_extract(page_id: &str, config: Option<&Path>, export: Option<PathBuf>) -> Result<()> {
    let export_path = match export {
        Some(path) => path,
        None => PathBuf::from(resolve_config(config)?.paths.export),
    };

    let export = XmlExport::open(&export_path)
        .map_err(|e| eyre!("cannot load export {}: {e}", export_path.display()))?;
    let extracted = extract_content(&export, page_id);

    match &extracted.source {
        ContentSource::Document => {}
        ContentSource::NotFound => {
            eprintln!("warning: no document with id '{page_id}'; showing placeholders")
        }
        ContentSource::Unreadable(reason) => eprintln!(
            "warning: document for '{page_id}' unreadable ({reason}); showing placeholders"
        ),
    }

    println!("{}", serde_json::to_string_pretty(&extracted.content)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let cwd = std::env::current_dir()
        .map_err(|e| eyre!("cannot determine working directory: {e}"))?;
    let path = init_config(&cwd)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(explicit: Option<&Path>) -> Result<()> {
    let (source, config) = resolve_config_source(explicit)?;
    match source {
        Some(path) => println!("# loaded from {}", path.display()),
        None => println!("# no config file found; built-in defaults"),
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl BuildProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_started(
        &self,
        page_id: &str,
        _title: &str,
        template: &str,
        current: usize,
        total: usize,
    ) {
        self.spinner
            .set_message(format!("Building [{current}/{total}] {page_id} ({template})"));
    }

    fn content_degraded(&self, page_id: &str, source: &ContentSource) {
        let why = match source {
            ContentSource::NotFound => "not in export".to_string(),
            ContentSource::Unreadable(reason) => reason.clone(),
            ContentSource::Document => return,
        };
        self.spinner
            .println(format!("  ! {page_id}: using placeholders ({why})"));
    }

    fn page_built(&self, _page_id: &str, _path: &Path) {}

    fn page_skipped(&self, page_id: &str, reason: &str) {
        self.spinner.println(format!("  x {page_id}: {reason}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_build(args: &[&str]) -> BuildArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Build(args) => args,
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn build_flags_override_config_file() {
        let args = parse_build(&[
            "pagesmith",
            "build",
            "--export",
            "in/export.xml",
            "--out",
            "site",
            "--default-template",
            "plain",
        ]);
        let config = build_config(&AppConfig::default(), &args);

        assert_eq!(config.export_path, PathBuf::from("in/export.xml"));
        assert_eq!(config.output_dir, PathBuf::from("site"));
        assert_eq!(config.default_template, "plain");
        assert_eq!(config.structure_path, PathBuf::from("config/structure.yaml"));
        assert_eq!(config.aggregate_file, "knowledge_base.xml");
        assert_eq!(config.tool_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pagesmith",
            "extract",
            "faq/general",
            "-vv",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(
            cli.command,
            Command::Extract { ref page_id, .. } if page_id == "faq/general"
        ));
    }

    #[test]
    fn config_show_reads_explicit_file() {
        let dir = std::env::temp_dir().join(format!("ps-cli-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("custom.toml");
        std::fs::write(&path, "[paths]\nexport = \"dumps/site.xml\"\n").unwrap();

        let cli = Cli::try_parse_from([
            "pagesmith",
            "config",
            "show",
            "--config",
            path.to_str().unwrap(),
        ])
        .unwrap();
        let Command::Config {
            action: ConfigAction::Show { config },
        } = cli.command
        else {
            panic!("expected config show");
        };

        let (source, app) = resolve_config_source(config.as_deref()).unwrap();
        assert_eq!(source.as_deref(), Some(path.as_path()));
        assert_eq!(app.paths.export, "dumps/site.xml");
        assert_eq!(app.paths.structure, "config/structure.yaml");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
