//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use vaultpress_core::{
    ExportReport, Exporter, FailurePolicy, FsWriter, ProgressReporter, assemble,
    engine_from_config,
};
use vaultpress_hooks::{check_hooks, load_hooks};
use vaultpress_markdown::{ContentProcessor, HookSet};
use vaultpress_shared::{
    AppConfig, Note, PipelineConfig, init_config, load_config, load_config_from,
    parse_frontmatter, split_frontmatter,
};
use vaultpress_vault::{Selection, Vault};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// vaultpress — publish a notes vault as plain markdown.
#[derive(Parser)]
#[command(
    name = "vaultpress",
    version,
    about = "Export a vault of linked notes to plain markdown for static site generators.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.vaultpress/vaultpress.toml.
    #[arg(long, global = true, env = "VAULTPRESS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Options shared by commands that read a vault.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct SourceArgs {
    /// Vault directory (overrides `export.vault`).
    #[arg(long)]
    pub vault: Option<PathBuf>,

    /// Selection query, e.g. `#publish or "guides"` (overrides `export.query`).
    #[arg(short, long)]
    pub query: Option<String>,

    /// Lua hooks file (overrides `export.hooks_file`).
    #[arg(long)]
    pub hooks: Option<PathBuf>,

    /// Query engine command (overrides `query_engine.command`).
    #[arg(long)]
    pub engine: Option<String>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Export every selected note to the output directory.
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory (overrides `export.output`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Skip failing documents instead of aborting the run.
        #[arg(long)]
        keep_going: bool,
    },

    /// Render a single note to stdout.
    Render {
        /// Markdown file to render.
        file: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Hooks module management.
    Hooks {
        #[command(subcommand)]
        action: HooksAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Hooks subcommands.
#[derive(Subcommand)]
pub(crate) enum HooksAction {
    /// Validate a hooks file and list the hooks it defines.
    Check {
        /// Lua hooks file.
        file: PathBuf,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show {
        /// Print as JSON instead of TOML.
        #[arg(long)]
        json: bool,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "vaultpress=info",
        1 => "vaultpress=debug",
        _ => "vaultpress=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
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
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Export {
            source,
            out,
            keep_going,
        } => {
            let config = resolve_config(config_path.as_deref(), &source, out, keep_going)?;
            cmd_export(&config).await
        }
        Command::Render { file, source } => {
            let config = resolve_config(config_path.as_deref(), &source, None, false)?;
            cmd_render(&config, &file).await
        }
        Command::Hooks { action } => match action {
            HooksAction::Check { file } => cmd_hooks_check(&file),
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show { json } => cmd_config_show(config_path.as_deref(), json),
        },
    }
}

/// Config file values, overridden by whatever flags were given.
fn resolve_config(
    path: Option<&Path>,
    source: &SourceArgs,
    out: Option<PathBuf>,
    keep_going: bool,
) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    if let Some(vault) = &source.vault {
        config.export.vault = vault.to_string_lossy().into_owned();
    }
    if let Some(query) = &source.query {
        config.export.query = query.clone();
    }
    if let Some(hooks) = &source.hooks {
        config.export.hooks_file = hooks.to_string_lossy().into_owned();
    }
    if let Some(engine) = &source.engine {
        config.query_engine.command = engine.clone();
    }
    if let Some(out) = out {
        config.export.output = out.to_string_lossy().into_owned();
    }
    if keep_going {
        config.export.keep_going = true;
    }
    Ok(config)
}

/// Hooks, query engine and pipeline settings for a run over `vault_root`.
fn build_processor(config: &AppConfig, vault_root: &Path) -> Result<ContentProcessor> {
    let hooks = if config.export.hooks_file.trim().is_empty() {
        HookSet::default()
    } else {
        load_hooks(Path::new(&config.export.hooks_file))
            .wrap_err("failed to load hooks module")?
    };

    let engine = engine_from_config(&config.query_engine, Some(vault_root.to_path_buf()));
    Ok(ContentProcessor::new(
        engine,
        Rc::new(hooks),
        PipelineConfig::from(config),
    ))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_export(config: &AppConfig) -> Result<()> {
    let vault_root = PathBuf::from(&config.export.vault);
    let selection = Selection::parse(&config.export.query)?;
    let processor = build_processor(config, &vault_root)?;

    let vault = Vault::scan(&vault_root)?;
    let notes = vault.select(&selection);
    let catalog = vault.catalog(&selection);

    info!(
        vault = %vault_root.display(),
        query = %config.export.query,
        selected = notes.len(),
        "exporting notes"
    );

    let writer = FsWriter::new(&config.export.output);
    let policy = if config.export.keep_going {
        FailurePolicy::Continue
    } else {
        FailurePolicy::Abort
    };
    let exporter = Exporter {
        processor: &processor,
        source: &vault,
        writer: &writer,
        policy,
    };

    let reporter = CliProgress::new();
    let report = exporter.run(&notes, &catalog, &reporter).await?;

    // Print summary
    println!();
    println!("  Export complete!");
    println!("  Written: {}", report.written.len());
    println!("  Skipped: {}", report.skipped.len());
    println!("  Failed:  {}", report.failed.len());
    println!("  Output:  {}", writer.root().display());
    println!("  Time:    {:.1}s", report.elapsed.as_secs_f64());
    for failed in &report.failed {
        println!("    ✗ {}: {}", failed.note, failed.reason);
    }
    println!();

    if !report.failed.is_empty() {
        return Err(eyre!("{} document(s) failed", report.failed.len()));
    }
    Ok(())
}

async fn cmd_render(config: &AppConfig, file: &Path) -> Result<()> {
    let vault_root = PathBuf::from(&config.export.vault);
    let selection = Selection::parse(&config.export.query)?;
    let processor = build_processor(config, &vault_root)?;

    let catalog = if vault_root.is_dir() {
        Vault::scan(&vault_root)?.catalog(&selection)
    } else {
        Default::default()
    };

    let text = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("failed to read {}", file.display()))?;
    let (raw_frontmatter, body) = split_frontmatter(&text);
    let frontmatter = match raw_frontmatter {
        Some(yaml) => parse_frontmatter(yaml)?,
        None => Default::default(),
    };

    let name = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| eyre!("'{}' has no file name", file.display()))?;
    let path = relative_to(file, &vault_root);
    let note = Note::new(name, path, frontmatter);

    let document = assemble(&processor, &note, body, &catalog).await?;
    info!(output = %document.path, "rendered note");
    print!("{}", document.text);
    Ok(())
}

/// Vault-relative `/`-separated path of `file`, or its file name when it
/// lives outside the vault.
fn relative_to(file: &Path, vault_root: &Path) -> String {
    let relative = std::fs::canonicalize(file)
        .ok()
        .zip(std::fs::canonicalize(vault_root).ok())
        .and_then(|(file, root)| file.strip_prefix(&root).ok().map(Path::to_path_buf));

    match relative {
        Some(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        None => file
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

fn cmd_hooks_check(file: &Path) -> Result<()> {
    let hooks = check_hooks(file)?;
    println!("{} is a valid hooks module.", file.display());
    if hooks.is_empty() {
        println!("  (no hooks defined)");
    }
    for name in hooks {
        println!("  ✓ {name}");
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>, json: bool) -> Result<()> {
    let config: AppConfig = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using indicatif spinners/bars.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_done(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Exporting [{current}/{total}] {path}"));
    }

    fn done(&self, _report: &ExportReport) {
        self.spinner.finish_and_clear();
    }
}
