//! Application configuration for vaultpress.
//!
//! User config lives at `~/.vaultpress/vaultpress.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultpressError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "vaultpress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".vaultpress";

// ---------------------------------------------------------------------------
// Config structs (matching vaultpress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// What to export and where.
    #[serde(default)]
    pub export: ExportSection,

    /// Content pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// External query engine.
    #[serde(default)]
    pub query_engine: QueryEngineSection,
}

/// `[export]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSection {
    /// Root directory of the notes to export.
    #[serde(default = "default_vault")]
    pub vault: String,

    /// Selection query (`#tag`, `"folder"`, joined by `or`). Empty selects everything.
    #[serde(default)]
    pub query: String,

    /// Output directory. Existing files are overwritten.
    #[serde(default = "default_output")]
    pub output: String,

    /// Optional Lua hooks file.
    #[serde(default)]
    pub hooks_file: String,

    /// Skip documents that fail instead of aborting the run.
    #[serde(default)]
    pub keep_going: bool,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            vault: default_vault(),
            query: String::new(),
            output: default_output(),
            hooks_file: String::new(),
            keep_going: false,
        }
    }
}

fn default_vault() -> String {
    ".".into()
}
fn default_output() -> String {
    "dist".into()
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Code block language that marks an embedded query.
    #[serde(default = "default_query_language")]
    pub query_language: String,

    /// How many levels of query-in-query expansion are allowed.
    #[serde(default = "default_max_query_depth")]
    pub max_query_depth: usize,

    /// Bullet list marker: `*` or `-`.
    #[serde(default = "default_bullet")]
    pub bullet: char,

    /// Rewrite `> [!kind] Title` callouts into plain blockquotes.
    #[serde(default = "default_true")]
    pub callouts: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            query_language: default_query_language(),
            max_query_depth: default_max_query_depth(),
            bullet: default_bullet(),
            callouts: true,
        }
    }
}

fn default_query_language() -> String {
    "dataview".into()
}
fn default_max_query_depth() -> usize {
    8
}
fn default_bullet() -> char {
    '*'
}
fn default_true() -> bool {
    true
}

/// `[query_engine]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryEngineSection {
    /// Program that reads a query on stdin and prints markdown. Empty disables queries.
    #[serde(default)]
    pub command: String,

    /// Extra arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Bullet marker used when serializing unordered lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletStyle {
    Star,
    Dash,
}

/// Runtime content pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Code block language that marks an embedded query.
    pub query_language: String,
    /// Maximum query-in-query expansion depth.
    pub max_query_depth: usize,
    /// Bullet list marker.
    pub bullet: BulletStyle,
    /// Whether callouts are rewritten.
    pub callouts: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            query_language: config.pipeline.query_language.clone(),
            max_query_depth: config.pipeline.max_query_depth,
            bullet: match config.pipeline.bullet {
                '-' => BulletStyle::Dash,
                _ => BulletStyle::Star,
            },
            callouts: config.pipeline.callouts,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.vaultpress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| VaultpressError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.vaultpress/vaultpress.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| VaultpressError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        VaultpressError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| VaultpressError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| VaultpressError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| VaultpressError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check values that deserialize fine but make no sense.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if !matches!(config.pipeline.bullet, '*' | '-') {
        return Err(VaultpressError::config(format!(
            "pipeline.bullet must be '*' or '-', got '{}'",
            config.pipeline.bullet
        )));
    }
    if config.pipeline.query_language.trim().is_empty() {
        return Err(VaultpressError::config(
            "pipeline.query_language must not be empty",
        ));
    }
    Ok(())
}
