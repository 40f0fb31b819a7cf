//! Query engine backed by an external command.
//!
//! The query text is written to the command's stdin; whatever it prints on
//! stdout is taken as the rendered markdown.

use std::path::PathBuf;
use std::process::Stdio;
use std::rc::Rc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use vaultpress_markdown::{QueryEngine, UnavailableQueryEngine};
use vaultpress_shared::{QueryEngineSection, Result, VaultpressError};

/// Runs one process per query.
#[derive(Debug, Clone)]
pub struct CommandQueryEngine {
    command: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandQueryEngine {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            working_dir: None,
        }
    }

    /// Run the command from `dir` (usually the vault root).
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

#[async_trait(?Send)]
impl QueryEngine for CommandQueryEngine {
    async fn try_query_markdown(&self, query: &str) -> Result<String> {
        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            VaultpressError::query_engine(format!(
                "failed to spawn `{}`: {e}. Is it installed?",
                self.command
            ))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| VaultpressError::query_engine("failed to capture query engine stdin"))?;
        let command_name = &self.command;
        // Fed while output is collected so a streaming command cannot fill
        // its stdout pipe and stall. A command may exit without reading its
        // input; its status decides.
        let feed = async move {
            match stdin.write_all(query.as_bytes()).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => {
                    return Err(VaultpressError::query_engine(format!(
                        "failed to write query to `{command_name}`: {e}"
                    )));
                }
            }
            drop(stdin);
            Ok(())
        };
        let collect = async {
            child.wait_with_output().await.map_err(|e| {
                VaultpressError::query_engine(format!("failed to wait for `{command_name}`: {e}"))
            })
        };

        let ((), output) = tokio::try_join!(feed, collect)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VaultpressError::query_engine(format!(
                "`{}` exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let markdown = String::from_utf8(output.stdout).map_err(|e| {
            VaultpressError::query_engine(format!("`{}` printed invalid UTF-8: {e}", self.command))
        })?;
        debug!(command = %self.command, bytes = markdown.len(), "query rendered");
        Ok(markdown)
    }
}

/// Build the configured engine, or one that rejects every query when no
/// command is set.
pub fn engine_from_config(
    section: &QueryEngineSection,
    working_dir: Option<PathBuf>,
) -> Rc<dyn QueryEngine> {
    if section.command.trim().is_empty() {
        info!("no query engine configured; query blocks will fail");
        return Rc::new(UnavailableQueryEngine);
    }

    let mut engine = CommandQueryEngine::new(section.command.trim(), section.args.clone());
    if let Some(dir) = working_dir {
        engine = engine.with_working_dir(dir);
    }
    Rc::new(engine)
}
