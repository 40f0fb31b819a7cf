//! Writing assembled documents under the export root.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use vaultpress_shared::{Result, VaultpressError};

/// Destination for rendered documents.
pub trait OutputWriter {
    /// Write `contents` at `relative` under the destination, overwriting any
    /// existing file. Returns the full path written.
    fn write(&self, relative: &str, contents: &str) -> Result<PathBuf>;
}

/// Writes documents into a directory on disk.
#[derive(Debug, Clone)]
pub struct FsWriter {
    root: PathBuf,
}

impl FsWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputWriter for FsWriter {
    fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let relative = checked_relative(relative)?;
        let target = self.root.join(relative);

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| VaultpressError::io(parent, e))?;
        }

        // Write to temp file first
        let mut temp = target.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        std::fs::write(&temp, contents).map_err(|e| VaultpressError::io(&temp, e))?;

        // Atomic rename
        std::fs::rename(&temp, &target).map_err(|e| VaultpressError::io(&target, e))?;

        debug!(path = %target.display(), size = contents.len(), "wrote document");
        Ok(target)
    }
}

/// Reject paths that would land outside the export root.
fn checked_relative(relative: &str) -> Result<&Path> {
    let path = Path::new(relative);
    if relative.trim().is_empty() {
        return Err(VaultpressError::validation("output path is empty"));
    }

    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(VaultpressError::validation(format!(
                    "output path `{relative}` escapes the output directory"
                )));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(VaultpressError::validation(format!(
                    "output path `{relative}` must be relative"
                )));
            }
        }
    }
    Ok(path)
}
