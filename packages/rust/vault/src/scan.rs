//! Scanning a vault directory into notes.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use walkdir::{DirEntry, WalkDir};

use vaultpress_shared::{
    Catalog, Frontmatter, Note, Result, VaultpressError, parse_frontmatter, split_frontmatter,
};

use crate::selection::Selection;

/// Source of note bodies, keyed by the note's vault-relative path.
pub trait NoteSource {
    /// Text of the note without its frontmatter block.
    ///
    /// Fails with `MissingSource` when the note no longer exists.
    fn read_body(&self, note: &Note) -> Result<String>;
}

/// A directory of markdown notes.
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
    notes: Vec<Note>,
}

impl Vault {
    /// Scan `root` recursively for `*.md` files, sorted by path.
    ///
    /// Hidden directories (`.obsidian`, `.git`, `.trash`) are skipped. A note
    /// whose frontmatter cannot be parsed is kept with an empty mapping.
    #[instrument(fields(root = %root.display()))]
    pub fn scan(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(VaultpressError::config(format!(
                "vault directory not found: {}",
                root.display()
            )));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_markdown_file(e.path()))
            .map(|e| e.into_path())
            .collect();
        files.sort();

        let mut notes = Vec::with_capacity(files.len());
        for file in files {
            let relative = relative_path(root, &file);
            let text = std::fs::read_to_string(&file).map_err(|e| VaultpressError::io(&file, e))?;
            let frontmatter = match split_frontmatter(&text).0.map(parse_frontmatter) {
                Some(Ok(fm)) => fm,
                Some(Err(e)) => {
                    warn!(note = %relative, error = %e, "ignoring unreadable frontmatter");
                    Frontmatter::new()
                }
                None => Frontmatter::new(),
            };

            let name = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            debug!(note = %relative, "scanned note");
            notes.push(Note::new(name, relative, frontmatter));
        }

        info!(count = notes.len(), "vault scanned");
        Ok(Self {
            root: root.to_path_buf(),
            notes,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every note, sorted by path.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Notes matching `selection`, in vault order.
    pub fn select(&self, selection: &Selection) -> Vec<Note> {
        self.notes
            .iter()
            .filter(|note| selection.matches(note))
            .cloned()
            .collect()
    }

    /// Catalog of the notes matching `selection`.
    pub fn catalog(&self, selection: &Selection) -> Catalog {
        Catalog::from_notes(&self.select(selection))
    }
}

impl NoteSource for Vault {
    fn read_body(&self, note: &Note) -> Result<String> {
        let path = self.root.join(&note.path);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VaultpressError::MissingSource { path });
            }
            Err(e) => return Err(VaultpressError::io(&path, e)),
        };
        Ok(split_frontmatter(&text).1.to_string())
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// `/`-separated path of `file` relative to `root`.
fn relative_path(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
