//! Core domain types for vaultpress exports.

use serde::{Deserialize, Serialize};

/// A note's frontmatter: an ordered mapping of string keys to arbitrary values.
pub type Frontmatter = serde_yaml::Mapping;

// ---------------------------------------------------------------------------
// Note
// ---------------------------------------------------------------------------

/// A single note selected for export.
///
/// Immutable input to the content pipeline; hooks receive it by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Identity used for cross-reference resolution (the file stem).
    pub name: String,
    /// Vault-relative path with `/` separators (e.g., `guides/setup.md`).
    pub path: String,
    /// Output key used to build hyperlinks (`/<slug>`).
    pub slug: String,
    /// Raw frontmatter as found in the source file.
    #[serde(default)]
    pub frontmatter: Frontmatter,
}

impl Note {
    /// Build a note whose slug is derived from the frontmatter `slug` field,
    /// falling back to the slugified name.
    pub fn new(name: impl Into<String>, path: impl Into<String>, frontmatter: Frontmatter) -> Self {
        let name = name.into();
        let slug = frontmatter
            .get("slug")
            .and_then(serde_yaml::Value::as_str)
            .map(|s| s.trim_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&name));

        Self {
            name,
            path: path.into(),
            slug,
            frontmatter,
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A known cross-reference target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Identity matched against the target of `[[target]]`.
    pub name: String,
    /// Slug the hyperlink points at.
    pub slug: String,
}

/// Ordered, read-only set of notes usable as cross-reference targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Create a catalog from explicit entries, keeping their order.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Create a catalog from the notes selected for export.
    pub fn from_notes(notes: &[Note]) -> Self {
        Self::new(
            notes
                .iter()
                .map(|n| CatalogEntry {
                    name: n.name.clone(),
                    slug: n.slug.clone(),
                })
                .collect(),
        )
    }

    /// First entry whose name matches `name` exactly (case-sensitive).
    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

/// Convert a note name to kebab-case (lowercase, dashes between words).
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
