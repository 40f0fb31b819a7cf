//! Selection queries: which notes an export covers.
//!
//! ```text
//! #publish or "guides/setup" or #blog/drafts
//! ```
//!
//! Terms are joined by `or`. A `#tag` term matches notes tagged with the tag
//! or any nested tag below it; a quoted term matches a folder prefix or a
//! single note path. An empty query selects every note.

use std::sync::LazyLock;

use regex::Regex;

use vaultpress_shared::{Note, Result, VaultpressError};

static OR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+or\s+").expect("valid regex"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([\p{L}\p{N}_/-]+)$").expect("valid regex"));

/// One alternative of a selection query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Lowercased tag without the leading `#`.
    Tag(String),
    /// Vault-relative path without surrounding slashes. Empty is the vault root.
    Path(String),
}

impl Term {
    fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();

        if let Some(caps) = TAG_RE.captures(raw) {
            return Ok(Self::Tag(caps[1].trim_matches('/').to_lowercase()));
        }

        if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
            let path = raw[1..raw.len() - 1].trim().trim_matches('/');
            return Ok(Self::Path(path.to_string()));
        }

        Err(VaultpressError::config(format!(
            "invalid selection term `{raw}` (expected `#tag` or `\"folder\"`)"
        )))
    }

    fn matches(&self, note: &Note) -> bool {
        match self {
            Self::Tag(tag) => note_tags(note).iter().any(|t| {
                t == tag
                    || t.strip_prefix(tag.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }),
            Self::Path(path) => {
                if path.is_empty() {
                    return true;
                }
                let without_ext = note.path.strip_suffix(".md").unwrap_or(&note.path);
                without_ext == path
                    || note.path == *path
                    || note
                        .path
                        .strip_prefix(path.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

/// A parsed selection query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    terms: Vec<Term>,
}

impl Selection {
    /// Parse a query string. Blank selects everything.
    pub fn parse(query: &str) -> Result<Self> {
        if query.trim().is_empty() {
            return Ok(Self::default());
        }

        let terms = OR_RE
            .split(query.trim())
            .map(Term::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn matches(&self, note: &Note) -> bool {
        self.terms.is_empty() || self.terms.iter().any(|term| term.matches(note))
    }
}

/// Tags declared in frontmatter (`tags` or `tag`), lowercased, without `#`.
///
/// Accepts a sequence or a string separated by commas or whitespace.
fn note_tags(note: &Note) -> Vec<String> {
    let mut tags = Vec::new();
    for key in ["tags", "tag"] {
        match note.frontmatter.get(key) {
            Some(serde_yaml::Value::Sequence(items)) => {
                tags.extend(items.iter().filter_map(|v| v.as_str()).map(normalize_tag));
            }
            Some(serde_yaml::Value::String(s)) => {
                tags.extend(
                    s.split(|c: char| c == ',' || c.is_whitespace())
                        .filter(|t| !t.is_empty())
                        .map(normalize_tag),
                );
            }
            _ => {}
        }
    }
    tags.retain(|t| !t.is_empty());
    tags
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().trim_start_matches('#').trim_matches('/').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultpress_shared::Frontmatter;

    fn note(path: &str, yaml: &str) -> Note {
        let fm: Frontmatter = if yaml.is_empty() {
            Frontmatter::new()
        } else {
            serde_yaml::from_str(yaml).unwrap()
        };
        let name = path.rsplit('/').next().unwrap().trim_end_matches(".md");
        Note::new(name, path, fm)
    }

    #[test]
    fn empty_query_selects_everything() {
        let selection = Selection::parse("  ").unwrap();
        assert!(selection.terms().is_empty());
        assert!(selection.matches(&note("a.md", "")));
    }

    #[test]
    fn parses_terms() {
        let selection = Selection::parse(r#"#Web OR "guides/" or #blog/drafts"#).unwrap();
        assert_eq!(
            selection.terms(),
            &[
                Term::Tag("web".into()),
                Term::Path("guides".into()),
                Term::Tag("blog/drafts".into()),
            ]
        );
    }

    #[test]
    fn rejects_bad_terms() {
        for query in ["web", "#", r#""unterminated"#, "#a and #b", "#web or"] {
            let err = Selection::parse(query).unwrap_err();
            assert!(matches!(err, VaultpressError::Config { .. }), "{query}");
        }
    }

    #[test]
    fn tag_matching() {
        let selection = Selection::parse("#web").unwrap();
        assert!(selection.matches(&note("a.md", "tags: [web, rust]")));
        assert!(selection.matches(&note("a.md", "tags: '#Web/frontend'")));
        assert!(selection.matches(&note("a.md", "tag: rust, web")));
        assert!(!selection.matches(&note("a.md", "tags: [website]")));
        assert!(!selection.matches(&note("a.md", "")));
    }

    #[test]
    fn nested_tag_query() {
        let selection = Selection::parse("#web/frontend").unwrap();
        assert!(selection.matches(&note("a.md", "tags: [web/frontend/css]")));
        assert!(!selection.matches(&note("a.md", "tags: [web]")));
    }

    #[test]
    fn path_matching() {
        let selection = Selection::parse(r#""guides""#).unwrap();
        assert!(selection.matches(&note("guides/setup.md", "")));
        assert!(selection.matches(&note("guides/deep/more.md", "")));
        assert!(!selection.matches(&note("guidesextra/x.md", "")));
        assert!(!selection.matches(&note("other/setup.md", "")));

        let single = Selection::parse(r#""guides/setup""#).unwrap();
        assert!(single.matches(&note("guides/setup.md", "")));
        assert!(!single.matches(&note("guides/other.md", "")));
    }

    #[test]
    fn alternatives_combine() {
        let selection = Selection::parse(r#"#web or "notes""#).unwrap();
        assert!(selection.matches(&note("notes/a.md", "")));
        assert!(selection.matches(&note("x.md", "tags: [web]")));
        assert!(!selection.matches(&note("x.md", "tags: [other]")));
    }
}
