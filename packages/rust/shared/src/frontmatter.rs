//! Splitting, parsing and rendering YAML frontmatter blocks.

use crate::error::{Result, VaultpressError};
use crate::types::Frontmatter;

/// Marker line that opens and closes a frontmatter block.
pub const FRONTMATTER_DELIMITER: &str = "---";

/// Split a note's text into its raw frontmatter (if any) and its body.
///
/// The frontmatter block must start on the first line with `---` and end
/// with a line containing only `---`. Text without a complete block is
/// returned whole as the body.
pub fn split_frontmatter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = strip_delimiter_line(text) else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == FRONTMATTER_DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }

    (None, text)
}

fn strip_delimiter_line(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(FRONTMATTER_DELIMITER)?;
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

/// Parse a raw YAML block into a frontmatter mapping.
///
/// An empty or null block yields an empty mapping.
pub fn parse_frontmatter(yaml: &str) -> Result<Frontmatter> {
    if yaml.trim().is_empty() {
        return Ok(Frontmatter::new());
    }

    match serde_yaml::from_str::<serde_yaml::Value>(yaml) {
        Ok(serde_yaml::Value::Mapping(map)) => Ok(map),
        Ok(serde_yaml::Value::Null) => Ok(Frontmatter::new()),
        Ok(other) => Err(VaultpressError::frontmatter(format!(
            "expected a mapping, found {}",
            value_kind(&other)
        ))),
        Err(e) => Err(VaultpressError::frontmatter(e.to_string())),
    }
}

/// Render a frontmatter block, delimiters included.
///
/// An empty mapping renders as an empty block (`---\n---\n`).
pub fn render_frontmatter(frontmatter: &Frontmatter) -> Result<String> {
    let mut out = String::from("---\n");
    if !frontmatter.is_empty() {
        let yaml = serde_yaml::to_string(frontmatter)
            .map_err(|e| VaultpressError::frontmatter(e.to_string()))?;
        out.push_str(&yaml);
        if !yaml.ends_with('\n') {
            out.push('\n');
        }
    }
    out.push_str("---\n");
    Ok(out)
}

fn value_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}
