//! Obsidian-style callouts.
//!
//! ```text
//! > [!warning]- Be careful
//! > Body text
//! ```
//!
//! becomes a plain blockquote opening with a bold title paragraph. The fold
//! marker (`+`/`-`) has no meaning outside the authoring tool and is dropped.

use std::sync::LazyLock;

use comrak::Arena;
use comrak::nodes::{AstNode, NodeValue};
use regex::Regex;

use crate::tree::{Node, new_node};

static CALLOUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[!([A-Za-z][\w-]*)\]([+-]?)(?:\s+(.*))?$").expect("valid regex")
});

/// Header of a detected callout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callout {
    /// Lowercased kind (`note`, `warning`, ...).
    pub kind: String,
    /// Explicit title, if the author gave one.
    pub title: Option<String>,
}

impl Callout {
    /// Parse the first line of a blockquote.
    pub fn parse(line: &str) -> Option<Self> {
        let caps = CALLOUT_RE.captures(line.trim_end())?;
        let title = caps
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty());
        Some(Self {
            kind: caps[1].to_lowercase(),
            title,
        })
    }

    /// Title shown to the reader.
    pub fn display_title(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        let mut chars = self.kind.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Rewrite every callout blockquote under `root`. Returns how many were found.
pub fn rewrite_callouts<'a>(arena: &'a Arena<AstNode<'a>>, root: Node<'a>) -> usize {
    let quotes: Vec<Node<'a>> = root
        .descendants()
        .filter(|n| matches!(n.data.borrow().value, NodeValue::BlockQuote))
        .collect();

    let mut count = 0;
    for quote in quotes {
        let Some(paragraph) = quote.first_child() else {
            continue;
        };
        if !matches!(paragraph.data.borrow().value, NodeValue::Paragraph) {
            continue;
        }

        let (header_nodes, line) = first_line(paragraph);
        let Some(callout) = Callout::parse(&line) else {
            continue;
        };

        for node in header_nodes {
            node.detach();
        }
        if paragraph.first_child().is_none() {
            paragraph.detach();
        }

        let title = new_node(arena, NodeValue::Paragraph);
        let strong = new_node(arena, NodeValue::Strong);
        strong.append(new_node(arena, NodeValue::Text(callout.display_title())));
        title.append(strong);
        quote.prepend(title);
        count += 1;
    }

    count
}

/// Leading text nodes of `paragraph` up to and including the first line
/// break, with their concatenated text. Stops at any non-text inline, since
/// a callout header is plain text.
fn first_line<'a>(paragraph: Node<'a>) -> (Vec<Node<'a>>, String) {
    let mut nodes = Vec::new();
    let mut line = String::new();

    for child in paragraph.children() {
        match &child.data.borrow().value {
            NodeValue::Text(text) => line.push_str(text),
            NodeValue::SoftBreak | NodeValue::LineBreak => {
                nodes.push(child);
                break;
            }
            _ => return (Vec::new(), String::new()),
        }
        nodes.push(child);
    }

    (nodes, line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{comrak_options, serialize};
    use comrak::parse_document;
    use vaultpress_shared::PipelineConfig;

    fn rewrite(markdown: &str) -> (usize, String) {
        let config = PipelineConfig::default();
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &comrak_options(&config));
        let count = rewrite_callouts(&arena, root);
        (count, serialize(root, &config).unwrap())
    }

    #[test]
    fn parse_header() {
        assert_eq!(
            Callout::parse("[!WARNING]- Be careful"),
            Some(Callout {
                kind: "warning".into(),
                title: Some("Be careful".into())
            })
        );
        assert_eq!(
            Callout::parse("[!note]"),
            Some(Callout {
                kind: "note".into(),
                title: None
            })
        );
        assert!(Callout::parse("[note] not a callout").is_none());
        assert!(Callout::parse("plain quote").is_none());
    }

    #[test]
    fn display_title_defaults_to_kind() {
        let callout = Callout::parse("[!tip]").unwrap();
        assert_eq!(callout.display_title(), "Tip");
    }

    #[test]
    fn rewrites_titled_callout() {
        let (count, out) = rewrite("> [!warning] Be careful\n> Body text\n");
        assert_eq!(count, 1);
        assert!(out.starts_with("> **Be careful**\n"), "{out}");
        assert!(out.trim_end().ends_with("> Body text"), "{out}");
        assert!(!out.contains("[!"));
    }

    #[test]
    fn rewrites_bare_callout() {
        let (count, out) = rewrite("> [!note]\n> Remember this.\n");
        assert_eq!(count, 1);
        assert!(out.starts_with("> **Note**\n"), "{out}");
        assert!(out.contains("> Remember this."));
    }

    #[test]
    fn header_only_callout() {
        let (_, out) = rewrite("> [!info]+ Heads up\n");
        assert_eq!(out, "> **Heads up**\n");
    }

    #[test]
    fn plain_blockquote_untouched() {
        let (count, out) = rewrite("> Just a quote\n");
        assert_eq!(count, 0);
        assert_eq!(out, "> Just a quote\n");
    }
}
