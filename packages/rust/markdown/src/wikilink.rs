//! Cross-reference resolution: `[[target]]` and `[[target|alias]]`.
//!
//! Every wikilink node is replaced by either a hyperlink or plain text. A
//! reference to something the catalog does not know is flattened to its
//! visible text, so no broken link is ever emitted.

use comrak::Arena;
use comrak::nodes::{AstNode, NodeLink, NodeValue};
use tracing::trace;

use vaultpress_shared::Catalog;

use crate::tree::{Node, collect_text, new_node, splice};

/// A cross-reference token as written by the author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    /// Trimmed target identity.
    pub target: String,
    /// Trimmed alias, absent when it would only repeat the target.
    pub alias: Option<String>,
}

impl WikiLink {
    /// Build a token from the raw target and the raw visible label.
    pub fn new(raw_target: &str, raw_label: Option<&str>) -> Self {
        let target = raw_target.trim().to_string();
        let alias = raw_label
            .map(str::trim)
            .filter(|label| !label.is_empty() && *label != target)
            .map(str::to_string);
        Self { target, alias }
    }

    /// Text shown to the reader: the alias if present, else the target.
    pub fn text(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.target)
    }
}

/// What a cross-reference turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A hyperlink to `url` showing `text`.
    Link { url: String, text: String },
    /// Plain text.
    Text(String),
}

/// Policy deciding how a cross-reference is rendered.
pub trait LinkResolver {
    fn resolve(&self, link: &WikiLink) -> Resolved;
}

/// Default policy: link to `/<slug>` of the first note named `target`,
/// otherwise flatten to text.
impl LinkResolver for Catalog {
    fn resolve(&self, link: &WikiLink) -> Resolved {
        match self.find(&link.target) {
            Some(entry) => Resolved::Link {
                url: format!("/{}", entry.slug),
                text: link.text().to_string(),
            },
            None => Resolved::Text(link.text().to_string()),
        }
    }
}

/// Replace every wikilink under `root`. Returns how many were resolved.
pub fn resolve_wikilinks<'a>(
    arena: &'a Arena<AstNode<'a>>,
    root: Node<'a>,
    resolver: &dyn LinkResolver,
) -> usize {
    let targets: Vec<(Node<'a>, WikiLink)> = root
        .descendants()
        .filter_map(|node| {
            let url = match &node.data.borrow().value {
                NodeValue::WikiLink(wiki) => wiki.url.clone(),
                _ => return None,
            };
            let label = collect_text(node);
            let label = (!label.is_empty()).then_some(label);
            Some((node, WikiLink::new(&url, label.as_deref())))
        })
        .collect();

    for (node, link) in &targets {
        let replacement = match resolver.resolve(link) {
            Resolved::Link { url, text } => {
                let anchor = new_node(
                    arena,
                    NodeValue::Link(NodeLink {
                        url,
                        title: String::new(),
                    }),
                );
                anchor.append(new_node(arena, NodeValue::Text(text)));
                anchor
            }
            Resolved::Text(text) => new_node(arena, NodeValue::Text(text)),
        };
        trace!(note = %link.target, "resolved cross-reference");
        splice(*node, &[replacement]);
    }

    targets.len()
}
