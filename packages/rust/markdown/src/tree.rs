//! Arena helpers and owned node views for the comrak syntax tree.
//!
//! Nodes live in one `Arena` per render. Stages never mutate a child list
//! while walking it: they collect node handles first and splice afterwards,
//! so positions stay stable and freshly inserted nodes are never revisited.

use std::cell::RefCell;

use comrak::Arena;
use comrak::nodes::{Ast, AstNode, NodeCodeBlock, NodeHtmlBlock, NodeValue};

/// Handle to a node living in a render's arena.
pub type Node<'a> = &'a AstNode<'a>;

/// Allocate a detached node in `arena`.
pub fn new_node<'a>(arena: &'a Arena<AstNode<'a>>, value: NodeValue) -> Node<'a> {
    arena.alloc(AstNode::new(RefCell::new(Ast::new(value, (0, 0).into()))))
}

/// Allocate a paragraph holding a single text node.
pub fn text_paragraph<'a>(arena: &'a Arena<AstNode<'a>>, text: impl Into<String>) -> Node<'a> {
    let paragraph = new_node(arena, NodeValue::Paragraph);
    paragraph.append(new_node(arena, NodeValue::Text(text.into())));
    paragraph
}

/// Replace `target` with `replacements`, in order, at the same position.
///
/// An empty replacement list removes `target`.
pub fn splice<'a>(target: Node<'a>, replacements: &[Node<'a>]) {
    for node in replacements {
        node.detach();
        target.insert_before(node);
    }
    target.detach();
}

/// Concatenated literal text of a node's inline descendants.
pub fn collect_text<'a>(node: Node<'a>) -> String {
    let mut text = String::new();
    for descendant in node.descendants() {
        match &descendant.data.borrow().value {
            NodeValue::Text(t) | NodeValue::Code(comrak::nodes::NodeCode { literal: t, .. }) => {
                text.push_str(t)
            }
            NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

// ---------------------------------------------------------------------------
// Owned views handed to hooks
// ---------------------------------------------------------------------------

/// Owned copy of a fenced or indented code block.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct CodeBlock {
    /// First word of the info string (`dataview` in ` ```dataview `).
    pub language: String,
    /// Remainder of the info string after the language.
    #[serde(default)]
    pub meta: String,
    /// Raw content, without the final newline.
    pub value: String,
}

impl CodeBlock {
    pub fn new(language: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            meta: String::new(),
            value: value.into(),
        }
    }

    /// Read the code block carried by `node`, if it is one.
    pub fn from_node(node: Node<'_>) -> Option<Self> {
        match &node.data.borrow().value {
            NodeValue::CodeBlock(block) => {
                let info = block.info.trim();
                let (language, meta) = match info.split_once(char::is_whitespace) {
                    Some((lang, rest)) => (lang, rest.trim()),
                    None => (info, ""),
                };
                let value = block.literal.strip_suffix('\n').unwrap_or(&block.literal);
                Some(Self {
                    language: language.to_string(),
                    meta: meta.to_string(),
                    value: value.to_string(),
                })
            }
            _ => None,
        }
    }

    fn info(&self) -> String {
        if self.meta.is_empty() {
            self.language.clone()
        } else {
            format!("{} {}", self.language, self.meta)
        }
    }

    fn to_value(&self) -> NodeValue {
        let mut literal = self.value.clone();
        if !literal.is_empty() && !literal.ends_with('\n') {
            literal.push('\n');
        }
        NodeValue::CodeBlock(NodeCodeBlock {
            fenced: true,
            fence_char: b'`',
            fence_length: fence_length(&literal),
            fence_offset: 0,
            info: self.info(),
            literal,
        })
    }
}

/// Shortest backtick fence longer than any backtick run inside `literal`.
fn fence_length(literal: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for c in literal.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    (longest + 1).max(3)
}

/// Owned replacement node a code block hook may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A (possibly rewritten) code block.
    Code(CodeBlock),
    /// A raw HTML/MDX block written through verbatim.
    Html(String),
}

impl Fragment {
    /// Allocate this fragment as a block node in `arena`.
    pub fn into_node<'a>(self, arena: &'a Arena<AstNode<'a>>) -> Node<'a> {
        match self {
            Self::Code(block) => new_node(arena, block.to_value()),
            Self::Html(mut literal) => {
                if !literal.ends_with('\n') {
                    literal.push('\n');
                }
                new_node(
                    arena,
                    NodeValue::HtmlBlock(NodeHtmlBlock {
                        block_type: 0,
                        literal,
                    }),
                )
            }
        }
    }
}
