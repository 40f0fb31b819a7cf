//! Markdown transformation for exported notes.
//!
//! Documents are parsed into a comrak tree, rewritten by a fixed sequence of
//! stages and serialized back to CommonMark:
//!
//! 1. wikilinks (`[[Target|alias]]`) become links or plain text
//! 2. callouts become plain blockquotes with a bold title
//! 3. query blocks are rendered by the [`QueryEngine`] and recursively
//!    processed, other code blocks go through the `process_codeblock` hook
//!
//! [`ContentProcessor`] drives the stages and the content hooks around them.

mod callout;
mod cleanup;
mod codeblock;
mod hooks;
mod processor;
mod query;
mod tree;
mod wikilink;

pub use callout::{Callout, rewrite_callouts};
pub use codeblock::{Splice, dispatch_codeblocks};
pub use hooks::{CodeblockOutcome, HOOK_NAMES, HookFuture, HookSet};
pub use processor::{ContentProcessor, RenderContext, comrak_options, serialize};
pub use query::{QueryEngine, UnavailableQueryEngine};
pub use tree::{CodeBlock, Fragment, Node};
pub use wikilink::{LinkResolver, Resolved, WikiLink, resolve_wikilinks};
