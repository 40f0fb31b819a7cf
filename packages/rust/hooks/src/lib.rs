//! Lua hooks modules.
//!
//! A hooks file is a Lua 5.4 chunk returning a table of functions keyed by
//! hook name:
//!
//! ```lua
//! return {
//!   header_content = function(frontmatter, note)
//!     return "# " .. (frontmatter.title or note.name) .. "\n\n"
//!   end,
//!   output_path = function(note, frontmatter, text)
//!     return note.slug .. ".md"
//!   end,
//! }
//! ```
//!
//! `process_codeblock` may return `nil` (keep the block), a string (written
//! as literal paragraph text, so `**x**` comes out escaped) or a table:
//! `{ type = "html", value = "<Chart />" }` for raw markup, otherwise a code
//! block whose `language`, `meta` and `value` default to the original's.
//!
//! The module is validated once when loaded and adapted into a
//! [`HookSet`](vaultpress_markdown::HookSet); slots it leaves empty keep
//! their defaults.

mod bridge;
mod helpers;
mod module;

pub use module::{HookModule, check_hooks, load_hooks};
