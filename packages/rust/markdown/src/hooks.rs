//! The user extension contract: seven optional hooks at fixed seams.
//!
//! | Hook | Invoked | Default |
//! |---|---|---|
//! | `frontmatter` | once per document, before assembly | identity |
//! | `header_content` | once per document | empty text |
//! | `preprocess_content` | before parse | identity |
//! | `process_codeblock` | per non-query code block | unchanged |
//! | `postprocess_content` | after serialize | identity |
//! | `footer_content` | once per document | empty text |
//! | `output_path` | once per document, on the final text | the note's own path |
//!
//! Defaults are bound once in [`HookSet::default`], so call sites never
//! branch on whether a hook exists.

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use vaultpress_shared::{Frontmatter, Note, Result};

use crate::tree::{CodeBlock, Fragment};

/// Names of every hook slot, as user modules spell them.
pub const HOOK_NAMES: [&str; 7] = [
    "frontmatter",
    "header_content",
    "preprocess_content",
    "process_codeblock",
    "postprocess_content",
    "footer_content",
    "output_path",
];

/// Pending result of an asynchronous hook.
pub type HookFuture<T> = LocalBoxFuture<'static, Result<T>>;

/// What `process_codeblock` decided for one code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeblockOutcome {
    /// Leave the node untouched.
    Unchanged,
    /// Put this node in its place.
    Replace(Fragment),
    /// Put this text in its place, as a paragraph. The text is literal:
    /// markdown syntax in it is escaped on output (`**x**` is written as
    /// `\*\*x\*\*`). Return [`Fragment::Html`] through `Replace` for raw
    /// markup.
    Text(String),
}

type FrontmatterFn = dyn Fn(Frontmatter, &Note) -> Result<Frontmatter>;
type DocumentTextFn = dyn Fn(&Frontmatter, &Note) -> Result<String>;
type ContentFn = dyn Fn(String, &Note, &Frontmatter) -> Result<String>;
type CodeblockFn = dyn Fn(&CodeBlock) -> HookFuture<CodeblockOutcome>;
type OutputPathFn = dyn Fn(&Note, &Frontmatter, &str) -> Result<String>;

/// A complete set of hooks, with defaults filling every slot the user left empty.
pub struct HookSet {
    frontmatter: Box<FrontmatterFn>,
    header_content: Box<DocumentTextFn>,
    preprocess_content: Box<ContentFn>,
    process_codeblock: Box<CodeblockFn>,
    postprocess_content: Box<ContentFn>,
    footer_content: Box<DocumentTextFn>,
    output_path: Box<OutputPathFn>,
    installed: Vec<&'static str>,
}

impl Default for HookSet {
    fn default() -> Self {
        Self {
            frontmatter: Box::new(|fm, _| Ok(fm)),
            header_content: Box::new(|_, _| Ok(String::new())),
            preprocess_content: Box::new(|text, _, _| Ok(text)),
            process_codeblock: Box::new(|_| {
                futures::future::ready(Ok(CodeblockOutcome::Unchanged)).boxed_local()
            }),
            postprocess_content: Box::new(|text, _, _| Ok(text)),
            footer_content: Box::new(|_, _| Ok(String::new())),
            output_path: Box::new(|note, _, _| Ok(note.path.clone())),
            installed: Vec::new(),
        }
    }
}

impl std::fmt::Debug for HookSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookSet")
            .field("installed", &self.installed)
            .finish_non_exhaustive()
    }
}

impl HookSet {
    /// Hook set where every slot is its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the slots filled by the user, in installation order.
    pub fn installed(&self) -> &[&'static str] {
        &self.installed
    }

    fn mark(&mut self, name: &'static str) {
        if !self.installed.contains(&name) {
            self.installed.push(name);
        }
    }

    // --- builders ---

    pub fn with_frontmatter(
        mut self,
        hook: impl Fn(Frontmatter, &Note) -> Result<Frontmatter> + 'static,
    ) -> Self {
        self.frontmatter = Box::new(hook);
        self.mark("frontmatter");
        self
    }

    pub fn with_header_content(
        mut self,
        hook: impl Fn(&Frontmatter, &Note) -> Result<String> + 'static,
    ) -> Self {
        self.header_content = Box::new(hook);
        self.mark("header_content");
        self
    }

    pub fn with_preprocess_content(
        mut self,
        hook: impl Fn(String, &Note, &Frontmatter) -> Result<String> + 'static,
    ) -> Self {
        self.preprocess_content = Box::new(hook);
        self.mark("preprocess_content");
        self
    }

    /// Install a synchronous code block hook.
    pub fn with_process_codeblock(
        self,
        hook: impl Fn(&CodeBlock) -> Result<CodeblockOutcome> + 'static,
    ) -> Self {
        self.with_process_codeblock_async(move |block| {
            futures::future::ready(hook(block)).boxed_local()
        })
    }

    /// Install a code block hook that may suspend.
    pub fn with_process_codeblock_async(
        mut self,
        hook: impl Fn(&CodeBlock) -> HookFuture<CodeblockOutcome> + 'static,
    ) -> Self {
        self.process_codeblock = Box::new(hook);
        self.mark("process_codeblock");
        self
    }

    pub fn with_postprocess_content(
        mut self,
        hook: impl Fn(String, &Note, &Frontmatter) -> Result<String> + 'static,
    ) -> Self {
        self.postprocess_content = Box::new(hook);
        self.mark("postprocess_content");
        self
    }

    pub fn with_footer_content(
        mut self,
        hook: impl Fn(&Frontmatter, &Note) -> Result<String> + 'static,
    ) -> Self {
        self.footer_content = Box::new(hook);
        self.mark("footer_content");
        self
    }

    pub fn with_output_path(
        mut self,
        hook: impl Fn(&Note, &Frontmatter, &str) -> Result<String> + 'static,
    ) -> Self {
        self.output_path = Box::new(hook);
        self.mark("output_path");
        self
    }

    // --- invocation ---

    pub fn frontmatter(&self, raw: Frontmatter, note: &Note) -> Result<Frontmatter> {
        (self.frontmatter)(raw, note)
    }

    pub fn header_content(&self, frontmatter: &Frontmatter, note: &Note) -> Result<String> {
        (self.header_content)(frontmatter, note)
    }

    pub fn preprocess_content(
        &self,
        text: String,
        note: &Note,
        frontmatter: &Frontmatter,
    ) -> Result<String> {
        (self.preprocess_content)(text, note, frontmatter)
    }

    pub fn process_codeblock(&self, block: &CodeBlock) -> HookFuture<CodeblockOutcome> {
        (self.process_codeblock)(block)
    }

    pub fn postprocess_content(
        &self,
        text: String,
        note: &Note,
        frontmatter: &Frontmatter,
    ) -> Result<String> {
        (self.postprocess_content)(text, note, frontmatter)
    }

    pub fn footer_content(&self, frontmatter: &Frontmatter, note: &Note) -> Result<String> {
        (self.footer_content)(frontmatter, note)
    }

    pub fn output_path(&self, note: &Note, frontmatter: &Frontmatter, text: &str) -> Result<String> {
        (self.output_path)(note, frontmatter, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultpress_shared::VaultpressError;

    fn note() -> Note {
        Note::new("Page", "folder/Page.md", Frontmatter::new())
    }

    #[tokio::test]
    async fn defaults_are_identity() {
        let hooks = HookSet::default();
        let note = note();
        let fm = Frontmatter::new();

        assert!(hooks.installed().is_empty());
        assert_eq!(hooks.frontmatter(fm.clone(), &note).unwrap(), fm);
        assert_eq!(hooks.header_content(&fm, &note).unwrap(), "");
        assert_eq!(hooks.footer_content(&fm, &note).unwrap(), "");
        assert_eq!(hooks.preprocess_content("x".into(), &note, &fm).unwrap(), "x");
        assert_eq!(hooks.postprocess_content("y".into(), &note, &fm).unwrap(), "y");
        assert_eq!(hooks.output_path(&note, &fm, "text").unwrap(), "folder/Page.md");

        let outcome = hooks
            .process_codeblock(&CodeBlock::new("rust", "fn main() {}"))
            .await
            .unwrap();
        assert_eq!(outcome, CodeblockOutcome::Unchanged);
    }

    #[tokio::test]
    async fn builders_install_hooks() {
        let hooks = HookSet::new()
            .with_header_content(|_, note| Ok(format!("# {}\n", note.name)))
            .with_process_codeblock(|block| Ok(CodeblockOutcome::Text(block.value.to_uppercase())))
            .with_output_path(|note, _, _| Ok(format!("{}.mdx", note.slug)));

        let note = note();
        let fm = Frontmatter::new();
        assert_eq!(
            hooks.installed(),
            &["header_content", "process_codeblock", "output_path"]
        );
        assert_eq!(hooks.header_content(&fm, &note).unwrap(), "# Page\n");
        assert_eq!(hooks.output_path(&note, &fm, "").unwrap(), "page.mdx");

        let outcome = hooks
            .process_codeblock(&CodeBlock::new("txt", "shout"))
            .await
            .unwrap();
        assert_eq!(outcome, CodeblockOutcome::Text("SHOUT".into()));
    }

    #[test]
    fn hook_errors_propagate() {
        let hooks = HookSet::new()
            .with_preprocess_content(|_, _, _| Err(VaultpressError::hook("preprocess_content", "boom")));
        let err = hooks
            .preprocess_content(String::new(), &note(), &Frontmatter::new())
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
