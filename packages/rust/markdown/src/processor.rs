//! The content pipeline: parse → resolve cross-references → callouts →
//! expand code blocks → serialize.
//!
//! Per document: `preprocess_content` → pipeline → `postprocess_content`.
//! Query block results go through the same parse and transform stages in
//! the same arena (but not the pre/post hooks) before being spliced in.

use std::rc::Rc;

use comrak::nodes::AstNode;
use comrak::{Arena, ListStyleType, Options, format_commonmark, parse_document};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use tracing::{debug, instrument};

use vaultpress_shared::{
    BulletStyle, Catalog, Frontmatter, Note, PipelineConfig, Result, VaultpressError,
};

use crate::callout::rewrite_callouts;
use crate::cleanup;
use crate::codeblock::{Splice, dispatch_codeblocks};
use crate::hooks::{CodeblockOutcome, HookSet};
use crate::query::QueryEngine;
use crate::tree::{CodeBlock, Fragment, Node, text_paragraph};
use crate::wikilink::resolve_wikilinks;

/// Everything a single document render needs besides its text.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'c> {
    /// The note being rendered.
    pub note: &'c Note,
    /// Frontmatter after the `frontmatter` hook.
    pub frontmatter: &'c Frontmatter,
    /// Known cross-reference targets.
    pub catalog: &'c Catalog,
}

/// Runs the content pipeline. Holds no per-document state: the catalog is
/// passed to each call and shared read-only with every nested expansion.
pub struct ContentProcessor {
    engine: Rc<dyn QueryEngine>,
    hooks: Rc<HookSet>,
    config: PipelineConfig,
}

impl ContentProcessor {
    pub fn new(engine: Rc<dyn QueryEngine>, hooks: Rc<HookSet>, config: PipelineConfig) -> Self {
        Self {
            engine,
            hooks,
            config,
        }
    }

    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Full per-document contract: preprocess hook, pipeline, postprocess hook.
    #[instrument(skip_all, fields(note = %ctx.note.path))]
    pub async fn process_content(&self, content: &str, ctx: &RenderContext<'_>) -> Result<String> {
        let content = self
            .hooks
            .preprocess_content(content.to_string(), ctx.note, ctx.frontmatter)?;

        let processed = self.render(&content, ctx.catalog).await?;

        self.hooks
            .postprocess_content(processed, ctx.note, ctx.frontmatter)
    }

    /// Parse, transform and serialize `markdown` without the pre/post hooks.
    pub async fn render(&self, markdown: &str, catalog: &Catalog) -> Result<String> {
        let arena = Arena::new();
        let root = self.transform(&arena, markdown.to_string(), catalog, 0).await?;
        serialize(root, &self.config)
    }

    fn transform<'a>(
        &'a self,
        arena: &'a Arena<AstNode<'a>>,
        markdown: String,
        catalog: &'a Catalog,
        depth: usize,
    ) -> LocalBoxFuture<'a, Result<Node<'a>>> {
        async move {
            let root = parse_document(arena, &markdown, &comrak_options(&self.config));

            let links = resolve_wikilinks(arena, root, catalog);
            let callouts = if self.config.callouts {
                rewrite_callouts(arena, root)
            } else {
                0
            };
            let replaced = self.expand_codeblocks(arena, root, catalog, depth).await?;

            debug!(depth, links, callouts, replaced, "tree transformed");
            Ok(root)
        }
        .boxed_local()
    }

    async fn expand_codeblocks<'a>(
        &'a self,
        arena: &'a Arena<AstNode<'a>>,
        root: Node<'a>,
        catalog: &'a Catalog,
        depth: usize,
    ) -> Result<usize> {
        let query_language = self.config.query_language.as_str();
        dispatch_codeblocks(root, move |block| {
            if block.language == query_language {
                self.expand_query(arena, block, catalog, depth)
            } else {
                self.apply_codeblock_hook(arena, block)
            }
        })
        .await
    }

    fn expand_query<'a>(
        &'a self,
        arena: &'a Arena<AstNode<'a>>,
        block: CodeBlock,
        catalog: &'a Catalog,
        depth: usize,
    ) -> LocalBoxFuture<'a, Result<Splice<'a>>> {
        async move {
            let limit = self.config.max_query_depth;
            if depth >= limit {
                return Err(VaultpressError::QueryDepth { limit });
            }

            let markdown = self.engine.try_query_markdown(&block.value).await?;
            let sub_root = self.transform(arena, markdown, catalog, depth + 1).await?;
            Ok(Splice::Nodes(sub_root.children().collect()))
        }
        .boxed_local()
    }

    fn apply_codeblock_hook<'a>(
        &'a self,
        arena: &'a Arena<AstNode<'a>>,
        block: CodeBlock,
    ) -> LocalBoxFuture<'a, Result<Splice<'a>>> {
        let pending = self.hooks.process_codeblock(&block);
        async move {
            let decision = match pending.await? {
                CodeblockOutcome::Unchanged => Splice::Keep,
                CodeblockOutcome::Replace(Fragment::Code(code)) if code == block => Splice::Keep,
                CodeblockOutcome::Replace(fragment) => Splice::Nodes(vec![fragment.into_node(arena)]),
                CodeblockOutcome::Text(text) => Splice::Nodes(vec![text_paragraph(arena, text)]),
            };
            Ok(decision)
        }
        .boxed_local()
    }
}

/// Parser and formatter settings shared by every stage.
pub fn comrak_options(config: &PipelineConfig) -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.wikilinks_title_after_pipe = true;
    options.extension.math_dollars = true;
    options.render.list_style = match config.bullet {
        BulletStyle::Star => ListStyleType::Star,
        BulletStyle::Dash => ListStyleType::Dash,
    };
    options
}

/// Serialize a tree back to markdown and run the cleanup passes.
pub fn serialize(root: Node<'_>, config: &PipelineConfig) -> Result<String> {
    let mut output = Vec::new();
    format_commonmark(root, &comrak_options(config), &mut output)
        .map_err(|e| VaultpressError::Render(format!("commonmark formatting failed: {e}")))?;

    let markdown = String::from_utf8(output)
        .map_err(|e| VaultpressError::Render(format!("UTF-8 conversion failed: {e}")))?;

    Ok(cleanup::run_pipeline(&markdown))
}
