//! Per-document assembly.
//!
//! ```text
//! ---
//! <frontmatter hook(raw frontmatter) as YAML>
//! ---
//! <header_content>
//! <processed body>
//! <footer_content>
//! ```
//!
//! The output path comes from the `output_path` hook, which sees the final
//! text, and defaults to the note's own vault path.

use tracing::{debug, instrument};

use vaultpress_markdown::{ContentProcessor, RenderContext};
use vaultpress_shared::{Catalog, Note, Result, render_frontmatter};

/// A fully rendered document and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    /// Output path relative to the export root.
    pub path: String,
    /// Complete file contents.
    pub text: String,
}

/// Assemble `note` from its body text.
#[instrument(skip_all, fields(note = %note.path))]
pub async fn assemble(
    processor: &ContentProcessor,
    note: &Note,
    body: &str,
    catalog: &Catalog,
) -> Result<AssembledDocument> {
    let hooks = processor.hooks();

    let frontmatter = hooks.frontmatter(note.frontmatter.clone(), note)?;
    let mut text = render_frontmatter(&frontmatter)?;

    text.push_str(&hooks.header_content(&frontmatter, note)?);

    let ctx = RenderContext {
        note,
        frontmatter: &frontmatter,
        catalog,
    };
    text.push_str(&processor.process_content(body, &ctx).await?);

    text.push_str(&hooks.footer_content(&frontmatter, note)?);

    let path = hooks.output_path(note, &frontmatter, &text)?;
    debug!(output = %path, bytes = text.len(), "document assembled");

    Ok(AssembledDocument { path, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use vaultpress_markdown::{HookSet, UnavailableQueryEngine};
    use vaultpress_shared::{CatalogEntry, Frontmatter, PipelineConfig, VaultpressError};

    fn processor(hooks: HookSet) -> ContentProcessor {
        ContentProcessor::new(
            Rc::new(UnavailableQueryEngine),
            Rc::new(hooks),
            PipelineConfig::default(),
        )
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![CatalogEntry {
            name: "Other".into(),
            slug: "other".into(),
        }])
    }

    #[tokio::test]
    async fn default_assembly() {
        let note = Note::new("Page", "notes/Page.md", Frontmatter::new());
        let doc = assemble(&processor(HookSet::default()), &note, "See [[Other]]", &catalog())
            .await
            .unwrap();

        assert_eq!(doc.path, "notes/Page.md");
        assert_eq!(doc.text, "---\n---\nSee [Other](/other)\n");
    }

    #[tokio::test]
    async fn hooks_shape_the_document() {
        let hooks = HookSet::new()
            .with_frontmatter(|mut fm, note| {
                fm.insert("title".into(), note.name.clone().into());
                Ok(fm)
            })
            .with_header_content(|fm, _| {
                Ok(format!("# {}\n\n", fm.get("title").and_then(|v| v.as_str()).unwrap_or("")))
            })
            .with_footer_content(|_, _| Ok("\n-- end --\n".into()))
            .with_output_path(|note, _, text| Ok(format!("{}-{}.mdx", note.slug, text.len())));

        let note = Note::new("Page", "Page.md", Frontmatter::new());
        let doc = assemble(&processor(hooks), &note, "Body", &catalog())
            .await
            .unwrap();

        let expected = "---\ntitle: Page\n---\n# Page\n\nBody\n\n-- end --\n";
        assert_eq!(doc.text, expected);
        assert_eq!(doc.path, format!("page-{}.mdx", expected.len()));
    }

    #[tokio::test]
    async fn frontmatter_is_not_mutated_in_place() {
        let raw: Frontmatter = serde_yaml::from_str("draft: true").unwrap();
        let note = Note::new("Page", "Page.md", raw.clone());
        let hooks = HookSet::new().with_frontmatter(|mut fm, _| {
            fm.remove("draft");
            Ok(fm)
        });

        let doc = assemble(&processor(hooks), &note, "", &catalog()).await.unwrap();
        assert_eq!(doc.text, "---\n---\n");
        assert_eq!(note.frontmatter, raw);
    }

    #[tokio::test]
    async fn hook_failure_fails_document() {
        let hooks = HookSet::new()
            .with_output_path(|_, _, _| Err(VaultpressError::hook("output_path", "no path")));
        let note = Note::new("Page", "Page.md", Frontmatter::new());
        let err = assemble(&processor(hooks), &note, "Body", &catalog())
            .await
            .unwrap_err();
        assert!(matches!(err, VaultpressError::Hook { .. }));
    }
}
