//! Code block dispatch: visit every code node, let a visitor keep or
//! replace it, possibly asynchronously.
//!
//! All targets are gathered before any visitor runs. Every replacement is
//! then launched at once and awaited together, and only after all of them
//! resolved are they spliced in, each at its own node's position. Sibling
//! order therefore never depends on completion order, and a spliced subtree
//! is never visited by the pass that produced it.

use futures::future::{LocalBoxFuture, try_join_all};
use tracing::debug;

use vaultpress_shared::Result;

use crate::tree::{CodeBlock, Node, splice};

/// What to do with one visited code node.
pub enum Splice<'a> {
    /// Leave the node where it is.
    Keep,
    /// Replace the node with these, in order. Empty removes it.
    Nodes(Vec<Node<'a>>),
}

/// Visit every code block under `root` and apply the visitor's decisions.
///
/// Returns how many nodes were replaced. If any visitor fails, nothing is
/// spliced and the first error is returned.
pub async fn dispatch_codeblocks<'a, F>(root: Node<'a>, mut visit: F) -> Result<usize>
where
    F: FnMut(CodeBlock) -> LocalBoxFuture<'a, Result<Splice<'a>>>,
{
    let targets: Vec<(Node<'a>, CodeBlock)> = root
        .descendants()
        .filter_map(|node| CodeBlock::from_node(node).map(|block| (node, block)))
        .collect();

    if targets.is_empty() {
        return Ok(0);
    }
    debug!(count = targets.len(), "dispatching code blocks");

    let pending = targets.into_iter().map(|(node, block)| {
        let replacement = visit(block);
        async move { replacement.await.map(|splice| (node, splice)) }
    });
    let resolved = try_join_all(pending).await?;

    let mut replaced = 0;
    for (node, decision) in resolved {
        if let Splice::Nodes(nodes) = decision {
            splice(node, &nodes);
            replaced += 1;
        }
    }
    Ok(replaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{comrak_options, serialize};
    use crate::tree::text_paragraph;
    use comrak::{Arena, parse_document};
    use futures::FutureExt;
    use std::time::Duration;
    use vaultpress_shared::{PipelineConfig, VaultpressError};

    const THREE_BLOCKS: &str = "```a\n1\n```\n\n```b\n2\n```\n\n```c\n3\n```\n";

    #[tokio::test]
    async fn order_survives_out_of_order_completion() {
        let config = PipelineConfig::default();
        let arena = Arena::new();
        let root = parse_document(&arena, THREE_BLOCKS, &comrak_options(&config));
        let arena_ref = &arena;

        // The first block finishes last.
        let replaced = dispatch_codeblocks(root, |block| {
            let delay = match block.language.as_str() {
                "a" => 30,
                "b" => 15,
                _ => 0,
            };
            async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(Splice::Nodes(vec![text_paragraph(
                    arena_ref,
                    format!("{}{}", block.language, block.value),
                )]))
            }
            .boxed_local()
        })
        .await
        .unwrap();

        assert_eq!(replaced, 3);
        assert_eq!(serialize(root, &config).unwrap(), "a1\n\nb2\n\nc3\n");
    }

    #[tokio::test]
    async fn keep_leaves_node_and_empty_removes() {
        let config = PipelineConfig::default();
        let arena = Arena::new();
        let root = parse_document(&arena, THREE_BLOCKS, &comrak_options(&config));

        let replaced = dispatch_codeblocks(root, |block| {
            let decision = if block.language == "b" {
                Splice::Nodes(Vec::new())
            } else {
                Splice::Keep
            };
            futures::future::ready(Ok(decision)).boxed_local()
        })
        .await
        .unwrap();

        assert_eq!(replaced, 1);
        let out = serialize(root, &config).unwrap();
        assert!(out.contains("```a\n1\n```"));
        assert!(!out.contains("```b"));
        assert!(out.contains("```c\n3\n```"));
    }

    #[tokio::test]
    async fn spliced_code_is_not_revisited() {
        let config = PipelineConfig::default();
        let arena = Arena::new();
        let root = parse_document(&arena, "```a\n1\n```\n", &comrak_options(&config));
        let arena_ref = &arena;

        let mut visits = 0;
        dispatch_codeblocks(root, |block| {
            visits += 1;
            let replacement = crate::tree::Fragment::Code(CodeBlock::new("a", block.value))
                .into_node(arena_ref);
            futures::future::ready(Ok(Splice::Nodes(vec![replacement]))).boxed_local()
        })
        .await
        .unwrap();

        assert_eq!(visits, 1);
    }

    #[tokio::test]
    async fn failure_leaves_tree_untouched() {
        let config = PipelineConfig::default();
        let arena = Arena::new();
        let root = parse_document(&arena, THREE_BLOCKS, &comrak_options(&config));
        let before = serialize(root, &config).unwrap();

        let err = dispatch_codeblocks(root, |block| {
            let result = if block.language == "c" {
                Err(VaultpressError::query_engine("engine offline"))
            } else {
                Ok(Splice::Nodes(Vec::new()))
            };
            futures::future::ready(result).boxed_local()
        })
        .await
        .unwrap_err();

        assert!(err.to_string().contains("engine offline"));
        assert_eq!(serialize(root, &config).unwrap(), before);
    }

    #[tokio::test]
    async fn no_code_blocks() {
        let arena = Arena::new();
        let root = parse_document(&arena, "just text", &comrak_options(&PipelineConfig::default()));
        let replaced = dispatch_codeblocks(root, |_| unreachable!()).await.unwrap();
        assert_eq!(replaced, 0);
    }
}
