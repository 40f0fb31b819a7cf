//! The external query engine that renders embedded query blocks.

use async_trait::async_trait;

use vaultpress_shared::{Result, VaultpressError};

/// Evaluates the content of a query block and returns rendered markdown.
///
/// The query language is opaque to the pipeline. Failures surface as
/// [`VaultpressError::QueryEngine`] and abort the current document.
#[async_trait(?Send)]
pub trait QueryEngine {
    async fn try_query_markdown(&self, query: &str) -> Result<String>;
}

/// Engine used when none is configured: every query fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableQueryEngine;

#[async_trait(?Send)]
impl QueryEngine for UnavailableQueryEngine {
    async fn try_query_markdown(&self, query: &str) -> Result<String> {
        let first_line = query.lines().next().unwrap_or_default();
        Err(VaultpressError::query_engine(format!(
            "no query engine configured (query starting with `{first_line}`)"
        )))
    }
}
