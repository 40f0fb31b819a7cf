//! Export run: every selected note → assemble → write.
//!
//! Notes are processed one at a time in catalog order. A note whose source
//! has disappeared is skipped. Any other failure aborts the run, unless the
//! run is configured to continue past failing documents. Configuration and
//! validation errors always abort.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};

use vaultpress_markdown::ContentProcessor;
use vaultpress_shared::{Catalog, Note, Result};
use vaultpress_vault::NoteSource;

use crate::assembler::assemble;
use crate::writer::OutputWriter;

/// What to do when a document fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failing document.
    #[default]
    Abort,
    /// Record the failure and move on.
    Continue,
}

/// A document that was written.
#[derive(Debug, Clone)]
pub struct WrittenDocument {
    pub note: String,
    pub output: PathBuf,
}

/// A document that produced no output, and why.
#[derive(Debug, Clone)]
pub struct SkippedDocument {
    pub note: String,
    pub reason: String,
}

/// Outcome of an export run.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<WrittenDocument>,
    /// Notes whose source was missing.
    pub skipped: Vec<SkippedDocument>,
    /// Notes that failed under [`FailurePolicy::Continue`].
    pub failed: Vec<SkippedDocument>,
    pub elapsed: Duration,
}

/// Progress callback for reporting export status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each document, whatever its outcome.
    fn document_done(&self, path: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &ExportReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_done(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &ExportReport) {}
}

/// Everything a run reads from and writes to.
pub struct Exporter<'r> {
    pub processor: &'r ContentProcessor,
    pub source: &'r dyn NoteSource,
    pub writer: &'r dyn OutputWriter,
    pub policy: FailurePolicy,
}

impl Exporter<'_> {
    /// Export `notes`, resolving cross-references against `catalog`.
    #[instrument(skip_all, fields(notes = notes.len(), policy = ?self.policy))]
    pub async fn run(
        &self,
        notes: &[Note],
        catalog: &Catalog,
        progress: &dyn ProgressReporter,
    ) -> Result<ExportReport> {
        let start = Instant::now();
        let mut report = ExportReport::default();
        let total = notes.len();

        info!(total, catalog = catalog.len(), "starting export");
        progress.phase("Exporting notes");

        for (i, note) in notes.iter().enumerate() {
            match self.export_one(note, catalog).await {
                Ok(output) => report.written.push(WrittenDocument {
                    note: note.path.clone(),
                    output,
                }),
                Err(e) if e.is_skippable() => {
                    warn!(note = %note.path, error = %e, "source missing, skipping note");
                    report.skipped.push(SkippedDocument {
                        note: note.path.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) if e.is_fatal() || self.policy == FailurePolicy::Abort => {
                    error!(note = %note.path, error = %e, "export aborted");
                    return Err(e);
                }
                Err(e) => {
                    warn!(note = %note.path, error = %e, "document failed, continuing");
                    report.failed.push(SkippedDocument {
                        note: note.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            progress.document_done(&note.path, i + 1, total);
        }

        report.elapsed = start.elapsed();
        progress.done(&report);

        info!(
            written = report.written.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            elapsed_ms = report.elapsed.as_millis(),
            "export complete"
        );

        Ok(report)
    }

    async fn export_one(&self, note: &Note, catalog: &Catalog) -> Result<PathBuf> {
        let body = self.source.read_body(note)?;
        let document = assemble(self.processor, note, &body, catalog).await?;
        self.writer.write(&document.path, &document.text)
    }
}
