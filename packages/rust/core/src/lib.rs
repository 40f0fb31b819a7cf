//! Export orchestration for vaultpress.
//!
//! This crate ties together the vault, the content pipeline and the output
//! directory into an end-to-end export run.

pub mod assembler;
pub mod engine;
pub mod export;
pub mod writer;

pub use assembler::{AssembledDocument, assemble};
pub use engine::{CommandQueryEngine, engine_from_config};
pub use export::{
    ExportReport, Exporter, FailurePolicy, ProgressReporter, SilentProgress, SkippedDocument,
    WrittenDocument,
};
pub use writer::{FsWriter, OutputWriter};
