//! Symbol context extraction: the declaration under the caret, every symbol it
//! uses, and how it uses them.

mod aggregate;
mod collector;
mod payload;
mod slice;
mod usage;

pub use aggregate::UsageAggregator;
pub use collector::UsageCollector;
pub use payload::{
    build_payload, extract_symbol_context, find_declaration_at_caret, PipelineOptions,
    ReferencedSymbol, SymbolContextPayload, TargetInfo,
};
pub use slice::{relative_qualified_name, Caret, DeclarationSlice, SliceBuilder};
pub use usage::{classify_access, classify_call, ResolvedUsage, UsageKind, UsageSite};

use crate::symbol::{FileId, NodeKey};
use std::path::PathBuf;
use thiserror::Error;

/// Reasons a pipeline run ends without a payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Symbol context extraction was cancelled")]
    Cancelled,

    #[error("No declaration at the caret")]
    NoDeclarationAtCaret,

    #[error("Not a Kotlin file: {0}")]
    UnsupportedLanguage(PathBuf),

    #[error("File is not part of the indexed project: {0}")]
    FileNotIndexed(PathBuf),

    #[error("Caret offset {offset} is past the end of the file ({length} characters)")]
    CaretOutOfRange { offset: usize, length: usize },
}

/// Failure to snapshot one declaration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SliceError {
    #[error("File {0} is not in the index")]
    MissingFile(FileId),

    #[error("No declaration node at {0}")]
    MissingDeclaration(NodeKey),
}
