//! symbolscope - Semantic context of a Kotlin declaration
//!
//! Given a caret inside a Kotlin file, this library finds the enclosing
//! declaration and reports every symbol it uses, how it uses it, and the
//! source slice of each used declaration.
//!
//! # Architecture
//!
//! The pipeline consists of:
//! 1. **File Discovery** - Find all .kt and .java files of a project
//! 2. **Indexing** - Parse files with tree-sitter and index their declarations
//! 3. **Collection** - Walk the target declaration and resolve each reference
//! 4. **Aggregation** - Group usages by declaration and drop nested entries
//! 5. **Reporting** - Render the payload as text or JSON and append it to a log

pub mod analysis;
pub mod config;
pub mod context;
pub mod discovery;
pub mod parser;
pub mod report;
pub mod symbol;

pub use analysis::{CancellationToken, IndexState, Project};
pub use config::Config;
pub use context::{
    extract_symbol_context, DeclarationSlice, PipelineError, PipelineOptions, ReferencedSymbol,
    SymbolContextPayload, UsageKind,
};
pub use discovery::FileFinder;
pub use report::{LogWriter, ReportFormat, Reporter};
pub use symbol::{IndexBuilder, Origin, SymbolIndex};
