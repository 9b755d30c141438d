use super::aggregate::UsageAggregator;
use super::collector::UsageCollector;
use super::slice::{DeclarationSlice, SliceBuilder};
use super::usage::UsageKind;
use super::PipelineError;
use crate::analysis::{open_session, CancellationToken, Project};
use crate::config::Config;
use crate::parser::kotlin::is_caret_declaration;
use crate::parser::{language_for_path, SourceUnit};
use crate::symbol::{Language, SymbolIndex};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};
use tree_sitter::Node;

/// The analyzed declaration and its file header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetInfo {
    /// `package a.b`, if the file declares one
    pub package_directive: Option<String>,

    /// One `import ...` line per directive
    pub imports: Vec<String>,
    pub slice: DeclarationSlice,
}

/// A declaration the target uses, and every way it uses it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferencedSymbol {
    pub slice: DeclarationSlice,
    pub usage_kinds: Vec<UsageKind>,
}

/// Report unit of one extraction run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolContextPayload {
    pub target: Option<TargetInfo>,
    pub referenced_symbols: Vec<ReferencedSymbol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl SymbolContextPayload {
    /// Payload of a run that could not start
    pub fn with_warning(warning: impl Into<String>) -> Self {
        Self {
            target: None,
            referenced_symbols: Vec::new(),
            warning: Some(warning.into()),
        }
    }
}

/// Knobs of one extraction run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub max_usages: usize,
    pub include_local_reads: bool,
    pub project_only: bool,
    pub cancel_check_interval: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_usages: 1000,
            include_local_reads: false,
            project_only: false,
            cancel_check_interval: 64,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_usages: config.collector.max_usages,
            include_local_reads: config.collector.include_local_reads,
            project_only: config.aggregation.project_only,
            cancel_check_interval: config.collector.cancel_check_interval,
        }
    }
}

/// Innermost declaration containing byte `offset`
pub fn find_declaration_at_caret(unit: &SourceUnit, offset: usize) -> Option<Node<'_>> {
    if offset > unit.text.len() {
        return None;
    }
    let mut current = unit.root().descendant_for_byte_range(offset, offset);
    while let Some(node) = current {
        if is_caret_declaration(node, &unit.text) {
            return Some(node);
        }
        current = node.parent();
    }
    None
}

/// Byte position of the `chars`-th character, or the end of the text
fn byte_offset(text: &str, chars: usize) -> Option<usize> {
    text.char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .nth(chars)
}

/// Run the collect/aggregate pipeline over one declaration
pub fn build_payload(
    index: &SymbolIndex,
    unit: &SourceUnit,
    node: Node,
    options: &PipelineOptions,
    cancel: &CancellationToken,
) -> Result<SymbolContextPayload, PipelineError> {
    let key = unit.key_of(node);
    let origin = index
        .symbols_at(&key)
        .first()
        .map(|symbol| symbol.origin)
        .unwrap_or(unit.origin);
    let slice = SliceBuilder::new(index).build_slice(unit, node, origin);

    let usages = open_session(index, unit, |session| {
        UsageCollector::new(session, options.max_usages)
            .include_local_reads(options.include_local_reads)
            .with_cancellation(cancel.clone(), options.cancel_check_interval)
            .collect(node)
    })?;
    debug!("{} usages in {}", usages.len(), slice.simple_name.as_deref().unwrap_or("<anonymous>"));

    let referenced_symbols = UsageAggregator::new(index)
        .project_only(options.project_only)
        .excluding(key)
        .aggregate(&usages);

    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }

    Ok(SymbolContextPayload {
        target: Some(TargetInfo {
            package_directive: unit.package.as_ref().map(|p| format!("package {}", p)),
            imports: unit.imports.iter().map(|i| format!("import {}", i)).collect(),
            slice,
        }),
        referenced_symbols,
        warning: None,
    })
}

/// Extract the symbol context of the declaration at character `offset` in
/// `path`. The whole run holds the project's read lock.
pub fn extract_symbol_context(
    project: &Project,
    path: &Path,
    offset: usize,
    options: &PipelineOptions,
    cancel: &CancellationToken,
) -> Result<SymbolContextPayload, PipelineError> {
    if language_for_path(path) != Some(Language::Kotlin) {
        return Err(PipelineError::UnsupportedLanguage(path.to_path_buf()));
    }
    if !project.is_index_ready() {
        info!("Index not ready, skipping symbol context extraction");
        return Ok(SymbolContextPayload::with_warning(
            "Project index is not ready; no symbols were analyzed",
        ));
    }

    let index = project.read();
    let unit = index
        .unit_for_path(path)
        .ok_or_else(|| PipelineError::FileNotIndexed(path.to_path_buf()))?;
    let byte = byte_offset(&unit.text, offset).ok_or_else(|| PipelineError::CaretOutOfRange {
        offset,
        length: unit.text.chars().count(),
    })?;
    let node = find_declaration_at_caret(unit, byte).ok_or(PipelineError::NoDeclarationAtCaret)?;

    build_payload(&index, unit, node, options, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_offset_counts_characters() {
        assert_eq!(byte_offset("aé b", 0), Some(0));
        assert_eq!(byte_offset("aé b", 2), Some(3));
        assert_eq!(byte_offset("aé b", 4), Some(5));
        assert_eq!(byte_offset("aé b", 5), None);
    }

    #[test]
    fn test_warning_payload_is_empty() {
        let payload = SymbolContextPayload::with_warning("not ready");
        assert!(payload.target.is_none());
        assert!(payload.referenced_symbols.is_empty());
        assert_eq!(payload.warning.as_deref(), Some("not ready"));
    }
}
