use super::SliceError;
use crate::parser::{self, declaration_span, SourceUnit};
use crate::symbol::{Origin, Symbol, SymbolIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;
use tree_sitter::Node;

/// Position of a declaration's first character.
///
/// `offset` counts characters from the start of the file. `line` and `column`
/// are 1-based, or `-1` when the file has no backing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caret {
    pub offset: i64,
    pub line: i64,
    pub column: i64,
}

impl Caret {
    pub fn is_available(&self) -> bool {
        self.line >= 0 && self.column >= 0
    }
}

/// Immutable snapshot of one declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationSlice {
    /// Exact source span of the declaration
    pub source_text: String,
    pub file_path: String,
    pub caret: Caret,
    pub qualified_name: Option<String>,

    /// Qualified name without the file's package prefix
    pub relative_qualified_name: Option<String>,
    pub presentable_text: Option<String>,
    pub simple_name: Option<String>,

    /// Syntax node kind the slice was taken from
    pub declared_symbol_kind_tag: String,
    pub origin_kind: Origin,
}

/// Strip `package` from `qualified`; `None` unless the package is a proper
/// segment prefix
pub fn relative_qualified_name(qualified: &str, package: Option<&str>) -> Option<String> {
    match package.filter(|p| !p.is_empty()) {
        None => Some(qualified.to_string()),
        Some(package) => qualified
            .strip_prefix(package)?
            .strip_prefix('.')
            .filter(|rest| !rest.is_empty())
            .map(str::to_string),
    }
}

/// Builds slices, preferring source declarations over compiled stubs
pub struct SliceBuilder<'a> {
    index: &'a SymbolIndex,
}

impl<'a> SliceBuilder<'a> {
    pub fn new(index: &'a SymbolIndex) -> Self {
        Self { index }
    }

    /// Snapshot a declaration node. Naming fields are best effort; the text and
    /// path are always filled.
    pub fn build_slice(&self, unit: &SourceUnit, node: Node, origin: Origin) -> DeclarationSlice {
        if unit.compiled {
            if let Some((source_unit, source_node)) = self.source_equivalent(unit, node) {
                debug!(
                    "Using source of {} for compiled {}",
                    source_unit.display_path(),
                    unit.display_path()
                );
                return Self::snapshot(source_unit, source_node, origin);
            }
        }
        Self::snapshot(unit, node, origin)
    }

    /// Slice of the declaration a symbol resolves to
    pub fn slice_for_symbol(&self, symbol: &Symbol) -> Result<DeclarationSlice, SliceError> {
        let unit = self
            .index
            .unit(symbol.declaration.file)
            .ok_or(SliceError::MissingFile(symbol.declaration.file))?;
        let node = unit
            .node_for(&symbol.declaration)
            .ok_or(SliceError::MissingDeclaration(symbol.declaration))?;
        Ok(self.build_slice(unit, node, symbol.origin))
    }

    fn source_equivalent(&self, unit: &SourceUnit, node: Node) -> Option<(&'a SourceUnit, Node<'a>)> {
        let key = unit.key_of(node);
        let compiled = self.index.symbols_at(&key).into_iter().next()?;
        let source = self.index.find_source_equivalent(compiled)?;
        let source_unit = self.index.unit(source.declaration.file)?;
        let source_node = source_unit.node_for(&source.declaration)?;
        Some((source_unit.as_ref(), source_node))
    }

    fn snapshot(unit: &SourceUnit, node: Node, origin: Origin) -> DeclarationSlice {
        let (start, end) = declaration_span(unit.language, node);
        let source_text = unit.text.get(start..end).unwrap_or_else(|| unit.text_of(node));

        let offset = unit.text.get(..start).map(|prefix| prefix.chars().count() as i64).unwrap_or(-1);
        let (line, column) = unit
            .line_column(start)
            .map(|(line, column)| (line as i64, column as i64))
            .unwrap_or((-1, -1));

        let qualified_name = parser::qualified_name(unit, node);
        let relative_qualified_name = qualified_name
            .as_deref()
            .and_then(|name| relative_qualified_name(name, unit.package.as_deref()));

        DeclarationSlice {
            source_text: source_text.to_string(),
            file_path: unit.display_path(),
            caret: Caret { offset, line, column },
            qualified_name,
            relative_qualified_name,
            presentable_text: parser::presentable_text(unit, node),
            simple_name: parser::declaration_name(unit, node),
            declared_symbol_kind_tag: node.kind().to_string(),
            origin_kind: origin,
        }
    }
}
