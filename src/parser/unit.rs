use super::common::{ImportDirective, LineIndex, ParseResult};
use super::kotlin;
use crate::symbol::{FileId, Language, NodeKey, Origin};
use std::path::PathBuf;
use tree_sitter::{Node, Tree};

/// A parsed source file together with everything needed to resolve names in it
#[derive(Debug)]
pub struct SourceUnit {
    pub id: FileId,
    pub path: PathBuf,
    pub text: String,
    pub tree: Tree,
    pub language: Language,
    pub package: Option<String>,
    pub imports: Vec<ImportDirective>,

    /// Provenance of everything declared in this file
    pub origin: Origin,

    /// Binary/stub representation of a library (navigate to sources when possible)
    pub compiled: bool,

    /// Absent for detached documents
    line_index: Option<LineIndex>,
}

impl SourceUnit {
    pub fn new(
        id: FileId,
        path: PathBuf,
        text: String,
        parsed: ParseResult,
        language: Language,
        origin: Origin,
    ) -> Self {
        let line_index = Some(LineIndex::new(&text));
        Self {
            id,
            path,
            text,
            tree: parsed.tree,
            language,
            package: parsed.package,
            imports: parsed.imports,
            origin,
            compiled: false,
            line_index,
        }
    }

    /// Mark this unit as a compiled library stub
    pub fn with_compiled(mut self, compiled: bool) -> Self {
        self.compiled = compiled;
        self
    }

    /// Drop the backing document: caret positions become unavailable
    pub fn detached(mut self) -> Self {
        self.line_index = None;
        self
    }

    pub fn is_detached(&self) -> bool {
        self.line_index.is_none()
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text_of(&self, node: Node) -> &str {
        &self.text[node.start_byte()..node.end_byte()]
    }

    /// 1-based line/column for an offset, `None` for detached documents
    pub fn line_column(&self, offset: usize) -> Option<(usize, usize)> {
        self.line_index
            .as_ref()
            .and_then(|index| index.line_column(&self.text, offset))
    }

    /// Byte offset of a 1-based line/column pair
    pub fn offset_of(&self, line: usize, column: usize) -> Option<usize> {
        match &self.line_index {
            Some(index) => index.offset_of(&self.text, line, column),
            None => LineIndex::new(&self.text).offset_of(&self.text, line, column),
        }
    }

    /// Key of a declaration node, spanning its accessors when it has any
    pub fn key_of(&self, node: Node) -> NodeKey {
        let (start, end) = declaration_span(self.language, node);
        NodeKey::new(self.id, start, end)
    }

    /// Locate the declaration node a key was taken from
    pub fn node_for(&self, key: &NodeKey) -> Option<Node<'_>> {
        if key.file != self.id || key.end > self.text.len() {
            return None;
        }
        let mut current = self.root().descendant_for_byte_range(key.start, key.start);
        while let Some(node) = current {
            if node.start_byte() < key.start {
                break;
            }
            if declaration_span(self.language, node) == (key.start, key.end) {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

/// Byte span of a declaration: Kotlin property accessors are sometimes parsed as
/// siblings of their `property_declaration`, so the span is stretched over them
pub fn declaration_span(language: Language, node: Node) -> (usize, usize) {
    match language {
        Language::Kotlin if node.kind() == "property_declaration" => {
            (node.start_byte(), kotlin::property_end_byte(node))
        }
        _ => (node.start_byte(), node.end_byte()),
    }
}
