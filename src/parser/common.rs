use super::SourceUnit;
use crate::symbol::{Language, Symbol};
use miette::Result;
use std::path::Path;
use tree_sitter::{Node, Tree};

/// Result of parsing a source file
#[derive(Debug)]
pub struct ParseResult {
    /// Concrete syntax tree
    pub tree: Tree,

    /// Package/namespace of the file
    pub package: Option<String>,

    /// Import directives, in source order
    pub imports: Vec<ImportDirective>,
}

/// One `import` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
    /// Imported path without the trailing `.*`
    pub path: String,

    /// `import a.B as C` alias
    pub alias: Option<String>,

    /// `import a.b.*`
    pub is_star: bool,
}

impl ImportDirective {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
            is_star: false,
        }
    }

    /// Name this import introduces into scope, if it is not a star import
    pub fn visible_name(&self) -> Option<&str> {
        if self.is_star {
            return None;
        }
        match &self.alias {
            Some(alias) => Some(alias.as_str()),
            None => self.path.rsplit('.').next(),
        }
    }
}

impl std::fmt::Display for ImportDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)?;
        if self.is_star {
            f.write_str(".*")?;
        }
        if let Some(alias) = &self.alias {
            write!(f, " as {}", alias)?;
        }
        Ok(())
    }
}

/// Trait for language-specific parsers
pub trait Parser {
    fn language(&self) -> Language;

    /// Parse a source file into a tree plus its package and imports
    fn parse(&self, path: &Path, contents: &str) -> Result<ParseResult>;

    /// Extract every non-local declaration of an already parsed unit
    fn extract_symbols(&self, unit: &SourceUnit) -> Vec<Symbol>;
}

/// Maps byte offsets to 1-based line/column pairs
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// 1-based (line, column); the column counts characters, not bytes
    pub fn line_column(&self, text: &str, offset: usize) -> Option<(usize, usize)> {
        if offset > self.len || !text.is_char_boundary(offset) {
            return None;
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = text[line_start..offset].chars().count();
        Some((line + 1, column + 1))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of a 1-based (line, column) pair
    pub fn offset_of(&self, text: &str, line: usize, column: usize) -> Option<usize> {
        if line == 0 || column == 0 {
            return None;
        }
        let start = *self.line_starts.get(line - 1)?;
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        let line_text = &text[start..end];
        if column - 1 == line_text.chars().count() {
            return Some(end);
        }
        line_text
            .char_indices()
            .nth(column - 1)
            .map(|(byte, _)| start + byte)
    }
}

/// Extract text from a node
pub fn node_text<'a>(node: Node<'a>, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// First direct child of a specific kind
pub fn child_of_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

/// Find all children of a specific kind
pub fn children_of_kind<'a>(node: Node<'a>, kind: &str) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.kind() == kind)
        .collect()
}

/// All children, named and anonymous
pub fn children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

pub fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Nearest ancestor whose kind is in `kinds`
pub fn ancestor_of_kind<'a>(node: Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
    let mut current = node.parent();
    while let Some(parent) = current {
        if kinds.contains(&parent.kind()) {
            return Some(parent);
        }
        current = parent.parent();
    }
    None
}

/// Strip nullability, generic arguments and projection keywords from a type
/// as written: `out List<Foo>?` -> `List`
pub fn simple_type_name(type_text: &str) -> &str {
    let text = type_text
        .trim()
        .trim_start_matches("in ")
        .trim_start_matches("out ")
        .trim();
    let text = text.split('<').next().unwrap_or(text);
    text.trim_end_matches('?').trim_end_matches('!').trim()
}
