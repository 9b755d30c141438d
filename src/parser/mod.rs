mod common;
pub mod java;
pub mod kotlin;
mod unit;

pub use common::{
    ancestor_of_kind, child_of_kind, children, children_of_kind, named_children, node_text,
    simple_type_name, ImportDirective, LineIndex, ParseResult, Parser,
};
pub use java::JavaParser;
pub use kotlin::KotlinParser;
pub use unit::{declaration_span, SourceUnit};

use crate::symbol::Language;
use std::path::Path;
use tree_sitter::Node;

/// Language of a source path, by extension
pub fn language_for_path(path: &Path) -> Option<Language> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("kt") | Some("kts") => Some(Language::Kotlin),
        Some("java") => Some(Language::Java),
        _ => None,
    }
}

/// Parser for a language
pub fn parser_for(language: Language) -> Box<dyn Parser + Send + Sync> {
    match language {
        Language::Kotlin => Box::new(KotlinParser::new()),
        Language::Java => Box::new(JavaParser::new()),
    }
}

/// The identifier a declaration node introduces
pub fn declaration_name(unit: &SourceUnit, node: Node) -> Option<String> {
    match unit.language {
        Language::Kotlin => kotlin::declaration_name(node, &unit.text),
        Language::Java => java::declaration_name(node, &unit.text),
    }
}

/// Fully qualified name of a declaration node
pub fn qualified_name(unit: &SourceUnit, node: Node) -> Option<String> {
    match unit.language {
        Language::Kotlin => kotlin::qualified_name(unit.package.as_deref(), node, &unit.text),
        Language::Java => java::qualified_name(unit.package.as_deref(), node, &unit.text),
    }
}

/// Short display label for a declaration node
pub fn presentable_text(unit: &SourceUnit, node: Node) -> Option<String> {
    match unit.language {
        Language::Kotlin => kotlin::presentable_text(node, &unit.text),
        Language::Java => java::presentable_text(node, &unit.text),
    }
}
