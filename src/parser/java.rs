use super::common::{child_of_kind, children, children_of_kind, node_text, ImportDirective, ParseResult, Parser};
use super::SourceUnit;
use crate::symbol::{Language, Origin, Symbol, SymbolKind, SymbolPointer};
use miette::{IntoDiagnostic, Result};
use std::path::Path;
use tree_sitter::{Node, Parser as TsParser};
use tracing::debug;

/// Java classifier node kinds
const CLASS_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

/// Java source code parser using tree-sitter.
///
/// Java files only feed the symbol index; usages are never collected from them.
pub struct JavaParser;

impl JavaParser {
    pub fn new() -> Self {
        Self
    }

    fn extract_package(&self, root: Node, source: &str) -> Option<String> {
        let declaration = child_of_kind(root, "package_declaration")?;
        children(declaration)
            .into_iter()
            .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
            .map(|c| node_text(c, source).to_string())
    }

    fn extract_imports(&self, root: Node, source: &str) -> Vec<ImportDirective> {
        let mut imports = Vec::new();

        for declaration in children_of_kind(root, "import_declaration") {
            let Some(path) = children(declaration)
                .into_iter()
                .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
            else {
                continue;
            };
            let mut import = ImportDirective::new(node_text(path, source));
            import.is_star = child_of_kind(declaration, "asterisk").is_some();
            imports.push(import);
        }

        imports
    }
}

impl Default for JavaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for JavaParser {
    fn language(&self) -> Language {
        Language::Java
    }

    fn parse(&self, path: &Path, contents: &str) -> Result<ParseResult> {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_java::language())
            .into_diagnostic()?;
        let tree = parser
            .parse(contents, None)
            .ok_or_else(|| miette::miette!("Failed to parse Java file {}", path.display()))?;

        let root = tree.root_node();
        let package = self.extract_package(root, contents);
        let imports = self.extract_imports(root, contents);

        Ok(ParseResult {
            tree,
            package,
            imports,
        })
    }

    fn extract_symbols(&self, unit: &SourceUnit) -> Vec<Symbol> {
        let mut symbols = Vec::new();
        let mut cursor = unit.root().walk();
        for child in unit.root().children(&mut cursor) {
            if CLASS_KINDS.contains(&child.kind()) {
                extract_class(unit, child, None, &mut symbols);
            }
        }
        debug!("Indexed {}: {} symbols", unit.path.display(), symbols.len());
        symbols
    }
}

fn new_symbol(unit: &SourceUnit, node: Node, kind: SymbolKind, name: String) -> Symbol {
    let pointer = SymbolPointer::new(unit.id, node.start_byte(), node.end_byte(), kind);
    let mut symbol = Symbol::new(pointer, name, unit.origin, Language::Java, unit.path.clone());
    symbol.modifiers = modifiers_of(node, &unit.text);
    symbol.fully_qualified_name = qualified_name(unit.package.as_deref(), node, &unit.text);
    symbol
}

fn extract_class(unit: &SourceUnit, node: Node, parent: Option<SymbolPointer>, symbols: &mut Vec<Symbol>) {
    let source = unit.text.as_str();
    let Some(name) = declaration_name(node, source) else {
        return;
    };
    let kind = match node.kind() {
        "interface_declaration" => SymbolKind::Interface,
        "enum_declaration" => SymbolKind::EnumClass,
        "annotation_type_declaration" => SymbolKind::AnnotationClass,
        _ => SymbolKind::Class,
    };

    let mut class = new_symbol(unit, node, kind, name.clone());
    class.parent = parent;
    class.super_types = super_types(node, source);
    let class_pointer = class.pointer;

    let body = node.child_by_field_name("body");
    let members = body.map(member_nodes).unwrap_or_default();

    let has_constructor = members
        .iter()
        .any(|m| matches!(m.kind(), "constructor_declaration" | "compact_constructor_declaration"));
    if matches!(kind, SymbolKind::Class | SymbolKind::EnumClass) && !has_constructor {
        let pointer = SymbolPointer::new(unit.id, node.start_byte(), node.end_byte(), SymbolKind::Constructor);
        let mut constructor = Symbol::new(pointer, "<init>".to_string(), Origin::Synthetic, Language::Java, unit.path.clone());
        constructor.declaration = class.declaration;
        constructor.parent = Some(class_pointer);
        constructor.fully_qualified_name = class.fully_qualified_name.clone();
        constructor.parameter_count = Some(
            node.child_by_field_name("parameters")
                .map(|p| named_parameter_count(p))
                .unwrap_or(0),
        );
        constructor.type_text = Some(name.clone());
        symbols.push(constructor);
    }

    symbols.push(class);

    if let Some(body) = body {
        for constant in children_of_kind(body, "enum_constant") {
            if let Some(constant_name) = declaration_name(constant, source) {
                let mut entry = new_symbol(unit, constant, SymbolKind::EnumEntry, constant_name);
                entry.parent = Some(class_pointer);
                entry.type_text = Some(name.clone());
                symbols.push(entry);
            }
        }
    }

    for member in members {
        match member.kind() {
            kind if CLASS_KINDS.contains(&kind) => extract_class(unit, member, Some(class_pointer), symbols),
            "method_declaration" => {
                let Some(method_name) = declaration_name(member, source) else {
                    continue;
                };
                let mut method = new_symbol(unit, member, SymbolKind::Function, method_name);
                method.parent = Some(class_pointer);
                method.parameter_count = member.child_by_field_name("parameters").map(named_parameter_count);
                method.type_text = member.child_by_field_name("type").map(|t| node_text(t, source).to_string());
                symbols.push(method);
            }
            "constructor_declaration" | "compact_constructor_declaration" => {
                let mut constructor = new_symbol(unit, member, SymbolKind::Constructor, "<init>".to_string());
                constructor.parent = Some(class_pointer);
                constructor.parameter_count = member.child_by_field_name("parameters").map(named_parameter_count);
                constructor.type_text = Some(name.clone());
                symbols.push(constructor);
            }
            "field_declaration" | "constant_declaration" => {
                let field_type = member.child_by_field_name("type").map(|t| node_text(t, source).to_string());
                let is_final = modifiers_of(member, source).iter().any(|m| m == "final")
                    || kind == SymbolKind::Interface;
                // one declaration node may declare several fields
                for (slot, declarator) in children_of_kind(member, "variable_declarator").into_iter().enumerate() {
                    let Some(field_name) = declarator
                        .child_by_field_name("name")
                        .map(|n| node_text(n, source).to_string())
                    else {
                        continue;
                    };
                    let mut field = new_symbol(unit, member, SymbolKind::Property, field_name.clone());
                    field.pointer = field.pointer.with_slot(slot as u32);
                    field.parent = Some(class_pointer);
                    field.type_text = field_type.clone();
                    field.is_mutable = !is_final;
                    field.fully_qualified_name = field
                        .fully_qualified_name
                        .as_ref()
                        .and_then(|fqn| fqn.rsplit_once('.').map(|(owner, _)| owner.to_string()))
                        .map(|owner| format!("{}.{}", owner, field_name));
                    field.name = field_name;
                    symbols.push(field);
                }
            }
            _ => {}
        }
    }
}

fn member_nodes(body: Node) -> Vec<Node> {
    let mut members = Vec::new();
    for child in children(body) {
        if child.kind() == "enum_body_declarations" {
            members.extend(children(child));
        } else {
            members.push(child);
        }
    }
    members
}

fn named_parameter_count(parameters: Node) -> usize {
    children(parameters)
        .into_iter()
        .filter(|p| matches!(p.kind(), "formal_parameter" | "spread_parameter"))
        .count()
}

fn modifiers_of(node: Node, source: &str) -> Vec<String> {
    let Some(modifiers) = child_of_kind(node, "modifiers") else {
        return Vec::new();
    };
    children(modifiers)
        .into_iter()
        .filter(|m| !matches!(m.kind(), "annotation" | "marker_annotation"))
        .map(|m| node_text(m, source).to_string())
        .collect()
}

fn super_types(node: Node, source: &str) -> Vec<String> {
    let mut types = Vec::new();
    for field in ["superclass", "interfaces"] {
        let Some(clause) = node.child_by_field_name(field) else {
            continue;
        };
        collect_type_names(clause, source, &mut types);
    }
    // interfaces extending interfaces
    if let Some(extends) = child_of_kind(node, "extends_interfaces") {
        collect_type_names(extends, source, &mut types);
    }
    types
}

fn collect_type_names(node: Node, source: &str, out: &mut Vec<String>) {
    for child in children(node) {
        match child.kind() {
            "type_identifier" | "scoped_type_identifier" | "generic_type" => {
                out.push(node_text(child, source).to_string())
            }
            "type_list" => collect_type_names(child, source, out),
            _ => {}
        }
    }
}

/// The identifier a Java declaration introduces
pub fn declaration_name(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "field_declaration" | "constant_declaration" => child_of_kind(node, "variable_declarator")
            .and_then(|d| d.child_by_field_name("name"))
            .map(|n| node_text(n, source).to_string()),
        _ => node
            .child_by_field_name("name")
            .map(|n| node_text(n, source).to_string()),
    }
}

/// Fully qualified name of a Java declaration node
pub fn qualified_name(package: Option<&str>, node: Node, source: &str) -> Option<String> {
    let mut names = Vec::new();
    let mut current = node.parent();
    while let Some(parent) = current {
        if CLASS_KINDS.contains(&parent.kind()) {
            names.push(declaration_name(parent, source)?);
        } else if matches!(
            parent.kind(),
            "method_declaration" | "constructor_declaration" | "block" | "lambda_expression" | "object_creation_expression"
        ) {
            return None;
        }
        current = parent.parent();
    }
    names.reverse();

    let mut parts: Vec<String> = package
        .filter(|p| !p.is_empty())
        .map(|p| vec![p.to_string()])
        .unwrap_or_default();
    parts.extend(names);
    if !matches!(node.kind(), "constructor_declaration" | "compact_constructor_declaration") {
        parts.push(declaration_name(node, source)?);
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("."))
}

/// Short label for a Java declaration
pub fn presentable_text(node: Node, source: &str) -> Option<String> {
    let name = declaration_name(node, source)?;
    match node.kind() {
        "method_declaration" | "constructor_declaration" => {
            let params = node
                .child_by_field_name("parameters")
                .map(|p| {
                    children(p)
                        .into_iter()
                        .filter_map(|param| param.child_by_field_name("type"))
                        .map(|t| node_text(t, source).to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            Some(format!("{}({})", name, params))
        }
        _ => Some(name),
    }
}
