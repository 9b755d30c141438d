use super::common::{
    child_of_kind, children, children_of_kind, node_text, ImportDirective, ParseResult, Parser,
};
use super::unit::declaration_span;
use super::SourceUnit;
use crate::symbol::{Language, Origin, Symbol, SymbolKind, SymbolPointer};
use miette::{IntoDiagnostic, Result};
use std::path::Path;
use tree_sitter::{Node, Parser as TsParser};
use tracing::debug;

/// Node kinds that introduce a named declaration a caret can target
pub const DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "object_declaration",
    "companion_object",
    "function_declaration",
    "property_declaration",
    "secondary_constructor",
    "primary_constructor",
    "class_parameter",
    "type_alias",
    "enum_entry",
];

/// Node kinds that open a local scope: nothing declared below them has a
/// qualified name
const LOCAL_SCOPE_KINDS: &[&str] = &[
    "function_declaration",
    "function_body",
    "lambda_literal",
    "anonymous_function",
    "object_literal",
    "secondary_constructor",
    "anonymous_initializer",
    "getter",
    "setter",
    "statements",
];

/// Kotlin source code parser using tree-sitter
pub struct KotlinParser;

impl KotlinParser {
    pub fn new() -> Self {
        Self
    }

    fn ts_parser() -> Result<TsParser> {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_kotlin::language())
            .into_diagnostic()?;
        Ok(parser)
    }

    fn extract_package(&self, root: Node, source: &str) -> Option<String> {
        let header = child_of_kind(root, "package_header")?;
        let identifier = child_of_kind(header, "identifier")?;
        Some(node_text(identifier, source).to_string())
    }

    fn extract_imports(&self, root: Node, source: &str) -> Vec<ImportDirective> {
        let mut imports = Vec::new();

        let headers = children_of_kind(root, "import_list")
            .into_iter()
            .flat_map(|list| children_of_kind(list, "import_header"))
            // some grammar versions hang headers off the root directly
            .chain(children_of_kind(root, "import_header"));

        for header in headers {
            // tree-sitter-kotlin doesn't use field names for import identifiers
            let Some(identifier) = child_of_kind(header, "identifier") else {
                continue;
            };
            let mut import = ImportDirective::new(node_text(identifier, source));

            let header_text = node_text(header, source);
            if child_of_kind(header, "wildcard_import").is_some()
                || header_text.trim_end().ends_with(".*")
            {
                import.is_star = true;
            }
            if let Some(alias) = child_of_kind(header, "import_alias") {
                import.alias = children(alias)
                    .into_iter()
                    .find(|c| matches!(c.kind(), "type_identifier" | "simple_identifier"))
                    .map(|c| node_text(c, source).to_string());
            }

            imports.push(import);
        }

        imports
    }
}

impl Default for KotlinParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for KotlinParser {
    fn language(&self) -> Language {
        Language::Kotlin
    }

    fn parse(&self, path: &Path, contents: &str) -> Result<ParseResult> {
        let mut parser = Self::ts_parser()?;
        let tree = parser
            .parse(contents, None)
            .ok_or_else(|| miette::miette!("Failed to parse Kotlin file {}", path.display()))?;

        let root = tree.root_node();
        let package = self.extract_package(root, contents);
        let imports = self.extract_imports(root, contents);

        if root.has_error() {
            debug!("{} parsed with syntax errors", path.display());
        }

        Ok(ParseResult {
            tree,
            package,
            imports,
        })
    }

    fn extract_symbols(&self, unit: &SourceUnit) -> Vec<Symbol> {
        let mut extractor = SymbolExtractor {
            unit,
            symbols: Vec::new(),
        };
        extractor.extract_top_level(unit.root());

        debug!(
            "Indexed {}: {} symbols",
            unit.path.display(),
            extractor.symbols.len()
        );
        extractor.symbols
    }
}

/// Walks the declaration skeleton of one file; function bodies are never entered
struct SymbolExtractor<'u> {
    unit: &'u SourceUnit,
    symbols: Vec<Symbol>,
}

impl<'u> SymbolExtractor<'u> {
    fn text(&self) -> &'u str {
        &self.unit.text
    }

    fn extract_top_level(&mut self, node: Node<'u>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "class_declaration" | "object_declaration" => self.extract_class(child, None),
                "function_declaration" => self.extract_function(child, None),
                "property_declaration" => self.extract_property(child, None),
                "type_alias" => self.extract_type_alias(child),
                "package_header" | "import_list" | "import_header" => {}
                _ => self.extract_top_level(child),
            }
        }
    }

    fn new_symbol(&self, node: Node, kind: SymbolKind, name: String) -> Symbol {
        let (start, end) = declaration_span(Language::Kotlin, node);
        let pointer = SymbolPointer::new(self.unit.id, start, end, kind);
        let mut symbol = Symbol::new(
            pointer,
            name,
            self.unit.origin,
            Language::Kotlin,
            self.unit.path.clone(),
        );
        symbol.modifiers = modifiers_of(node, self.text());
        symbol.fully_qualified_name = qualified_name(self.unit.package.as_deref(), node, self.text());
        symbol
    }

    /// Synthetic member declared by its class node
    fn synthetic_member(&self, class: &Symbol, name: &str, slot: u32) -> Symbol {
        let pointer = SymbolPointer::new(
            class.pointer.file,
            class.pointer.start,
            class.pointer.end,
            SymbolKind::Function,
        )
        .with_slot(slot);
        let mut symbol = Symbol::new(
            pointer,
            name.to_string(),
            Origin::Synthetic,
            Language::Kotlin,
            self.unit.path.clone(),
        );
        symbol.declaration = class.declaration;
        symbol.parent = Some(class.pointer);
        symbol.fully_qualified_name = class
            .fully_qualified_name
            .as_ref()
            .map(|fqn| format!("{}.{}", fqn, name));
        symbol
    }

    fn extract_class(&mut self, node: Node<'u>, parent: Option<SymbolPointer>) {
        let source = self.text();
        let Some(name) = declaration_name(node, source) else {
            return;
        };
        let kind = class_kind(node, source);

        let mut class = self.new_symbol(node, kind, name.clone());
        class.parent = parent;
        class.super_types = super_types(node, source);
        if node.kind() == "companion_object" {
            class.modifiers.push("companion".to_string());
        }

        let class_pointer = class.pointer;
        let class_fqn = class.fully_qualified_name.clone();
        let is_data = class.has_modifier("data");

        // Constructor parameters declared with val/var are properties
        let class_parameters = class_parameters_of(node);
        let mut bound_parameters = Vec::new();
        for parameter in &class_parameters {
            let Some(binding) = binding_of(*parameter, source) else {
                continue;
            };
            let Some(param_name) = declaration_name(*parameter, source) else {
                continue;
            };
            let mut property = self.new_symbol(*parameter, SymbolKind::Property, param_name);
            property.parent = Some(class_pointer);
            property.is_mutable = binding == "var";
            property.declared_in_constructor = true;
            property.type_text = type_child(*parameter).map(|t| node_text(t, source).to_string());
            bound_parameters.push(property.clone());
            self.symbols.push(property);
        }

        let body = class_body_of(node);
        let secondary_constructors = body
            .map(|b| children_of_kind(b, "secondary_constructor"))
            .unwrap_or_default();

        if matches!(
            kind,
            SymbolKind::Class | SymbolKind::EnumClass | SymbolKind::AnnotationClass
        ) {
            let primary = child_of_kind(node, "primary_constructor");
            if primary.is_some() || secondary_constructors.is_empty() {
                // Primary and implicit constructors are declared by the class itself
                let span_node = primary.unwrap_or(node);
                let (start, end) = declaration_span(Language::Kotlin, span_node);
                let pointer =
                    SymbolPointer::new(self.unit.id, start, end, SymbolKind::Constructor);
                let origin = if primary.is_some() {
                    self.unit.origin
                } else {
                    Origin::Synthetic
                };
                let mut constructor = Symbol::new(
                    pointer,
                    "<init>".to_string(),
                    origin,
                    Language::Kotlin,
                    self.unit.path.clone(),
                );
                constructor.declaration = class.declaration;
                constructor.parent = Some(class_pointer);
                constructor.fully_qualified_name = class_fqn.clone();
                constructor.parameter_count = Some(class_parameters.len());
                constructor.type_text = Some(name.clone());
                if let Some(primary) = primary {
                    constructor.modifiers = modifiers_of(primary, source);
                }
                self.symbols.push(constructor);
            }
        }

        if is_data {
            for (idx, property) in bound_parameters.iter().enumerate() {
                let mut component =
                    self.synthetic_member(&class, &format!("component{}", idx + 1), idx as u32 + 1);
                component.modifiers.push("operator".to_string());
                component.parameter_count = Some(0);
                component.type_text = property.type_text.clone();
                self.symbols.push(component);
            }
            let mut copy =
                self.synthetic_member(&class, "copy", bound_parameters.len() as u32 + 1);
            copy.parameter_count = Some(bound_parameters.len());
            copy.type_text = Some(name.clone());
            self.symbols.push(copy);
        }

        if kind == SymbolKind::EnumClass {
            let mut values = self.synthetic_member(&class, "values", 1);
            values.parameter_count = Some(0);
            values.type_text = Some(format!("Array<{}>", name));
            self.symbols.push(values);

            let mut value_of = self.synthetic_member(&class, "valueOf", 2);
            value_of.parameter_count = Some(1);
            value_of.type_text = Some(name.clone());
            self.symbols.push(value_of);
        }

        self.symbols.push(class);

        match body {
            Some(body) => self.extract_members(body, class_pointer, &name),
            None => {
                // WORKAROUND: with `class Foo : Bar by delegate { ... }` tree-sitter-kotlin
                // parses the class body as a trailing lambda of the delegate expression
                for specifier in delegation_specifiers_of(node) {
                    self.extract_misplaced_members(specifier, class_pointer, &name);
                }
            }
        }
    }

    fn extract_misplaced_members(&mut self, node: Node<'u>, class: SymbolPointer, class_name: &str) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "lambda_literal" => {
                    if let Some(statements) = child_of_kind(child, "statements") {
                        self.extract_members(statements, class, class_name);
                    }
                }
                "call_expression" | "call_suffix" | "annotated_lambda" | "explicit_delegation" => {
                    self.extract_misplaced_members(child, class, class_name);
                }
                _ => {}
            }
        }
    }

    fn extract_members(&mut self, body: Node<'u>, class: SymbolPointer, class_name: &str) {
        let source = self.text();
        let mut cursor = body.walk();

        for child in body.children(&mut cursor) {
            match child.kind() {
                "class_declaration" | "object_declaration" | "companion_object" => {
                    self.extract_class(child, Some(class));
                }
                "function_declaration" => self.extract_function(child, Some(class)),
                "property_declaration" => self.extract_property(child, Some(class)),
                "secondary_constructor" => {
                    let mut constructor =
                        self.new_symbol(child, SymbolKind::Constructor, "<init>".to_string());
                    constructor.parent = Some(class);
                    constructor.parameter_count = child_of_kind(child, "function_value_parameters")
                        .map(|params| children_of_kind(params, "parameter").len());
                    constructor.type_text = Some(class_name.to_string());
                    self.symbols.push(constructor);
                }
                "enum_entry" => {
                    if let Some(name) = declaration_name(child, source) {
                        let mut entry = self.new_symbol(child, SymbolKind::EnumEntry, name);
                        entry.parent = Some(class);
                        entry.type_text = Some(class_name.to_string());
                        self.symbols.push(entry);
                    }
                }
                _ => {}
            }
        }
    }

    fn extract_function(&mut self, node: Node<'u>, parent: Option<SymbolPointer>) {
        let source = self.text();
        let Some(name) = declaration_name(node, source) else {
            return;
        };

        let mut function = self.new_symbol(node, SymbolKind::Function, name);
        function.parent = parent;
        function.parameter_count = child_of_kind(node, "function_value_parameters")
            .map(|params| children_of_kind(params, "parameter").len());
        function.receiver_type = receiver_type_of(node, source);
        function.type_text = return_type_of(node, source);

        self.symbols.push(function);
    }

    fn extract_property(&mut self, node: Node<'u>, parent: Option<SymbolPointer>) {
        let source = self.text();
        // Destructuring is only legal locally
        let Some(variable) = child_of_kind(node, "variable_declaration") else {
            return;
        };
        let Some(name) = declaration_name(node, source) else {
            return;
        };

        let mut property = self.new_symbol(node, SymbolKind::Property, name);
        property.parent = parent;
        property.is_mutable = binding_of(node, source) == Some("var");
        property.type_text = type_child(variable).map(|t| node_text(t, source).to_string());
        property.receiver_type = receiver_type_of(node, source);
        if child_of_kind(node, "property_delegate").is_some() {
            property.modifiers.push("delegated".to_string());
        }

        self.symbols.push(property);
    }

    fn extract_type_alias(&mut self, node: Node<'u>) {
        let source = self.text();
        let Some(name) = declaration_name(node, source) else {
            return;
        };
        let mut alias = self.new_symbol(node, SymbolKind::TypeAlias, name);
        // the aliased type is the last type node
        alias.type_text = children(node)
            .into_iter()
            .filter(|c| is_type_node(c.kind()))
            .last()
            .map(|t| node_text(t, source).to_string());
        self.symbols.push(alias);
    }
}

/// Type-shaped node kinds in tree-sitter-kotlin
pub fn is_type_node(kind: &str) -> bool {
    matches!(
        kind,
        "user_type"
            | "nullable_type"
            | "function_type"
            | "parenthesized_type"
            | "non_nullable_type"
            | "type_reference"
            | "dynamic"
    )
}

/// First type child of a declaration (`x: Foo`)
pub fn type_child(node: Node) -> Option<Node> {
    children(node).into_iter().find(|c| is_type_node(c.kind()))
}

/// `val` / `var` of a property or constructor parameter
pub fn binding_of<'a>(node: Node<'a>, source: &'a str) -> Option<&'a str> {
    for child in children(node) {
        match child.kind() {
            "binding_pattern_kind" => return Some(node_text(child, source).trim()),
            "val" | "var" => return Some(child.kind()),
            _ => {}
        }
    }
    None
}

/// Modifier keywords, annotations excluded
pub fn modifiers_of(node: Node, source: &str) -> Vec<String> {
    let Some(modifiers) = child_of_kind(node, "modifiers") else {
        return Vec::new();
    };
    children(modifiers)
        .into_iter()
        .filter(|m| m.kind() != "annotation")
        .map(|m| node_text(m, source).trim().to_string())
        .filter(|text| !text.is_empty() && !text.starts_with('@'))
        .collect()
}

fn class_kind(node: Node, source: &str) -> SymbolKind {
    if matches!(node.kind(), "object_declaration" | "companion_object") {
        return SymbolKind::Object;
    }
    if child_of_kind(node, "interface").is_some() {
        return SymbolKind::Interface;
    }
    let modifiers = modifiers_of(node, source);
    if modifiers.iter().any(|m| m == "enum") {
        SymbolKind::EnumClass
    } else if modifiers.iter().any(|m| m == "annotation") {
        SymbolKind::AnnotationClass
    } else {
        SymbolKind::Class
    }
}

/// Body of a class-like declaration
pub fn class_body_of(node: Node) -> Option<Node> {
    child_of_kind(node, "class_body").or_else(|| child_of_kind(node, "enum_class_body"))
}

/// `delegation_specifier` nodes of a class header, with or without the
/// `delegation_specifiers` wrapper
pub fn delegation_specifiers_of(node: Node) -> Vec<Node> {
    let mut specifiers = children_of_kind(node, "delegation_specifier");
    for wrapper in children_of_kind(node, "delegation_specifiers") {
        specifiers.extend(children_of_kind(wrapper, "delegation_specifier"));
    }
    specifiers
}

/// Constructor parameters of a class header. Depending on the grammar
/// version they sit in a `class_parameters` wrapper or directly under
/// `primary_constructor`.
pub fn class_parameters_of(node: Node) -> Vec<Node> {
    match child_of_kind(node, "primary_constructor") {
        Some(primary) => constructor_parameters(primary),
        None => child_of_kind(node, "class_parameters")
            .map(|wrapper| children_of_kind(wrapper, "class_parameter"))
            .unwrap_or_default(),
    }
}

/// `class_parameter` nodes of a primary constructor, with or without the
/// `class_parameters` wrapper
fn constructor_parameters(primary: Node) -> Vec<Node> {
    let mut parameters = children_of_kind(primary, "class_parameter");
    for wrapper in children_of_kind(primary, "class_parameters") {
        parameters.extend(children_of_kind(wrapper, "class_parameter"));
    }
    parameters
}

/// The supertype named by a delegation specifier
pub fn specifier_type(specifier: Node) -> Option<Node> {
    if let Some(user_type) = child_of_kind(specifier, "user_type") {
        return Some(user_type);
    }
    for wrapper in ["constructor_invocation", "explicit_delegation"] {
        if let Some(inner) = child_of_kind(specifier, wrapper) {
            if let Some(user_type) = child_of_kind(inner, "user_type") {
                return Some(user_type);
            }
        }
    }
    None
}

fn super_types(node: Node, source: &str) -> Vec<String> {
    delegation_specifiers_of(node)
        .into_iter()
        .filter_map(specifier_type)
        .map(|t| node_text(t, source).to_string())
        .collect()
}

/// Extension receiver: the type written between `fun`/`val` and the name
pub fn receiver_type_of(node: Node, source: &str) -> Option<String> {
    for child in children(node) {
        match child.kind() {
            kind if is_type_node(kind) => return Some(node_text(child, source).to_string()),
            "simple_identifier" | "variable_declaration" | "function_value_parameters" => break,
            _ => {}
        }
    }
    None
}

/// Declared return type of a function
pub fn return_type_of(node: Node, source: &str) -> Option<String> {
    let mut after_parameters = false;
    for child in children(node) {
        match child.kind() {
            "function_value_parameters" => after_parameters = true,
            kind if after_parameters && is_type_node(kind) => {
                return Some(node_text(child, source).to_string());
            }
            "function_body" => break,
            _ => {}
        }
    }
    None
}

/// Extract the function name, handling both regular and extension functions.
/// For extension functions the receiver is a type node, so the first
/// `simple_identifier` after `fun` is always the name.
fn function_name(node: Node, source: &str) -> Option<String> {
    let mut found_fun = false;
    for child in children(node) {
        match child.kind() {
            "fun" => found_fun = true,
            "simple_identifier" if found_fun => return Some(node_text(child, source).to_string()),
            _ => {}
        }
    }
    child_of_kind(node, "simple_identifier").map(|n| node_text(n, source).to_string())
}

/// The identifier a declaration introduces
pub fn declaration_name(node: Node, source: &str) -> Option<String> {
    let first_of = |kinds: &[&str]| {
        children(node)
            .into_iter()
            .find(|c| kinds.contains(&c.kind()))
            .map(|c| node_text(c, source).to_string())
    };

    match node.kind() {
        "class_declaration" | "object_declaration" | "type_alias" => {
            first_of(&["type_identifier", "simple_identifier"])
        }
        "companion_object" => {
            first_of(&["type_identifier", "simple_identifier"]).or_else(|| Some("Companion".to_string()))
        }
        "function_declaration" => function_name(node, source),
        "property_declaration" => child_of_kind(node, "variable_declaration")
            .and_then(|v| child_of_kind(v, "simple_identifier"))
            .map(|n| node_text(n, source).to_string()),
        "class_parameter" | "parameter" | "enum_entry" | "variable_declaration" => {
            first_of(&["simple_identifier"])
        }
        "secondary_constructor" | "primary_constructor" => {
            let class = super::common::ancestor_of_kind(node, &["class_declaration"])?;
            declaration_name(class, source)
        }
        _ => None,
    }
}

/// Names of the classifiers enclosing `node`, outermost first. `None` when the
/// node sits in a local scope.
fn container_path(node: Node, source: &str) -> Option<Vec<String>> {
    let mut names = Vec::new();
    let mut current = node.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "class_declaration" | "object_declaration" | "companion_object" => {
                names.push(declaration_name(parent, source)?);
            }
            kind if LOCAL_SCOPE_KINDS.contains(&kind) => return None,
            _ => {}
        }
        current = parent.parent();
    }
    names.reverse();
    Some(names)
}

/// Fully qualified name of a declaration node, if it has one
pub fn qualified_name(package: Option<&str>, node: Node, source: &str) -> Option<String> {
    if node.kind() == "class_parameter" && binding_of(node, source).is_none() {
        return None;
    }
    let mut parts: Vec<String> = Vec::new();
    if let Some(package) = package.filter(|p| !p.is_empty()) {
        parts.push(package.to_string());
    }
    parts.extend(container_path(node, source)?);
    if !matches!(node.kind(), "secondary_constructor" | "primary_constructor") {
        parts.push(declaration_name(node, source)?);
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("."))
}

fn parameter_types(parameters: Option<Node>, kind: &str, source: &str) -> String {
    parameters
        .map(|p| children_of_kind(p, kind))
        .unwrap_or_default()
        .into_iter()
        .map(|param| {
            type_child(param)
                .map(|t| node_text(t, source).to_string())
                .unwrap_or_else(|| "?".to_string())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Short label for a declaration; functions and constructors carry their signature
pub fn presentable_text(node: Node, source: &str) -> Option<String> {
    let name = declaration_name(node, source);
    match node.kind() {
        "function_declaration" => {
            let params = parameter_types(
                child_of_kind(node, "function_value_parameters"),
                "parameter",
                source,
            );
            let receiver = receiver_type_of(node, source)
                .map(|r| format!("{}.", r))
                .unwrap_or_default();
            Some(format!("{}{}({})", receiver, name?, params))
        }
        "secondary_constructor" => {
            let params = parameter_types(
                child_of_kind(node, "function_value_parameters"),
                "parameter",
                source,
            );
            Some(format!("constructor {}({})", name?, params))
        }
        "primary_constructor" => {
            let params = constructor_parameters(node)
                .into_iter()
                .map(|param| {
                    type_child(param)
                        .map(|t| node_text(t, source).to_string())
                        .unwrap_or_else(|| "?".to_string())
                })
                .collect::<Vec<_>>()
                .join(", ");
            Some(format!("constructor {}({})", name?, params))
        }
        "property_declaration" => {
            let declared = child_of_kind(node, "variable_declaration")
                .and_then(type_child)
                .map(|t| format!(": {}", node_text(t, source)))
                .unwrap_or_default();
            Some(format!("{}{}", name?, declared))
        }
        "class_parameter" | "parameter" => {
            let declared = type_child(node)
                .map(|t| format!(": {}", node_text(t, source)))
                .unwrap_or_default();
            Some(format!("{}{}", name?, declared))
        }
        "companion_object" => Some(format!("companion object {}", name?)),
        _ => name,
    }
}

/// Find the end byte of a property declaration, including any getter/setter siblings.
/// In Kotlin's tree-sitter grammar, getter/setter nodes can be siblings of
/// property_declaration rather than children.
pub fn property_end_byte(node: Node) -> usize {
    let mut end_byte = node.end_byte();

    let mut next = node.next_sibling();
    while let Some(sibling) = next {
        match sibling.kind() {
            "getter" | "setter" => {
                end_byte = sibling.end_byte();
                next = sibling.next_sibling();
            }
            _ => break,
        }
    }

    end_byte
}

/// Whether a node is a declaration a caret can target
pub fn is_caret_declaration(node: Node, source: &str) -> bool {
    match node.kind() {
        "class_parameter" => binding_of(node, source).is_some(),
        kind => DECLARATION_KINDS.contains(&kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::FileId;
    use std::path::PathBuf;

    fn unit(source: &str) -> SourceUnit {
        let parser = KotlinParser::new();
        let parsed = parser.parse(Path::new("test.kt"), source).unwrap();
        SourceUnit::new(
            FileId(0),
            PathBuf::from("test.kt"),
            source.to_string(),
            parsed,
            Language::Kotlin,
            Origin::Source,
        )
    }

    fn find<'a>(symbols: &'a [Symbol], name: &str) -> &'a Symbol {
        symbols
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("symbol {} not indexed", name))
    }

    #[test]
    fn test_parse_package_and_imports() {
        let parser = KotlinParser::new();
        let source = r#"
            package com.example

            import com.example.util.Foo
            import com.example.other.*

            class Test {}
        "#;

        let result = parser.parse(Path::new("test.kt"), source).unwrap();

        assert_eq!(result.package.as_deref(), Some("com.example"));
        assert_eq!(result.imports.len(), 2);
        assert_eq!(result.imports[0].path, "com.example.util.Foo");
        assert!(!result.imports[0].is_star);
        assert!(result.imports[1].is_star);
    }

    #[test]
    fn test_extract_class_members() {
        let source = r#"
package com.example

class Repo(val name: String, var count: Int, flag: Boolean) {
    fun load(id: Int): String = name
    val size: Int = 0
}
"#;
        let unit = unit(source);
        let symbols = KotlinParser::new().extract_symbols(&unit);

        let class = find(&symbols, "Repo");
        assert_eq!(class.kind, SymbolKind::Class);
        assert_eq!(class.fully_qualified_name.as_deref(), Some("com.example.Repo"));

        let load = find(&symbols, "load");
        assert_eq!(load.kind, SymbolKind::Function);
        assert_eq!(load.parent, Some(class.pointer));
        assert_eq!(load.parameter_count, Some(1));
        assert_eq!(load.fully_qualified_name.as_deref(), Some("com.example.Repo.load"));

        let count = find(&symbols, "count");
        assert!(count.is_mutable);
        assert_eq!(count.type_text.as_deref(), Some("Int"));
        assert!(!find(&symbols, "name").is_mutable);

        // plain constructor parameters are not members
        assert!(symbols.iter().all(|s| s.name != "flag"));

        let constructor = symbols
            .iter()
            .find(|s| s.kind == SymbolKind::Constructor)
            .unwrap();
        assert_eq!(constructor.declaration, class.declaration);
        assert_eq!(constructor.parameter_count, Some(3));
    }

    #[test]
    fn test_primary_constructor_parameters() {
        let unit = unit("class Repo(val name: String, var count: Int, flag: Boolean)\n");
        let class = children_of_kind(unit.root(), "class_declaration")[0];
        assert_eq!(class_parameters_of(class).len(), 3);

        let primary = child_of_kind(class, "primary_constructor").unwrap();
        assert_eq!(
            presentable_text(primary, &unit.text).as_deref(),
            Some("constructor Repo(String, Int, Boolean)")
        );
    }

    #[test]
    fn test_implicit_constructor_is_synthetic() {
        let unit = unit("class Plain\n");
        let symbols = KotlinParser::new().extract_symbols(&unit);

        let constructor = symbols
            .iter()
            .find(|s| s.kind == SymbolKind::Constructor)
            .unwrap();
        assert_eq!(constructor.origin, Origin::Synthetic);
        assert_eq!(constructor.parameter_count, Some(0));
    }

    #[test]
    fn test_data_class_synthetics() {
        let unit = unit("data class Point(val x: Int, val y: Int)\n");
        let symbols = KotlinParser::new().extract_symbols(&unit);

        let class = find(&symbols, "Point");
        let component2 = find(&symbols, "component2");
        assert_eq!(component2.origin, Origin::Synthetic);
        assert!(component2.is_operator());
        assert_eq!(component2.declaration, class.declaration);

        let copy = find(&symbols, "copy");
        assert_eq!(copy.parameter_count, Some(2));
        assert_ne!(copy.pointer, component2.pointer);
    }

    #[test]
    fn test_extension_function_receiver() {
        let unit = unit("fun String.shout(times: Int): String = this\n");
        let symbols = KotlinParser::new().extract_symbols(&unit);

        let shout = find(&symbols, "shout");
        assert_eq!(shout.receiver_type.as_deref(), Some("String"));
        assert_eq!(shout.type_text.as_deref(), Some("String"));
    }

    #[test]
    fn test_local_declarations_are_not_indexed() {
        let unit = unit("fun outer() {\n    val local = 1\n    fun inner() {}\n}\n");
        let symbols = KotlinParser::new().extract_symbols(&unit);

        assert!(symbols.iter().any(|s| s.name == "outer"));
        assert!(symbols.iter().all(|s| s.name != "local" && s.name != "inner"));
    }

    #[test]
    fn test_qualified_and_presentable_names() {
        let source = "package a.b\n\nobject Registry {\n    fun lookup(key: String, fallback: Int): Int = fallback\n}\n";
        let unit = unit(source);
        let symbols = KotlinParser::new().extract_symbols(&unit);

        let lookup = find(&symbols, "lookup");
        assert_eq!(lookup.fully_qualified_name.as_deref(), Some("a.b.Registry.lookup"));

        let node = unit.node_for(&lookup.declaration).unwrap();
        assert_eq!(
            presentable_text(node, &unit.text).as_deref(),
            Some("lookup(String, Int)")
        );
    }
}
