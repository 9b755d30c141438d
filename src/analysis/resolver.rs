//! Name and scope resolution over the project symbol index.
//!
//! Resolution is best effort: anything it cannot pin down is reported as
//! unresolved and the caller moves on.

use super::session::{AnalysisSession, CallInfo, SessionError};
use crate::parser::kotlin::{self, binding_of, receiver_type_of, return_type_of, type_child};
use crate::parser::{child_of_kind, children, children_of_kind, node_text, simple_type_name, SourceUnit};
use crate::symbol::{NodeKey, Origin, Symbol, SymbolIndex, SymbolKind, SymbolPointer};
use std::collections::HashSet;
use tracing::trace;
use tree_sitter::Node;

const MAX_DEPTH: usize = 16;

/// Binary operator expression kinds that dispatch to an operator function
pub const BINARY_OPERATOR_KINDS: &[&str] = &[
    "additive_expression",
    "multiplicative_expression",
    "comparison_expression",
    "range_expression",
    "check_expression",
    "infix_expression",
];

/// What a name is expected to denote at its use site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Want {
    Callable,
    Value,
    Type,
}

impl Want {
    fn accepts(&self, symbol: &Symbol) -> bool {
        match self {
            Want::Callable => {
                symbol.kind.is_callable() || symbol.kind.is_classifier() || symbol.kind.is_variable()
            }
            Want::Value => symbol.kind.is_variable() || symbol.kind.is_classifier(),
            Want::Type => symbol.kind.is_classifier(),
        }
    }
}

/// Best-effort static type of an expression
#[derive(Debug, Clone)]
struct InferredType {
    /// Simple name as written
    name: String,
    classifier: Option<Symbol>,
}

impl InferredType {
    fn of(classifier: Symbol) -> Self {
        Self {
            name: classifier.name.clone(),
            classifier: Some(classifier),
        }
    }
}

/// Operator convention for an operator token
pub fn operator_function(token: &str) -> Option<&'static str> {
    let name = match token {
        "+" => "plus",
        "-" => "minus",
        "*" => "times",
        "/" => "div",
        "%" => "rem",
        ".." => "rangeTo",
        "..<" => "rangeUntil",
        "in" | "!in" => "contains",
        "<" | ">" | "<=" | ">=" => "compareTo",
        "+=" => "plusAssign",
        "-=" => "minusAssign",
        "*=" => "timesAssign",
        "/=" => "divAssign",
        "%=" => "remAssign",
        _ => return None,
    };
    Some(name)
}

fn unary_operator_function(token: &str) -> Option<&'static str> {
    match token {
        "-" => Some("unaryMinus"),
        "+" => Some("unaryPlus"),
        "!" => Some("not"),
        "++" => Some("inc"),
        "--" => Some("dec"),
        _ => None,
    }
}

/// Resolves names in one file against the whole project index
pub struct ProjectSession<'a> {
    index: &'a SymbolIndex,
    unit: &'a SourceUnit,
}

/// Open a session scoped to `unit`; it is released when `body` returns
pub fn open_session<'a, T>(
    index: &'a SymbolIndex,
    unit: &'a SourceUnit,
    body: impl FnOnce(&dyn AnalysisSession) -> T,
) -> T {
    let session = ProjectSession::new(index, unit);
    body(&session)
}

impl<'a> ProjectSession<'a> {
    pub fn new(index: &'a SymbolIndex, unit: &'a SourceUnit) -> Self {
        Self { index, unit }
    }

    fn check_node(&self, node: Node) -> Result<(), SessionError> {
        if node.end_byte() > self.unit.text.len() {
            return Err(SessionError::ForeignNode {
                start: node.start_byte(),
                end: node.end_byte(),
            });
        }
        Ok(())
    }

    fn unit_of(&self, symbol: &Symbol) -> Option<&'a SourceUnit> {
        self.index.unit(symbol.pointer.file).map(|unit| unit.as_ref())
    }

    /// Declaration node of a symbol, falling back to its file root
    fn anchor_of(&self, symbol: &Symbol) -> Option<(&'a SourceUnit, Node<'a>)> {
        let unit = self.unit_of(symbol)?;
        let node = unit.node_for(&symbol.declaration).unwrap_or_else(|| unit.root());
        Some((unit, node))
    }

    // ---- scoped lookup ----

    fn lookup<'u>(&self, unit: &'u SourceUnit, name: &str, at: Node<'u>, want: Want, depth: usize) -> Vec<Symbol> {
        if depth > MAX_DEPTH || name.is_empty() {
            return Vec::new();
        }

        if want != Want::Type {
            let locals = self.local_declarations(unit, name, at);
            if !locals.is_empty() {
                return locals;
            }
        }

        for receiver in self.enclosing_receivers(unit, at, depth) {
            let members = self.members_named(&receiver, name, want, depth + 1);
            if !members.is_empty() {
                return members;
            }
        }

        let same_file: Vec<Symbol> = self
            .index
            .top_level_in_file(unit.id)
            .into_iter()
            .filter(|s| s.name == name && want.accepts(s))
            .cloned()
            .collect();
        if !same_file.is_empty() {
            return same_file;
        }

        for import in unit.imports.iter().filter(|i| !i.is_star) {
            if import.visible_name() == Some(name) {
                let imported = self.by_fqn(&import.path, want);
                if !imported.is_empty() {
                    return imported;
                }
            }
        }

        let same_package = match unit.package.as_deref() {
            Some(package) if !package.is_empty() => format!("{}.{}", package, name),
            _ => name.to_string(),
        };
        let in_package = self.by_fqn(&same_package, want);
        if !in_package.is_empty() {
            return in_package;
        }

        for import in unit.imports.iter().filter(|i| i.is_star) {
            let imported = self.by_fqn(&format!("{}.{}", import.path, name), want);
            if !imported.is_empty() {
                return imported;
            }
        }

        self.globally_unique(name, want)
    }

    fn by_fqn(&self, fqn: &str, want: Want) -> Vec<Symbol> {
        self.index
            .find_by_fqn(fqn)
            .into_iter()
            .filter(|s| want.accepts(s))
            .cloned()
            .collect()
    }

    /// A top-level name declared exactly once in the whole project
    fn globally_unique(&self, name: &str, want: Want) -> Vec<Symbol> {
        let candidates: Vec<&Symbol> = self
            .index
            .find_by_name(name)
            .into_iter()
            .filter(|s| s.parent.is_none() && want.accepts(s))
            .collect();
        let declarations: HashSet<NodeKey> = candidates.iter().map(|s| s.declaration).collect();
        if declarations.len() == 1 {
            candidates.into_iter().cloned().collect()
        } else {
            Vec::new()
        }
    }

    fn local_symbol(&self, unit: &SourceUnit, node: Node, kind: SymbolKind, name: &str) -> Symbol {
        let key = unit.key_of(node);
        let pointer = SymbolPointer::new(unit.id, key.start, key.end, kind);
        let mut symbol = Symbol::new(pointer, name.to_string(), unit.origin, unit.language, unit.path.clone());
        symbol.type_text = match node.kind() {
            "property_declaration" => child_of_kind(node, "variable_declaration")
                .and_then(type_child)
                .map(|t| node_text(t, &unit.text).to_string()),
            "function_declaration" => return_type_of(node, &unit.text),
            _ => type_child(node).map(|t| node_text(t, &unit.text).to_string()),
        };
        symbol.is_mutable = binding_of(node, &unit.text) == Some("var");
        if kind == SymbolKind::Function {
            symbol.receiver_type = receiver_type_of(node, &unit.text);
            symbol.parameter_count = child_of_kind(node, "function_value_parameters")
                .map(|p| children_of_kind(p, "parameter").len());
            symbol.modifiers = kotlin::modifiers_of(node, &unit.text);
        }
        symbol
    }

    fn name_of<'u>(&self, unit: &'u SourceUnit, node: Node<'u>) -> Option<&'u str> {
        child_of_kind(node, "simple_identifier").map(|n| node_text(n, &unit.text))
    }

    /// Parameters and locals visible at `at`, innermost scope first
    fn local_declarations<'u>(&self, unit: &'u SourceUnit, name: &str, at: Node<'u>) -> Vec<Symbol> {
        let mut found = Vec::new();
        let mut current = at;

        while let Some(parent) = current.parent() {
            match parent.kind() {
                "statements" => {
                    for sibling in children(parent) {
                        if sibling.start_byte() >= current.start_byte() {
                            break;
                        }
                        match sibling.kind() {
                            "property_declaration" => {
                                if let Some(variable) = child_of_kind(sibling, "variable_declaration") {
                                    if self.name_of(unit, variable) == Some(name) {
                                        found = vec![self.local_symbol(unit, sibling, SymbolKind::LocalVariable, name)];
                                    }
                                }
                                if let Some(multi) = child_of_kind(sibling, "multi_variable_declaration") {
                                    for component in children_of_kind(multi, "variable_declaration") {
                                        if self.name_of(unit, component) == Some(name) {
                                            found = vec![self.local_symbol(
                                                unit,
                                                component,
                                                SymbolKind::DestructuringComponent,
                                                name,
                                            )];
                                        }
                                    }
                                }
                            }
                            "function_declaration" => {
                                if kotlin::declaration_name(sibling, &unit.text).as_deref() == Some(name) {
                                    found.push(self.local_symbol(unit, sibling, SymbolKind::Function, name));
                                }
                            }
                            _ => {}
                        }
                    }
                }
                "lambda_literal" => {
                    match child_of_kind(parent, "lambda_parameters") {
                        Some(params) => {
                            for param in children(params) {
                                let variables = match param.kind() {
                                    "variable_declaration" => vec![param],
                                    "multi_variable_declaration" => children_of_kind(param, "variable_declaration"),
                                    _ => Vec::new(),
                                };
                                for variable in variables {
                                    if self.name_of(unit, variable) == Some(name) {
                                        found.push(self.local_symbol(unit, variable, SymbolKind::Parameter, name));
                                    }
                                }
                            }
                        }
                        None if name == "it" => {
                            found.push(self.local_symbol(unit, parent, SymbolKind::Parameter, name));
                        }
                        None => {}
                    }
                }
                "function_declaration" | "secondary_constructor" | "anonymous_function" => {
                    if let Some(params) = child_of_kind(parent, "function_value_parameters") {
                        for param in children_of_kind(params, "parameter") {
                            if self.name_of(unit, param) == Some(name) {
                                found.push(self.local_symbol(unit, param, SymbolKind::Parameter, name));
                            }
                        }
                    }
                }
                "for_statement" => {
                    for child in children(parent) {
                        let variables = match child.kind() {
                            "variable_declaration" => vec![child],
                            "multi_variable_declaration" => children_of_kind(child, "variable_declaration"),
                            _ => Vec::new(),
                        };
                        for variable in variables {
                            if self.name_of(unit, variable) == Some(name) {
                                found.push(self.local_symbol(unit, variable, SymbolKind::LocalVariable, name));
                            }
                        }
                    }
                }
                "catch_block" => {
                    if let Some(identifier) = child_of_kind(parent, "simple_identifier") {
                        if node_text(identifier, &unit.text) == name {
                            found.push(self.local_symbol(unit, identifier, SymbolKind::Parameter, name));
                        }
                    }
                }
                "setter" => {
                    if let Some(param) = child_of_kind(parent, "parameter_with_optional_type") {
                        if self.name_of(unit, param) == Some(name) {
                            found.push(self.local_symbol(unit, param, SymbolKind::Parameter, name));
                        }
                    }
                }
                "class_declaration" => {
                    // plain constructor parameters are visible to initializers
                    for param in kotlin::class_parameters_of(parent) {
                        if binding_of(param, &unit.text).is_none() && self.name_of(unit, param) == Some(name) {
                            found.push(self.local_symbol(unit, param, SymbolKind::Parameter, name));
                        }
                    }
                }
                _ => {}
            }

            if !found.is_empty() {
                return found;
            }
            current = parent;
        }

        found
    }

    /// Implicit receivers at `at`, innermost first
    fn enclosing_receivers<'u>(&self, unit: &'u SourceUnit, at: Node<'u>, depth: usize) -> Vec<Symbol> {
        let mut receivers = Vec::new();
        let mut current = at.parent();

        while let Some(node) = current {
            match node.kind() {
                "class_declaration" | "object_declaration" | "companion_object" | "interface_declaration"
                | "enum_declaration" => {
                    if let Some(classifier) = self.index.classifier_at(&unit.key_of(node)) {
                        receivers.push(classifier.clone());
                    }
                }
                "object_literal" => {
                    for specifier in kotlin::delegation_specifiers_of(node) {
                        if let Some(user_type) = kotlin::specifier_type(specifier) {
                            let text = node_text(user_type, &unit.text);
                            if let Some(classifier) = self.resolve_type_text(unit, node, text, true, depth + 1) {
                                receivers.push(classifier);
                            }
                        }
                    }
                }
                "function_declaration" | "property_declaration" => {
                    if let Some(receiver) = receiver_type_of(node, &unit.text) {
                        if let Some(classifier) = self.resolve_type_text(unit, node, &receiver, true, depth + 1) {
                            receivers.push(classifier);
                        }
                    }
                }
                _ => {}
            }
            current = node.parent();
        }

        receivers
    }

    /// Members named `name` of a classifier, its companion, and its supertypes.
    /// The most derived declaration wins.
    fn members_named(&self, classifier: &Symbol, name: &str, want: Want, depth: usize) -> Vec<Symbol> {
        let mut visited = HashSet::new();
        let mut level = vec![classifier.clone()];
        let mut depth = depth;

        while !level.is_empty() && depth <= MAX_DEPTH {
            let mut found = Vec::new();
            let mut next = Vec::new();

            for class in level {
                let class = match self.follow_alias(&class, depth) {
                    Some(class) => class,
                    None => continue,
                };
                if !visited.insert(class.pointer) {
                    continue;
                }

                for member in self.index.members_of(&class.pointer) {
                    if member.name == name && want.accepts(member) {
                        found.push(member.clone());
                    }
                    if member.kind == SymbolKind::Object && member.has_modifier("companion") {
                        found.extend(
                            self.index
                                .members_of(&member.pointer)
                                .into_iter()
                                .filter(|m| m.name == name && want.accepts(m))
                                .cloned(),
                        );
                    }
                }
                next.extend(self.supertypes_of(&class, depth + 1));
            }

            if !found.is_empty() {
                return found;
            }
            level = next;
            depth += 1;
        }

        Vec::new()
    }

    fn supertypes_of(&self, classifier: &Symbol, depth: usize) -> Vec<Symbol> {
        let Some((unit, anchor)) = self.anchor_of(classifier) else {
            return Vec::new();
        };
        classifier
            .super_types
            .iter()
            .filter_map(|text| self.resolve_type_text(unit, anchor, text, true, depth))
            .collect()
    }

    fn follow_alias(&self, classifier: &Symbol, depth: usize) -> Option<Symbol> {
        if classifier.kind != SymbolKind::TypeAlias {
            return Some(classifier.clone());
        }
        let aliased = classifier.type_text.as_ref()?;
        let (unit, anchor) = self.anchor_of(classifier)?;
        self.resolve_type_text(unit, anchor, aliased, true, depth + 1)
    }

    /// Classifier named by a type as written in `unit` at `at`
    fn resolve_type_text<'u>(
        &self,
        unit: &'u SourceUnit,
        at: Node<'u>,
        text: &str,
        follow_alias: bool,
        depth: usize,
    ) -> Option<Symbol> {
        if depth > MAX_DEPTH {
            return None;
        }
        let name: String = simple_type_name(text).chars().filter(|c| !c.is_whitespace()).collect();
        if name.is_empty() {
            return None;
        }

        let found = if name.contains('.') {
            self.by_fqn(&name, Want::Type).into_iter().next().or_else(|| {
                let mut segments = name.split('.');
                let first = segments.next()?;
                let mut current = self.lookup(unit, first, at, Want::Type, depth + 1).into_iter().next()?;
                for segment in segments {
                    current = self.members_named(&current, segment, Want::Type, depth + 1).into_iter().next()?;
                }
                Some(current)
            })
        } else {
            self.lookup(unit, &name, at, Want::Type, depth + 1).into_iter().next()
        };
        let resolved = found?;

        if follow_alias {
            self.follow_alias(&resolved, depth)
        } else {
            Some(resolved)
        }
    }

    // ---- type inference ----

    fn named_type<'u>(&self, unit: &'u SourceUnit, at: Node<'u>, name: &str, depth: usize) -> InferredType {
        InferredType {
            name: name.to_string(),
            classifier: self.resolve_type_text(unit, at, name, true, depth + 1),
        }
    }

    /// Type a symbol evaluates to: declared or inferred for variables, return
    /// type for functions, owning class for constructors
    fn symbol_type(&self, symbol: &Symbol, depth: usize) -> Option<InferredType> {
        if depth > MAX_DEPTH {
            return None;
        }
        match symbol.kind {
            SymbolKind::Object | SymbolKind::Class | SymbolKind::EnumClass | SymbolKind::Interface => {
                return Some(InferredType::of(symbol.clone()));
            }
            SymbolKind::TypeAlias => return self.follow_alias(symbol, depth).map(InferredType::of),
            SymbolKind::Constructor | SymbolKind::EnumEntry => {
                if let Some(owner) = symbol.parent.as_ref().and_then(|p| self.index.symbol(p)) {
                    return Some(InferredType::of(owner.clone()));
                }
            }
            _ => {}
        }

        let (unit, anchor) = self.anchor_of(symbol)?;
        if let Some(text) = &symbol.type_text {
            let name = simple_type_name(text);
            return Some(InferredType {
                name: name.rsplit('.').next().unwrap_or(name).to_string(),
                classifier: self.resolve_type_text(unit, anchor, text, true, depth + 1),
            });
        }

        // `val x = <initializer>`
        if anchor.kind() == "property_declaration" && child_of_kind(anchor, "property_delegate").is_none() {
            let mut after_eq = false;
            for child in children(anchor) {
                if child.kind() == "=" {
                    after_eq = true;
                } else if after_eq && child.is_named() {
                    return self.infer(unit, child, depth + 1);
                }
            }
        }
        None
    }

    fn infer<'u>(&self, unit: &'u SourceUnit, expr: Node<'u>, depth: usize) -> Option<InferredType> {
        if depth > MAX_DEPTH {
            return None;
        }
        let text = unit.text.as_str();

        match expr.kind() {
            "simple_identifier" => {
                let symbol = self.lookup(unit, node_text(expr, text), expr, Want::Value, depth + 1).into_iter().next()?;
                self.symbol_type(&symbol, depth + 1)
            }
            "parenthesized_expression" | "elvis_expression" => {
                self.infer(unit, expr.named_child(0)?, depth + 1)
            }
            "navigation_expression" => {
                let (symbols, _) = self.member_access(unit, expr, Want::Value, depth + 1);
                self.symbol_type(symbols.first()?, depth + 1)
            }
            "call_expression" => {
                let call = self.call_target(unit, expr, depth + 1)?;
                self.symbol_type(&call.symbol, depth + 1)
            }
            "this_expression" => self.this_type(unit, expr, depth),
            "super_expression" => {
                let class = self.enclosing_receivers(unit, expr, depth + 1).into_iter().next()?;
                self.supertypes_of(&class, depth + 1).into_iter().next().map(InferredType::of)
            }
            "as_expression" => {
                let target = children(expr).into_iter().filter(|c| kotlin::is_type_node(c.kind())).last()?;
                let type_text = node_text(target, text);
                Some(self.named_type(unit, expr, simple_type_name(type_text), depth))
            }
            "postfix_expression" => self.infer(unit, expr.named_child(0)?, depth + 1),
            "indexing_expression" => {
                let call = self.resolve_operator(unit, expr, depth + 1)?;
                self.symbol_type(&call.symbol, depth + 1)
            }
            "string_literal" | "line_string_literal" | "multi_line_string_literal" => {
                Some(self.named_type(unit, expr, "String", depth))
            }
            "integer_literal" | "hex_literal" | "bin_literal" => Some(self.named_type(unit, expr, "Int", depth)),
            "long_literal" => Some(self.named_type(unit, expr, "Long", depth)),
            "real_literal" => {
                let name = if node_text(expr, text).ends_with(|c| c == 'f' || c == 'F') { "Float" } else { "Double" };
                Some(self.named_type(unit, expr, name, depth))
            }
            "boolean_literal" => Some(self.named_type(unit, expr, "Boolean", depth)),
            "character_literal" => Some(self.named_type(unit, expr, "Char", depth)),
            _ => None,
        }
    }

    fn this_type<'u>(&self, unit: &'u SourceUnit, expr: Node<'u>, depth: usize) -> Option<InferredType> {
        let label = node_text(expr, &unit.text).strip_prefix("this@").map(str::to_string);
        let mut current = expr.parent();

        while let Some(node) = current {
            match node.kind() {
                "function_declaration" | "property_declaration" => {
                    if let Some(receiver) = receiver_type_of(node, &unit.text) {
                        let name = kotlin::declaration_name(node, &unit.text);
                        if label.is_none() || label == name {
                            return Some(self.named_type(unit, node, simple_type_name(&receiver), depth));
                        }
                    }
                }
                "class_declaration" | "object_declaration" | "companion_object" => {
                    let name = kotlin::declaration_name(node, &unit.text);
                    if label.is_none() || label == name {
                        return self.index.classifier_at(&unit.key_of(node)).cloned().map(InferredType::of);
                    }
                }
                _ => {}
            }
            current = node.parent();
        }
        None
    }

    // ---- member access and calls ----

    /// Resolve `receiver.name`
    fn member_lookup<'u>(
        &self,
        unit: &'u SourceUnit,
        receiver: Node<'u>,
        name: &str,
        at: Node<'u>,
        want: Want,
        depth: usize,
    ) -> (Vec<Symbol>, bool) {
        if let Some(receiver_type) = self.infer(unit, receiver, depth + 1) {
            if let Some(classifier) = &receiver_type.classifier {
                let members = self.members_named(classifier, name, want, depth + 1);
                if !members.is_empty() {
                    return (members, false);
                }
            }
            let extensions = self.visible_extensions(unit, at, name, want, &receiver_type, depth + 1);
            if !extensions.is_empty() {
                return (extensions, true);
            }
        }

        // `com.example.Foo` read as a qualified name
        let qualified: String = format!("{}.{}", node_text(receiver, &unit.text), name)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        (self.by_fqn(&qualified, want), false)
    }

    fn member_access<'u>(&self, unit: &'u SourceUnit, navigation: Node<'u>, want: Want, depth: usize) -> (Vec<Symbol>, bool) {
        let Some(receiver) = navigation.named_child(0) else {
            return (Vec::new(), false);
        };
        let Some(name) = child_of_kind(navigation, "navigation_suffix")
            .and_then(|suffix| child_of_kind(suffix, "simple_identifier"))
            .map(|n| node_text(n, &unit.text))
        else {
            return (Vec::new(), false);
        };
        self.member_lookup(unit, receiver, name, navigation, want, depth)
    }

    /// Extension declarations in scope whose receiver matches
    fn visible_extensions<'u>(
        &self,
        unit: &'u SourceUnit,
        at: Node<'u>,
        name: &str,
        want: Want,
        receiver: &InferredType,
        depth: usize,
    ) -> Vec<Symbol> {
        let mut receiver_names: HashSet<String> = HashSet::new();
        receiver_names.insert(receiver.name.clone());
        if let Some(classifier) = &receiver.classifier {
            receiver_names.insert(classifier.name.clone());
            for supertype in self.supertypes_of(classifier, depth + 1) {
                receiver_names.insert(supertype.name);
            }
        }
        let matches_receiver = |symbol: &Symbol| {
            symbol
                .receiver_type
                .as_deref()
                .map(|r| {
                    let simple = simple_type_name(r);
                    receiver_names.contains(simple.rsplit('.').next().unwrap_or(simple))
                })
                .unwrap_or(false)
        };

        let scoped: Vec<Symbol> = self
            .lookup(unit, name, at, want, depth + 1)
            .into_iter()
            .filter(|s| matches_receiver(s))
            .collect();
        if !scoped.is_empty() {
            return scoped;
        }

        let global: Vec<Symbol> = self
            .index
            .find_by_name(name)
            .into_iter()
            .filter(|s| s.parent.is_none() && want.accepts(s) && matches_receiver(s))
            .cloned()
            .collect();
        let declarations: HashSet<NodeKey> = global.iter().map(|s| s.declaration).collect();
        if declarations.len() == 1 {
            global
        } else {
            Vec::new()
        }
    }

    fn constructors_of(&self, classifier: &Symbol, depth: usize) -> Vec<Symbol> {
        let Some(class) = self.follow_alias(classifier, depth) else {
            return Vec::new();
        };
        self.index
            .members_of(&class.pointer)
            .into_iter()
            .filter(|m| m.kind == SymbolKind::Constructor)
            .cloned()
            .collect()
    }

    /// Pick the callee among candidates, narrowing overloads by argument count
    fn choose_callable(&self, candidates: Vec<Symbol>, arg_count: usize, depth: usize) -> Option<Symbol> {
        let narrow = |callables: Vec<Symbol>| -> Option<Symbol> {
            if callables.len() <= 1 {
                return callables.into_iter().next();
            }
            let exact = callables
                .iter()
                .find(|c| c.parameter_count == Some(arg_count))
                .cloned();
            exact.or_else(|| callables.into_iter().next())
        };

        let functions: Vec<Symbol> = candidates.iter().filter(|c| c.kind.is_callable()).cloned().collect();
        if !functions.is_empty() {
            return narrow(functions);
        }

        if let Some(classifier) = candidates.iter().find(|c| c.kind.is_classifier()) {
            let constructors = self.constructors_of(classifier, depth + 1);
            if !constructors.is_empty() {
                return narrow(constructors);
            }
        }

        // invoking a variable of function type
        candidates.into_iter().find(|c| c.kind.is_variable())
    }

    fn argument_count(call_suffix: Option<Node>) -> usize {
        let Some(suffix) = call_suffix else {
            return 0;
        };
        let values = child_of_kind(suffix, "value_arguments")
            .map(|args| children_of_kind(args, "value_argument").len())
            .unwrap_or(0);
        let trailing = usize::from(child_of_kind(suffix, "annotated_lambda").is_some());
        values + trailing
    }

    fn call_target<'u>(&self, unit: &'u SourceUnit, call: Node<'u>, depth: usize) -> Option<CallInfo> {
        let callee = call.named_child(0)?;
        let arg_count = Self::argument_count(child_of_kind(call, "call_suffix"));

        let (candidates, via_extension) = match callee.kind() {
            "simple_identifier" => (
                self.lookup(unit, node_text(callee, &unit.text), callee, Want::Callable, depth + 1),
                false,
            ),
            "navigation_expression" => self.member_access(unit, callee, Want::Callable, depth + 1),
            _ => return None,
        };

        let symbol = self.choose_callable(candidates, arg_count, depth)?;
        let mut info = CallInfo::new(symbol);
        info.extension_receiver |= via_extension;
        Some(info)
    }

    fn constructor_call<'u>(&self, unit: &'u SourceUnit, invocation: Node<'u>, depth: usize) -> Option<CallInfo> {
        let user_type = child_of_kind(invocation, "user_type")?;
        let classifier = self.resolve_type_text(unit, invocation, node_text(user_type, &unit.text), true, depth + 1)?;
        let arg_count = child_of_kind(invocation, "value_arguments")
            .map(|args| children_of_kind(args, "value_argument").len())
            .unwrap_or(0);
        let constructors = self.constructors_of(&classifier, depth + 1);
        self.choose_callable(constructors, arg_count, depth).map(CallInfo::new)
    }

    fn operator_call<'u>(
        &self,
        unit: &'u SourceUnit,
        at: Node<'u>,
        receiver: InferredType,
        name: &str,
        depth: usize,
    ) -> Option<CallInfo> {
        let is_operator = |s: &Symbol| s.kind == SymbolKind::Function && s.is_operator();

        if let Some(classifier) = &receiver.classifier {
            let member = self
                .members_named(classifier, name, Want::Callable, depth + 1)
                .into_iter()
                .find(is_operator);
            if let Some(member) = member {
                return Some(CallInfo::new(member));
            }
        }
        self.visible_extensions(unit, at, name, Want::Callable, &receiver, depth + 1)
            .into_iter()
            .find(is_operator)
            .map(CallInfo::new)
    }

    fn operator_token<'u>(&self, unit: &'u SourceUnit, node: Node<'u>) -> Option<&'u str> {
        children(node)
            .into_iter()
            .find(|c| !c.is_named())
            .map(|c| node_text(c, &unit.text))
    }

    fn resolve_operator<'u>(&self, unit: &'u SourceUnit, node: Node<'u>, depth: usize) -> Option<CallInfo> {
        let text = unit.text.as_str();

        match node.kind() {
            "infix_expression" => {
                let left = node.named_child(0)?;
                let function = node.named_child(1)?;
                let receiver = self.infer(unit, left, depth + 1)?;
                let name = node_text(function, text);
                let classifier = receiver.classifier.clone();
                let member = classifier.and_then(|c| {
                    self.members_named(&c, name, Want::Callable, depth + 1)
                        .into_iter()
                        .find(|s| s.kind == SymbolKind::Function)
                });
                member
                    .or_else(|| {
                        self.visible_extensions(unit, node, name, Want::Callable, &receiver, depth + 1)
                            .into_iter()
                            .find(|s| s.kind == SymbolKind::Function)
                    })
                    .map(CallInfo::new)
            }
            kind if BINARY_OPERATOR_KINDS.contains(&kind) => {
                let token = self.operator_token(unit, node)?;
                let name = operator_function(token)?;
                let left = node.named_child(0)?;
                let right = node.named_child(node.named_child_count().checked_sub(1)?)?;
                // `a in b` calls `b.contains(a)`
                let receiver = if name == "contains" { right } else { left };
                let receiver_type = self.infer(unit, receiver, depth + 1)?;
                self.operator_call(unit, node, receiver_type, name, depth)
            }
            "prefix_expression" => {
                let operator = node.child(0)?;
                if operator.is_named() {
                    // annotation or label prefix
                    return None;
                }
                let name = unary_operator_function(node_text(operator, text))?;
                let operand = node.named_child(0)?;
                let receiver_type = self.infer(unit, operand, depth + 1)?;
                self.operator_call(unit, node, receiver_type, name, depth)
            }
            "postfix_expression" => {
                let operator = node.child(node.child_count().checked_sub(1)?)?;
                let name = match node_text(operator, text) {
                    "++" => "inc",
                    "--" => "dec",
                    _ => return None,
                };
                let operand = node.named_child(0)?;
                let receiver_type = self.infer(unit, operand, depth + 1)?;
                self.operator_call(unit, node, receiver_type, name, depth)
            }
            "indexing_expression" => {
                let receiver = node.named_child(0)?;
                let receiver_type = self.infer(unit, receiver, depth + 1)?;
                self.operator_call(unit, node, receiver_type, "get", depth)
            }
            "assignment" => {
                let target = child_of_kind(node, "directly_assignable_expression")?;
                let token = children(node)
                    .into_iter()
                    .find(|c| !c.is_named() && node_text(*c, text).ends_with('='))
                    .map(|c| node_text(c, text))?;

                if token == "=" {
                    // `a[i] = v` calls `a.set(i, v)`
                    child_of_kind(target, "indexing_suffix")?;
                    let receiver = target.named_child(0)?;
                    let receiver_type = self.infer(unit, receiver, depth + 1)?;
                    return self.operator_call(unit, node, receiver_type, "set", depth);
                }

                let receiver_type = self.infer_assignable(unit, target, depth + 1)?;
                let assign_name = operator_function(token)?;
                self.operator_call(unit, node, receiver_type.clone(), assign_name, depth)
                    .or_else(|| {
                        let binary = operator_function(token.trim_end_matches('='))?;
                        self.operator_call(unit, node, receiver_type, binary, depth)
                    })
            }
            _ => None,
        }
    }

    fn infer_assignable<'u>(&self, unit: &'u SourceUnit, target: Node<'u>, depth: usize) -> Option<InferredType> {
        let symbol = self.assignable_symbols(unit, target, depth).into_iter().next()?;
        self.symbol_type(&symbol, depth + 1)
    }

    /// Variable written by an assignment target
    fn assignable_symbols<'u>(&self, unit: &'u SourceUnit, target: Node<'u>, depth: usize) -> Vec<Symbol> {
        let text = unit.text.as_str();
        if let Some(suffix) = child_of_kind(target, "navigation_suffix") {
            let (Some(receiver), Some(name)) = (
                target.named_child(0),
                child_of_kind(suffix, "simple_identifier").map(|n| node_text(n, text)),
            ) else {
                return Vec::new();
            };
            return self.member_lookup(unit, receiver, name, target, Want::Value, depth + 1).0;
        }
        if child_of_kind(target, "indexing_suffix").is_some() {
            return Vec::new();
        }
        match child_of_kind(target, "simple_identifier") {
            Some(identifier) => self.lookup(unit, node_text(identifier, text), identifier, Want::Value, depth + 1),
            None => Vec::new(),
        }
    }

    fn delegate_conventions<'u>(&self, unit: &'u SourceUnit, delegate: Node<'u>) -> Vec<CallInfo> {
        let Some(expression) = delegate.named_child(0) else {
            return Vec::new();
        };
        let Some(delegate_type) = self.infer(unit, expression, 1) else {
            return Vec::new();
        };
        let mutable = delegate
            .parent()
            .map(|property| binding_of(property, &unit.text) == Some("var"))
            .unwrap_or(false);

        let mut conventions = Vec::new();
        if let Some(get) = self.operator_call(unit, delegate, delegate_type.clone(), "getValue", 1) {
            conventions.push(get);
        }
        if mutable {
            if let Some(set) = self.operator_call(unit, delegate, delegate_type, "setValue", 1) {
                conventions.push(set);
            }
        }
        conventions
    }

    fn callable_reference<'u>(&self, unit: &'u SourceUnit, node: Node<'u>) -> Vec<Symbol> {
        let text = unit.text.as_str();
        let Some(name) = children(node)
            .into_iter()
            .filter(|c| c.kind() == "simple_identifier")
            .last()
            .map(|n| node_text(n, text))
        else {
            return Vec::new();
        };

        // `Type::member`
        let receiver = children(node)
            .into_iter()
            .take_while(|c| c.kind() != "::")
            .find(|c| c.is_named());
        if let Some(receiver) = receiver {
            let receiver_text = node_text(receiver, text);
            if let Some(classifier) = self.resolve_type_text(unit, node, receiver_text, true, 1) {
                let members = self.members_named(&classifier, name, Want::Callable, 1);
                if !members.is_empty() {
                    return members;
                }
                let extensions =
                    self.visible_extensions(unit, node, name, Want::Callable, &InferredType::of(classifier), 1);
                if !extensions.is_empty() {
                    return extensions;
                }
            }
            return Vec::new();
        }
        self.lookup(unit, name, node, Want::Callable, 1)
    }
}

impl AnalysisSession for ProjectSession<'_> {
    fn unit(&self) -> &SourceUnit {
        self.unit
    }

    fn index(&self) -> &SymbolIndex {
        self.index
    }

    fn resolve_reference(&self, node: Node) -> Result<Vec<Symbol>, SessionError> {
        self.check_node(node)?;
        let unit = self.unit;
        let text = unit.text.as_str();

        let symbols = match node.kind() {
            "simple_identifier" | "interpolated_identifier" => {
                self.lookup(unit, node_text(node, text), node, Want::Value, 0)
            }
            "navigation_expression" => self.member_access(unit, node, Want::Value, 0).0,
            "directly_assignable_expression" => self.assignable_symbols(unit, node, 0),
            "callable_reference" => self.callable_reference(unit, node),
            _ => Vec::new(),
        };

        for symbol in &symbols {
            if symbol.origin != Origin::Synthetic
                && !symbol.kind.is_local()
                && self.index.symbol(&symbol.pointer).is_none()
            {
                return Err(SessionError::StaleSymbol(symbol.declaration));
            }
        }
        trace!("{} -> {} symbol(s)", node_text(node, text), symbols.len());
        Ok(symbols)
    }

    fn resolve_call(&self, node: Node) -> Result<Option<CallInfo>, SessionError> {
        self.check_node(node)?;
        let unit = self.unit;

        let call = match node.kind() {
            "call_expression" => self.call_target(unit, node, 0),
            "constructor_invocation" => self.constructor_call(unit, node, 0),
            "delegation_specifier" | "annotation" => {
                child_of_kind(node, "constructor_invocation").and_then(|inv| self.constructor_call(unit, inv, 0))
            }
            "property_delegate" => self.delegate_conventions(unit, node).into_iter().next(),
            _ => self.resolve_operator(unit, node, 0),
        };
        Ok(call)
    }

    fn resolve_type(&self, node: Node) -> Result<Option<Symbol>, SessionError> {
        self.check_node(node)?;
        let unit = self.unit;

        let type_node = match node.kind() {
            "user_type" | "type_identifier" => Some(node),
            "nullable_type" | "constructor_invocation" => child_of_kind(node, "user_type"),
            "delegation_specifier" | "annotation" => kotlin::specifier_type(node),
            _ => None,
        };
        let Some(type_node) = type_node else {
            return Ok(None);
        };
        Ok(self.resolve_type_text(unit, type_node, node_text(type_node, &unit.text), false, 0))
    }

    fn resolve_delegate(&self, node: Node) -> Result<Vec<CallInfo>, SessionError> {
        self.check_node(node)?;
        Ok(self.delegate_conventions(self.unit, node))
    }
}
