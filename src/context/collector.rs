// Single-pass usage collector over one declaration subtree

use super::usage::{call_usages, classify_access, classify_call, ResolvedUsage, UsageKind, UsageSite};
use super::PipelineError;
use crate::analysis::{AnalysisSession, CancellationToken, SessionError, BINARY_OPERATOR_KINDS};
use crate::parser::kotlin::specifier_type;
use crate::parser::{ancestor_of_kind, child_of_kind, children, children_of_kind, named_children, node_text};
use crate::symbol::Symbol;
use tracing::{debug, trace, warn};
use tree_sitter::Node;

/// Nodes whose first `simple_identifier` names the declared entity
const DECLARING_KINDS: &[&str] = &[
    "class_parameter",
    "parameter",
    "parameter_with_optional_type",
    "enum_entry",
    "function_declaration",
    "type_alias",
    "object_declaration",
    "class_declaration",
    "companion_object",
    "variable_declaration",
    "catch_block",
];

/// Identifiers below these never refer to a declaration
const NON_REFERENCE_ANCESTORS: &[&str] = &[
    "label",
    "import_header",
    "package_header",
    "identifier",
    "callable_reference",
    "this_expression",
    "super_expression",
];

/// Node kinds the collector resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyntaxKind {
    Call,
    Navigation,
    Identifier,
    Assignment,
    Operator,
    UserType,
    DelegationSpecifier,
    Annotation,
    PropertyDelegate,
    CallableReference,
    Other,
}

impl SyntaxKind {
    fn of(kind: &str) -> Self {
        match kind {
            "call_expression" => SyntaxKind::Call,
            "navigation_expression" => SyntaxKind::Navigation,
            "simple_identifier" | "interpolated_identifier" => SyntaxKind::Identifier,
            "assignment" => SyntaxKind::Assignment,
            "prefix_expression" | "postfix_expression" | "indexing_expression" => SyntaxKind::Operator,
            kind if BINARY_OPERATOR_KINDS.contains(&kind) => SyntaxKind::Operator,
            "user_type" => SyntaxKind::UserType,
            "delegation_specifier" => SyntaxKind::DelegationSpecifier,
            "annotation" => SyntaxKind::Annotation,
            "property_delegate" => SyntaxKind::PropertyDelegate,
            "callable_reference" => SyntaxKind::CallableReference,
            _ => SyntaxKind::Other,
        }
    }
}

/// Which children a handler leaves for the traversal
enum Descend<'t> {
    All,
    Only(Vec<Node<'t>>),
    Nothing,
}

#[derive(Default)]
struct Accumulator {
    usages: Vec<ResolvedUsage>,
    visited: usize,
}

/// Walks a declaration subtree in pre-order and resolves every usage in it
pub struct UsageCollector<'s> {
    session: &'s dyn AnalysisSession,
    max_usages: usize,
    include_local_reads: bool,
    cancel: Option<CancellationToken>,
    check_interval: usize,
}

impl<'s> UsageCollector<'s> {
    pub fn new(session: &'s dyn AnalysisSession, max_usages: usize) -> Self {
        Self {
            session,
            max_usages,
            include_local_reads: false,
            cancel: None,
            check_interval: 64,
        }
    }

    /// Keep reads of parameters, locals and constructor properties
    pub fn include_local_reads(mut self, include: bool) -> Self {
        self.include_local_reads = include;
        self
    }

    /// Poll `token` every `interval` visited nodes
    pub fn with_cancellation(mut self, token: CancellationToken, interval: usize) -> Self {
        self.cancel = Some(token);
        self.check_interval = interval.max(1);
        self
    }

    /// Usages inside `root`, in document order, at most `max_usages` of them
    pub fn collect(&self, root: Node) -> Result<Vec<ResolvedUsage>, PipelineError> {
        self.check_cancelled()?;
        let mut acc = Accumulator::default();

        self.visit(root, false, &mut acc)?;

        // property accessors can be parsed as siblings
        if root.kind() == "property_declaration" {
            let mut next = root.next_sibling();
            while let Some(sibling) = next {
                if !matches!(sibling.kind(), "getter" | "setter") {
                    break;
                }
                self.visit(sibling, false, &mut acc)?;
                next = sibling.next_sibling();
            }
        }

        self.check_cancelled()?;
        debug!(
            "Collected {} usages from {} nodes",
            acc.usages.len(),
            acc.visited
        );
        Ok(acc.usages)
    }

    fn check_cancelled(&self) -> Result<(), PipelineError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(PipelineError::Cancelled),
            _ => Ok(()),
        }
    }

    fn visit<'t>(&self, node: Node<'t>, in_delegate: bool, acc: &mut Accumulator) -> Result<(), PipelineError> {
        if acc.usages.len() >= self.max_usages {
            return Ok(());
        }
        acc.visited += 1;
        if acc.visited % self.check_interval == 0 {
            self.check_cancelled()?;
        }

        let descend = match SyntaxKind::of(node.kind()) {
            SyntaxKind::Call => self.on_call(node, in_delegate, acc),
            SyntaxKind::Navigation => self.on_navigation(node, acc),
            SyntaxKind::Identifier => self.on_identifier(node, acc),
            SyntaxKind::Assignment => self.on_assignment(node, in_delegate, acc),
            SyntaxKind::Operator => {
                self.record_call(node, in_delegate, acc);
                Descend::All
            }
            SyntaxKind::UserType => self.on_user_type(node, acc),
            SyntaxKind::DelegationSpecifier => self.on_delegation_specifier(node, acc),
            SyntaxKind::Annotation => self.on_annotation(node, acc),
            SyntaxKind::PropertyDelegate => self.on_property_delegate(node, acc),
            SyntaxKind::CallableReference => {
                self.record_reference(node, false, acc);
                Descend::Nothing
            }
            SyntaxKind::Other => {
                trace!("No usage handler for {}", node.kind());
                Descend::All
            }
        };

        let in_delegate = in_delegate || node.kind() == "property_delegate";
        let next = match descend {
            Descend::All => named_children(node),
            Descend::Only(nodes) => nodes,
            Descend::Nothing => Vec::new(),
        };
        for child in next {
            self.visit(child, in_delegate, acc)?;
        }
        Ok(())
    }

    // ---- handlers ----

    fn on_call<'t>(&self, node: Node<'t>, in_delegate: bool, acc: &mut Accumulator) -> Descend<'t> {
        self.record_call(node, in_delegate, acc);

        let mut next = Vec::new();
        if let Some(callee) = node.named_child(0) {
            match callee.kind() {
                "simple_identifier" => {}
                "navigation_expression" => next.extend(callee.named_child(0)),
                _ => next.push(callee),
            }
        }
        next.extend(children_of_kind(node, "call_suffix"));
        Descend::Only(next)
    }

    fn on_navigation<'t>(&self, node: Node<'t>, acc: &mut Accumulator) -> Descend<'t> {
        self.record_reference(node, false, acc);
        Descend::Only(node.named_child(0).into_iter().collect())
    }

    fn on_identifier<'t>(&self, node: Node<'t>, acc: &mut Accumulator) -> Descend<'t> {
        if self.is_reference_position(node) {
            self.record_reference(node, false, acc);
        }
        Descend::Nothing
    }

    fn on_assignment<'t>(&self, node: Node<'t>, in_delegate: bool, acc: &mut Accumulator) -> Descend<'t> {
        let Some(target) = child_of_kind(node, "directly_assignable_expression") else {
            return Descend::All;
        };
        let text = self.session.unit().text.as_str();
        let plain = children(node)
            .into_iter()
            .find(|c| !c.is_named() && node_text(*c, text).ends_with('='))
            .map(|c| node_text(c, text) == "=")
            .unwrap_or(true);
        let indexed = child_of_kind(target, "indexing_suffix").is_some();

        if !indexed {
            self.record_reference(target, true, acc);
        }
        if indexed || !plain {
            self.record_call(node, in_delegate, acc);
        }

        let mut next = Vec::new();
        if indexed {
            next.extend(named_children(target));
        } else if child_of_kind(target, "navigation_suffix").is_some() {
            next.extend(target.named_child(0));
        }
        next.extend(named_children(node).into_iter().filter(|c| *c != target));
        Descend::Only(next)
    }

    fn on_user_type<'t>(&self, node: Node<'t>, acc: &mut Accumulator) -> Descend<'t> {
        self.record_type(node, UsageKind::TypeReference, acc);
        Descend::Only(children_of_kind(node, "type_arguments"))
    }

    fn on_delegation_specifier<'t>(&self, node: Node<'t>, acc: &mut Accumulator) -> Descend<'t> {
        self.record_type(node, UsageKind::Supertype, acc);

        let invocation = child_of_kind(node, "constructor_invocation");
        if invocation.is_some() {
            self.record_call(node, false, acc);
        }

        let mut next: Vec<Node<'t>> = specifier_type(node)
            .map(|t| children_of_kind(t, "type_arguments"))
            .unwrap_or_default();
        if let Some(invocation) = invocation {
            next.extend(children_of_kind(invocation, "value_arguments"));
        }
        if let Some(delegation) = child_of_kind(node, "explicit_delegation") {
            next.extend(
                named_children(delegation)
                    .into_iter()
                    .filter(|c| c.kind() != "user_type"),
            );
        }
        Descend::Only(next)
    }

    fn on_annotation<'t>(&self, node: Node<'t>, acc: &mut Accumulator) -> Descend<'t> {
        self.record_type(node, UsageKind::Annotation, acc);

        let arguments = child_of_kind(node, "constructor_invocation")
            .and_then(|invocation| child_of_kind(invocation, "value_arguments"));
        match arguments {
            Some(arguments) => {
                self.record_call(node, false, acc);
                Descend::Only(vec![arguments])
            }
            None => Descend::Nothing,
        }
    }

    fn on_property_delegate<'t>(&self, node: Node<'t>, acc: &mut Accumulator) -> Descend<'t> {
        let site = UsageSite::of(self.session.unit(), node);
        match self.session.resolve_delegate(node) {
            Ok(conventions) => {
                for call in conventions {
                    self.record_all(acc, call_usages(call, UsageKind::DelegatedProperty, site));
                }
            }
            Err(e) => self.skip(node, e),
        }
        Descend::All
    }

    // ---- recording ----

    fn record_call(&self, node: Node, in_delegate: bool, acc: &mut Accumulator) {
        match self.session.resolve_call(node) {
            Ok(Some(call)) => {
                let kind = classify_call(&call, in_delegate);
                let site = UsageSite::of(self.session.unit(), node);
                self.record_all(acc, call_usages(call, kind, site));
            }
            Ok(None) => trace!("Unresolved {} at {}", node.kind(), node.start_byte()),
            Err(e) => self.skip(node, e),
        }
    }

    fn record_reference(&self, node: Node, is_assignment_target: bool, acc: &mut Accumulator) {
        let symbol = match self.session.resolve_reference(node) {
            Ok(symbols) => symbols.into_iter().next(),
            Err(e) => {
                self.skip(node, e);
                return;
            }
        };
        let Some(symbol) = symbol else {
            trace!("Unresolved {} at {}", node.kind(), node.start_byte());
            return;
        };

        let site = UsageSite::of(self.session.unit(), node);
        let kind = if symbol.kind.is_classifier() {
            if self.is_qualifier(node) {
                return;
            }
            UsageKind::TypeReference
        } else if symbol.kind.is_callable() {
            UsageKind::Call
        } else {
            classify_access(&symbol, is_assignment_target)
        };
        self.record_symbol(acc, symbol, kind, site);
    }

    fn record_type(&self, node: Node, kind: UsageKind, acc: &mut Accumulator) {
        match self.session.resolve_type(node) {
            Ok(Some(symbol)) => {
                let site = UsageSite::of(self.session.unit(), node);
                self.record_all(acc, vec![ResolvedUsage::new(symbol, kind, site)]);
            }
            Ok(None) => trace!("Unresolved type at {}", node.start_byte()),
            Err(e) => self.skip(node, e),
        }
    }

    fn record_symbol(&self, acc: &mut Accumulator, symbol: Symbol, kind: UsageKind, site: UsageSite) {
        let extension = symbol.is_extension();
        let mut usages = vec![ResolvedUsage::new(symbol, kind, site)];
        if extension {
            let symbol = usages[0].symbol.clone();
            usages.push(ResolvedUsage::new(symbol, UsageKind::ExtensionReceiver, site));
        }
        self.record_all(acc, usages);
    }

    fn record_all(&self, acc: &mut Accumulator, usages: Vec<ResolvedUsage>) {
        for usage in usages {
            if acc.usages.len() >= self.max_usages {
                return;
            }
            if !self.include_local_reads && usage.is_low_signal() {
                trace!("Dropping low-signal read of {}", usage.symbol.name);
                continue;
            }
            acc.usages.push(usage);
        }
    }

    fn skip(&self, node: Node, error: SessionError) {
        warn!(
            "Skipping {} at {}: {}",
            node.kind(),
            node.start_byte(),
            error
        );
    }

    // ---- positions ----

    /// `Foo` in `Foo.bar` or `Foo.x = 1`
    fn is_qualifier(&self, node: Node) -> bool {
        node.parent()
            .map(|parent| {
                matches!(parent.kind(), "navigation_expression" | "directly_assignable_expression")
                    && parent.named_child(0) == Some(node)
                    && node.kind() != "directly_assignable_expression"
            })
            .unwrap_or(false)
    }

    fn is_reference_position(&self, node: Node) -> bool {
        let Some(parent) = node.parent() else {
            return false;
        };
        let text = self.session.unit().text.as_str();

        match parent.kind() {
            "navigation_suffix" | "directly_assignable_expression" => return false,
            "call_expression" if parent.named_child(0) == Some(node) => return false,
            "infix_expression" if parent.named_child(1) == Some(node) => return false,
            "value_argument" => {
                // named argument label
                if node.next_sibling().map(|s| s.kind() == "=").unwrap_or(false) {
                    return false;
                }
            }
            "jump_expression" => {
                // `return@label`
                if node
                    .prev_sibling()
                    .map(|s| !s.is_named() && node_text(s, text).ends_with('@'))
                    .unwrap_or(false)
                {
                    return false;
                }
            }
            kind if DECLARING_KINDS.contains(&kind) => {
                if child_of_kind(parent, "simple_identifier") == Some(node) {
                    return false;
                }
            }
            _ => {}
        }

        ancestor_of_kind(node, NON_REFERENCE_ANCESTORS).is_none()
    }
}
