use crate::analysis::CallInfo;
use crate::parser::SourceUnit;
use crate::symbol::{NodeKey, Symbol, SymbolKind};
use serde::{Deserialize, Serialize};
use tree_sitter::Node;

/// How a declaration is used at one site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsageKind {
    Call,
    PropertyRead,
    PropertyWrite,
    TypeReference,
    Supertype,
    ConstructorCall,
    Annotation,
    DelegatedProperty,
    OperatorCall,
    ExtensionReceiver,
}

impl UsageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageKind::Call => "CALL",
            UsageKind::PropertyRead => "PROPERTY_READ",
            UsageKind::PropertyWrite => "PROPERTY_WRITE",
            UsageKind::TypeReference => "TYPE_REFERENCE",
            UsageKind::Supertype => "SUPERTYPE",
            UsageKind::ConstructorCall => "CONSTRUCTOR_CALL",
            UsageKind::Annotation => "ANNOTATION",
            UsageKind::DelegatedProperty => "DELEGATED_PROPERTY",
            UsageKind::OperatorCall => "OPERATOR_CALL",
            UsageKind::ExtensionReceiver => "EXTENSION_RECEIVER",
        }
    }
}

impl std::fmt::Display for UsageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Syntax node a usage was recorded at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSite {
    pub key: NodeKey,
    pub node_kind: &'static str,
}

impl UsageSite {
    pub fn of(unit: &SourceUnit, node: Node) -> Self {
        Self {
            key: NodeKey::new(unit.id, node.start_byte(), node.end_byte()),
            node_kind: node.kind(),
        }
    }

    pub fn start(&self) -> usize {
        self.key.start
    }
}

/// One occurrence of a symbol use
#[derive(Debug, Clone)]
pub struct ResolvedUsage {
    pub symbol: Symbol,
    pub kind: UsageKind,
    pub site: UsageSite,
}

impl ResolvedUsage {
    pub fn new(symbol: Symbol, kind: UsageKind, site: UsageSite) -> Self {
        Self { symbol, kind, site }
    }

    /// Reads of parameters, locals, destructuring components and constructor
    /// properties; dropped unless local reads are requested
    pub fn is_low_signal(&self) -> bool {
        self.kind == UsageKind::PropertyRead
            && (matches!(
                self.symbol.kind,
                SymbolKind::Parameter | SymbolKind::LocalVariable | SymbolKind::DestructuringComponent
            ) || self.symbol.declared_in_constructor)
    }
}

/// Kind of an invocation: constructor, then operator, then delegate context,
/// then plain call
pub fn classify_call(call: &CallInfo, in_delegate: bool) -> UsageKind {
    let symbol = &call.symbol;
    if symbol.kind == SymbolKind::Constructor {
        UsageKind::ConstructorCall
    } else if symbol.is_operator() {
        UsageKind::OperatorCall
    } else if in_delegate {
        UsageKind::DelegatedProperty
    } else if symbol.kind.is_variable() {
        // invoking a value of function type
        UsageKind::PropertyRead
    } else {
        UsageKind::Call
    }
}

/// Kind of a variable access
pub fn classify_access(symbol: &Symbol, is_assignment_target: bool) -> UsageKind {
    if is_assignment_target && symbol.is_mutable {
        UsageKind::PropertyWrite
    } else {
        UsageKind::PropertyRead
    }
}

/// Usages recorded for one resolved call: its own kind plus
/// `EXTENSION_RECEIVER` when dispatched through an extension
pub fn call_usages(call: CallInfo, kind: UsageKind, site: UsageSite) -> Vec<ResolvedUsage> {
    let extension = call.extension_receiver;
    let mut usages = vec![ResolvedUsage::new(call.symbol, kind, site)];
    if extension {
        let symbol = usages[0].symbol.clone();
        usages.push(ResolvedUsage::new(symbol, UsageKind::ExtensionReceiver, site));
    }
    usages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{FileId, Language, Origin, SymbolPointer};
    use std::path::PathBuf;

    fn symbol(kind: SymbolKind) -> Symbol {
        Symbol::new(
            SymbolPointer::new(FileId(0), 0, 10, kind),
            "s".to_string(),
            Origin::Source,
            Language::Kotlin,
            PathBuf::from("a.kt"),
        )
    }

    fn site() -> UsageSite {
        UsageSite {
            key: NodeKey::new(FileId(0), 20, 25),
            node_kind: "call_expression",
        }
    }

    #[test]
    fn test_call_precedence() {
        let constructor = CallInfo::new(symbol(SymbolKind::Constructor));
        assert_eq!(classify_call(&constructor, true), UsageKind::ConstructorCall);

        let mut plus = symbol(SymbolKind::Function);
        plus.modifiers.push("operator".to_string());
        assert_eq!(classify_call(&CallInfo::new(plus), true), UsageKind::OperatorCall);

        let function = CallInfo::new(symbol(SymbolKind::Function));
        assert_eq!(classify_call(&function, true), UsageKind::DelegatedProperty);
        assert_eq!(classify_call(&function, false), UsageKind::Call);
    }

    #[test]
    fn test_write_requires_mutable_target() {
        let mut property = symbol(SymbolKind::Property);
        assert_eq!(classify_access(&property, true), UsageKind::PropertyRead);
        property.is_mutable = true;
        assert_eq!(classify_access(&property, true), UsageKind::PropertyWrite);
        assert_eq!(classify_access(&property, false), UsageKind::PropertyRead);
    }

    #[test]
    fn test_extension_call_yields_two_usages() {
        let mut function = symbol(SymbolKind::Function);
        function.receiver_type = Some("String".to_string());
        let usages = call_usages(CallInfo::new(function), UsageKind::Call, site());

        let kinds: Vec<UsageKind> = usages.iter().map(|u| u.kind).collect();
        assert_eq!(kinds, vec![UsageKind::Call, UsageKind::ExtensionReceiver]);
        assert_eq!(usages[0].site, usages[1].site);
    }

    #[test]
    fn test_low_signal_reads() {
        for kind in [
            SymbolKind::Parameter,
            SymbolKind::LocalVariable,
            SymbolKind::DestructuringComponent,
        ] {
            let usage = ResolvedUsage::new(symbol(kind), UsageKind::PropertyRead, site());
            assert!(usage.is_low_signal());
        }

        let mut constructor_property = symbol(SymbolKind::Property);
        constructor_property.declared_in_constructor = true;
        assert!(ResolvedUsage::new(constructor_property, UsageKind::PropertyRead, site()).is_low_signal());

        let member = ResolvedUsage::new(symbol(SymbolKind::Property), UsageKind::PropertyRead, site());
        assert!(!member.is_low_signal());

        let write = ResolvedUsage::new(symbol(SymbolKind::LocalVariable), UsageKind::PropertyWrite, site());
        assert!(!write.is_low_signal());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(UsageKind::ExtensionReceiver.to_string(), "EXTENSION_RECEIVER");
        assert_eq!(
            serde_json::to_string(&UsageKind::DelegatedProperty).unwrap(),
            "\"DELEGATED_PROPERTY\""
        );
    }
}
