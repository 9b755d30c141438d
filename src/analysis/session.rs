use crate::parser::SourceUnit;
use crate::symbol::{NodeKey, Symbol, SymbolIndex};
use thiserror::Error;
use tree_sitter::Node;

/// Failures of a single resolution request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Symbol declared at {0} is no longer in the index")]
    StaleSymbol(NodeKey),
    #[error("Node at {start}..{end} does not belong to the analyzed file")]
    ForeignNode { start: usize, end: usize },
}

/// A resolved invocation
#[derive(Debug, Clone)]
pub struct CallInfo {
    /// Function, constructor, or variable being invoked
    pub symbol: Symbol,

    /// Dispatched through an explicit or implicit extension receiver
    pub extension_receiver: bool,
}

impl CallInfo {
    pub fn new(symbol: Symbol) -> Self {
        let extension_receiver = symbol.is_extension();
        Self {
            symbol,
            extension_receiver,
        }
    }
}

/// Semantic resolution over one analyzed file.
///
/// Every method is per node: an `Err` or an empty answer concerns that node
/// only.
pub trait AnalysisSession {
    /// File the session was opened on
    fn unit(&self) -> &SourceUnit;

    /// Index backing the session
    fn index(&self) -> &SymbolIndex;

    /// Symbols a name or member access refers to
    fn resolve_reference(&self, node: Node) -> Result<Vec<Symbol>, SessionError>;

    /// Callee of a call, operator expression, or constructor invocation
    fn resolve_call(&self, node: Node) -> Result<Option<CallInfo>, SessionError>;

    /// Classifier a type node denotes
    fn resolve_type(&self, node: Node) -> Result<Option<Symbol>, SessionError>;

    /// `getValue` / `setValue` conventions invoked through a property delegate
    fn resolve_delegate(&self, node: Node) -> Result<Vec<CallInfo>, SessionError> {
        Ok(self.resolve_call(node)?.into_iter().collect())
    }
}
