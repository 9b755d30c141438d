mod builder;
mod declaration;
mod index;

pub use builder::IndexBuilder;
pub use declaration::{FileId, Language, NodeKey, Origin, Symbol, SymbolKind, SymbolPointer};
pub use index::SymbolIndex;
