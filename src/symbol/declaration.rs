use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Index of a source unit inside a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a declaration node: the file it lives in plus its byte span.
///
/// Two symbols that alias the same source declaration (a class and its
/// implicit constructor, say) share a `NodeKey`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub file: FileId,
    pub start: usize,
    pub end: usize,
}

impl NodeKey {
    pub fn new(file: FileId, start: usize, end: usize) -> Self {
        Self { file, start, end }
    }

    /// True when `other` lies inside this span (same file, not equal)
    pub fn strictly_contains(&self, other: &NodeKey) -> bool {
        self.file == other.file
            && self.start <= other.start
            && other.end <= self.end
            && self != other
    }

    /// True when `other` is this span or lies inside it
    pub fn contains(&self, other: &NodeKey) -> bool {
        self == other || self.strictly_contains(other)
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.start, self.end)
    }
}

/// Stable handle to a resolved symbol.
///
/// Re-resolving the same declaration always yields an equal pointer, so it can
/// be stored and compared across resolution calls. `slot` separates synthetic
/// members that share their class's span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolPointer {
    pub file: FileId,
    pub start: usize,
    pub end: usize,
    pub kind: SymbolKind,
    pub slot: u32,
}

impl SymbolPointer {
    pub fn new(file: FileId, start: usize, end: usize, kind: SymbolKind) -> Self {
        Self {
            file,
            start,
            end,
            kind,
            slot: 0,
        }
    }

    pub fn with_slot(mut self, slot: u32) -> Self {
        self.slot = slot;
        self
    }
}

/// Kind of resolved symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SymbolKind {
    // Classifiers
    Class,
    Interface,
    Object,
    EnumClass,
    EnumEntry,
    AnnotationClass,
    TypeAlias,

    // Callables
    Function,
    Constructor,

    // Variables
    Property,
    LocalVariable,
    Parameter,
    DestructuringComponent,
}

impl SymbolKind {
    pub fn is_classifier(&self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::Object
                | SymbolKind::EnumClass
                | SymbolKind::AnnotationClass
                | SymbolKind::TypeAlias
        )
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::Constructor)
    }

    pub fn is_variable(&self) -> bool {
        matches!(
            self,
            SymbolKind::Property
                | SymbolKind::LocalVariable
                | SymbolKind::Parameter
                | SymbolKind::DestructuringComponent
                | SymbolKind::EnumEntry
        )
    }

    /// Variables that only live inside a function body or signature
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SymbolKind::LocalVariable | SymbolKind::Parameter | SymbolKind::DestructuringComponent
        )
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Object => "object",
            SymbolKind::EnumClass => "enum class",
            SymbolKind::EnumEntry => "enum entry",
            SymbolKind::AnnotationClass => "annotation class",
            SymbolKind::TypeAlias => "type alias",
            SymbolKind::Function => "function",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Property => "property",
            SymbolKind::LocalVariable => "local variable",
            SymbolKind::Parameter => "parameter",
            SymbolKind::DestructuringComponent => "destructuring component",
        }
    }
}

/// Provenance of a resolved symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Origin {
    /// Kotlin written in the project
    Source,
    /// Kotlin emitted by a code generator into the project
    SourceGenerated,
    /// Kotlin library code
    Library,
    /// Java written in the project
    JavaSource,
    /// Java library code
    JavaLibrary,
    /// Declared by the compiler, not written anywhere
    Synthetic,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Source => "SOURCE",
            Origin::SourceGenerated => "SOURCE_GENERATED",
            Origin::Library => "LIBRARY",
            Origin::JavaSource => "JAVA_SOURCE",
            Origin::JavaLibrary => "JAVA_LIBRARY",
            Origin::Synthetic => "SYNTHETIC",
        }
    }

    /// Written by the project's own authors
    pub fn is_project_authored(&self) -> bool {
        matches!(self, Origin::Source | Origin::JavaSource)
    }

    pub fn is_library(&self) -> bool {
        matches!(self, Origin::Library | Origin::JavaLibrary)
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Kotlin,
    Java,
}

/// A semantically resolved declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    /// Stable handle
    pub pointer: SymbolPointer,

    /// Defining declaration node
    pub declaration: NodeKey,

    /// Simple name ("<init>" for constructors)
    pub name: String,

    /// Fully qualified name, absent for locals
    pub fully_qualified_name: Option<String>,

    pub kind: SymbolKind,

    pub origin: Origin,

    /// Enclosing classifier, if this is a member
    pub parent: Option<SymbolPointer>,

    /// Declared type for variables, return type for functions
    pub type_text: Option<String>,

    /// Receiver type of an extension function or property
    pub receiver_type: Option<String>,

    /// Supertypes as written, for classifiers
    pub super_types: Vec<String>,

    /// Number of value parameters, for callables
    pub parameter_count: Option<usize>,

    /// `var` rather than `val`
    pub is_mutable: bool,

    /// Property introduced by a `val`/`var` primary constructor parameter
    pub declared_in_constructor: bool,

    /// Modifier keywords (operator, infix, data, ...)
    pub modifiers: Vec<String>,

    pub language: Language,

    pub file: PathBuf,
}

impl Symbol {
    pub fn new(
        pointer: SymbolPointer,
        name: String,
        origin: Origin,
        language: Language,
        file: PathBuf,
    ) -> Self {
        Self {
            pointer,
            declaration: NodeKey::new(pointer.file, pointer.start, pointer.end),
            name,
            fully_qualified_name: None,
            kind: pointer.kind,
            origin,
            parent: None,
            type_text: None,
            receiver_type: None,
            super_types: Vec::new(),
            parameter_count: None,
            is_mutable: false,
            declared_in_constructor: false,
            modifiers: Vec::new(),
            language,
            file,
        }
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn is_operator(&self) -> bool {
        self.has_modifier("operator")
    }

    pub fn is_extension(&self) -> bool {
        self.receiver_type.is_some()
    }

    /// Get a display string for this symbol
    pub fn display(&self) -> String {
        match &self.fully_qualified_name {
            Some(fqn) => format!("{} {}", self.kind.display_name(), fqn),
            None => format!("{} {}", self.kind.display_name(), self.name),
        }
    }
}
