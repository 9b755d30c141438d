use super::{FileId, NodeKey, Symbol, SymbolPointer};
use crate::parser::SourceUnit;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Every parsed unit of a project plus the declarations they introduce
#[derive(Debug, Default)]
pub struct SymbolIndex {
    units: Vec<Arc<SourceUnit>>,
    symbols: Vec<Symbol>,

    by_pointer: HashMap<SymbolPointer, usize>,
    by_declaration: HashMap<NodeKey, Vec<usize>>,
    by_fqn: HashMap<String, Vec<usize>>,
    by_name: HashMap<String, Vec<usize>>,
    children: HashMap<SymbolPointer, Vec<usize>>,
    top_level: HashMap<FileId, Vec<usize>>,
    by_path: HashMap<PathBuf, FileId>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from units whose ids equal their position in `units`
    pub fn from_parts(units: Vec<Arc<SourceUnit>>, symbols: Vec<Symbol>) -> Self {
        let mut index = Self {
            units,
            symbols,
            ..Self::default()
        };
        index.reindex();
        index
    }

    fn reindex(&mut self) {
        self.by_pointer.clear();
        self.by_declaration.clear();
        self.by_fqn.clear();
        self.by_name.clear();
        self.children.clear();
        self.top_level.clear();
        self.by_path = self
            .units
            .iter()
            .map(|unit| (unit.path.clone(), unit.id))
            .collect();

        for (idx, symbol) in self.symbols.iter().enumerate() {
            self.by_pointer.insert(symbol.pointer, idx);
            self.by_declaration
                .entry(symbol.declaration)
                .or_default()
                .push(idx);
            if let Some(fqn) = &symbol.fully_qualified_name {
                self.by_fqn.entry(fqn.clone()).or_default().push(idx);
            }
            self.by_name.entry(symbol.name.clone()).or_default().push(idx);
            match symbol.parent {
                Some(parent) => self.children.entry(parent).or_default().push(idx),
                None => self.top_level.entry(symbol.pointer.file).or_default().push(idx),
            }
        }
    }

    /// Swap in a re-parsed unit and its declarations
    pub fn replace_unit(&mut self, unit: SourceUnit, symbols: Vec<Symbol>) {
        let id = unit.id;
        self.symbols.retain(|s| s.pointer.file != id);
        self.symbols.extend(symbols);

        let slot = id.0 as usize;
        if slot < self.units.len() {
            self.units[slot] = Arc::new(unit);
        } else {
            self.units.push(Arc::new(unit));
        }
        self.reindex();
    }

    /// Id the next added unit must use
    pub fn next_file_id(&self) -> FileId {
        FileId(self.units.len() as u32)
    }

    pub fn units(&self) -> &[Arc<SourceUnit>] {
        &self.units
    }

    pub fn unit(&self, id: FileId) -> Option<&Arc<SourceUnit>> {
        self.units.get(id.0 as usize)
    }

    pub fn unit_for_path(&self, path: &Path) -> Option<&Arc<SourceUnit>> {
        let id = self.by_path.get(path)?;
        self.unit(*id)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn symbol(&self, pointer: &SymbolPointer) -> Option<&Symbol> {
        self.by_pointer.get(pointer).map(|&idx| &self.symbols[idx])
    }

    /// Symbols declared by a declaration node
    pub fn symbols_at(&self, key: &NodeKey) -> Vec<&Symbol> {
        self.collect(self.by_declaration.get(key))
    }

    /// The classifier declared by a class-like node
    pub fn classifier_at(&self, key: &NodeKey) -> Option<&Symbol> {
        self.symbols_at(key)
            .into_iter()
            .find(|s| s.kind.is_classifier())
    }

    pub fn find_by_fqn(&self, fqn: &str) -> Vec<&Symbol> {
        self.collect(self.by_fqn.get(fqn))
    }

    pub fn find_by_name(&self, name: &str) -> Vec<&Symbol> {
        self.collect(self.by_name.get(name))
    }

    /// Direct members of a classifier
    pub fn members_of(&self, parent: &SymbolPointer) -> Vec<&Symbol> {
        self.collect(self.children.get(parent))
    }

    pub fn top_level_in_file(&self, file: FileId) -> Vec<&Symbol> {
        self.collect(self.top_level.get(&file))
    }

    /// A source-code declaration standing for a compiled one
    pub fn find_source_equivalent(&self, symbol: &Symbol) -> Option<&Symbol> {
        let fqn = symbol.fully_qualified_name.as_ref()?;
        self.find_by_fqn(fqn).into_iter().find(|candidate| {
            candidate.kind == symbol.kind
                && candidate.parameter_count == symbol.parameter_count
                && self
                    .unit(candidate.pointer.file)
                    .map(|unit| !unit.compiled)
                    .unwrap_or(false)
        })
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<&Symbol> {
        indices
            .map(|indices| indices.iter().map(|&idx| &self.symbols[idx]).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{KotlinParser, Parser};
    use crate::symbol::{Language, Origin, SymbolKind};

    fn unit(id: u32, path: &str, source: &str, compiled: bool) -> (SourceUnit, Vec<Symbol>) {
        let parser = KotlinParser::new();
        let parsed = parser.parse(Path::new(path), source).unwrap();
        let origin = if compiled { Origin::Library } else { Origin::Source };
        let unit = SourceUnit::new(
            FileId(id),
            PathBuf::from(path),
            source.to_string(),
            parsed,
            Language::Kotlin,
            origin,
        )
        .with_compiled(compiled);
        let symbols = parser.extract_symbols(&unit);
        (unit, symbols)
    }

    fn index(files: Vec<(SourceUnit, Vec<Symbol>)>) -> SymbolIndex {
        let mut units = Vec::new();
        let mut symbols = Vec::new();
        for (unit, unit_symbols) in files {
            units.push(Arc::new(unit));
            symbols.extend(unit_symbols);
        }
        SymbolIndex::from_parts(units, symbols)
    }

    #[test]
    fn test_lookup_tables() {
        let index = index(vec![unit(
            0,
            "a.kt",
            "package p\n\nclass Box {\n    fun fill() {}\n}\n\nfun fill() {}\n",
            false,
        )]);

        assert_eq!(index.find_by_name("fill").len(), 2);
        let class = index
            .find_by_fqn("p.Box")
            .into_iter()
            .find(|s| s.kind.is_classifier())
            .unwrap();
        let members = index.members_of(&class.pointer);
        assert!(members.iter().any(|m| m.name == "fill"));
        assert!(members.iter().any(|m| m.kind == SymbolKind::Constructor));

        let top: Vec<_> = index
            .top_level_in_file(FileId(0))
            .into_iter()
            .map(|s| s.name.clone())
            .collect();
        assert_eq!(top, vec!["Box".to_string(), "fill".to_string()]);

        assert!(index.unit_for_path(Path::new("a.kt")).is_some());
    }

    #[test]
    fn test_source_equivalent_skips_compiled_units() {
        let index = index(vec![
            unit(0, "stub/Lib.kt", "package lib\n\nclass Lib\n", true),
            unit(1, "src/Lib.kt", "package lib\n\nclass Lib {\n    val extra = 1\n}\n", false),
        ]);

        let compiled = index
            .find_by_fqn("lib.Lib")
            .into_iter()
            .find(|s| s.pointer.file == FileId(0) && s.kind.is_classifier())
            .unwrap();
        let source = index.find_source_equivalent(compiled).unwrap();
        assert_eq!(source.pointer.file, FileId(1));
    }

    #[test]
    fn test_replace_unit_drops_stale_symbols() {
        let mut index = index(vec![unit(0, "a.kt", "fun first() {}\n", false)]);
        let (replacement, symbols) = unit(0, "a.kt", "fun second() {}\n", false);
        index.replace_unit(replacement, symbols);

        assert!(index.find_by_name("first").is_empty());
        assert_eq!(index.find_by_name("second").len(), 1);
        assert_eq!(index.units().len(), 1);
    }
}
