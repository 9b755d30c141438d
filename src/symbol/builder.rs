// Parallel index builder using rayon

use super::{FileId, Language, Origin, Symbol, SymbolIndex};
use crate::config::Config;
use crate::discovery::SourceFile;
use crate::parser::{language_for_path, parser_for, ParseResult, SourceUnit};
use miette::{Result, WrapErr};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds a `SymbolIndex` from project files
pub struct IndexBuilder<'a> {
    config: &'a Config,
    root: PathBuf,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(config: &'a Config, root: &Path) -> Self {
        Self {
            config,
            root: root.to_path_buf(),
        }
    }

    /// Read and index discovered files. Unreadable files are skipped.
    pub fn build_from_files(&self, files: &[SourceFile]) -> Result<SymbolIndex> {
        let sources: Vec<(PathBuf, String)> = files
            .par_iter()
            .filter_map(|file| match file.read_contents() {
                Ok(text) => Some((file.path.clone(), text)),
                Err(e) => {
                    warn!("Skipping unreadable file {}: {}", file.path.display(), e);
                    None
                }
            })
            .collect();
        Ok(self.build_from_sources(sources))
    }

    /// Parse in-memory sources in parallel and index them
    pub fn build_from_sources(&self, sources: Vec<(PathBuf, String)>) -> SymbolIndex {
        info!("Parsing {} files in parallel...", sources.len());

        let parsed: Vec<(PathBuf, String, Language, ParseResult)> = sources
            .into_par_iter()
            .filter_map(|(path, text)| {
                let language = language_for_path(&path)?;
                match parser_for(language).parse(&path, &text) {
                    Ok(result) => Some((path, text, language, result)),
                    Err(e) => {
                        // Parse errors never abort indexing
                        debug!("Parse error (continuing): {}", e);
                        None
                    }
                }
            })
            .collect();

        let units: Vec<SourceUnit> = parsed
            .into_iter()
            .enumerate()
            .map(|(idx, (path, text, language, result))| {
                let (origin, compiled) = self.classify_origin(&path, language);
                SourceUnit::new(FileId(idx as u32), path, text, result, language, origin)
                    .with_compiled(compiled)
            })
            .collect();

        let symbols: Vec<Symbol> = units
            .par_iter()
            .flat_map(|unit| parser_for(unit.language).extract_symbols(unit))
            .collect();

        info!("Indexed {} symbols in {} files", symbols.len(), units.len());
        SymbolIndex::from_parts(units.into_iter().map(Arc::new).collect(), symbols)
    }

    /// Parse one file for an index that already holds `id`'s slot
    pub fn parse_unit(&self, id: FileId, path: &Path, text: String) -> Result<(SourceUnit, Vec<Symbol>)> {
        let language = language_for_path(path)
            .ok_or_else(|| miette::miette!("Not a Kotlin or Java file: {}", path.display()))?;
        let parser = parser_for(language);
        let result = parser
            .parse(path, &text)
            .wrap_err_with(|| format!("Failed to parse {}", path.display()))?;
        let (origin, compiled) = self.classify_origin(path, language);
        let unit = SourceUnit::new(id, path.to_path_buf(), text, result, language, origin)
            .with_compiled(compiled);
        let symbols = parser.extract_symbols(&unit);
        Ok((unit, symbols))
    }

    /// Provenance of a file, and whether it is a compiled stub
    pub fn classify_origin(&self, path: &Path, language: Language) -> (Origin, bool) {
        let library = match language {
            Language::Kotlin => Origin::Library,
            Language::Java => Origin::JavaLibrary,
        };

        if Config::is_under(&self.config.library_roots, &self.root, path) {
            return (library, true);
        }
        if Config::is_under(&self.config.library_source_roots, &self.root, path) {
            return (library, false);
        }
        if self.config.is_generated(path) {
            return (Origin::SourceGenerated, false);
        }
        match language {
            Language::Kotlin => (Origin::Source, false),
            Language::Java => (Origin::JavaSource, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_origin() {
        let mut config = Config::default();
        config.library_roots = vec![PathBuf::from("libs")];
        config.library_source_roots = vec![PathBuf::from("lib-src")];
        let builder = IndexBuilder::new(&config, Path::new("/p"));

        assert_eq!(
            builder.classify_origin(Path::new("/p/libs/A.kt"), Language::Kotlin),
            (Origin::Library, true)
        );
        assert_eq!(
            builder.classify_origin(Path::new("/p/lib-src/A.java"), Language::Java),
            (Origin::JavaLibrary, false)
        );
        assert_eq!(
            builder.classify_origin(Path::new("/p/build/generated/A.kt"), Language::Kotlin),
            (Origin::SourceGenerated, false)
        );
        assert_eq!(
            builder.classify_origin(Path::new("/p/src/A.java"), Language::Java),
            (Origin::JavaSource, false)
        );
    }

    #[test]
    fn test_build_from_sources_skips_unknown_files() {
        let config = Config::default();
        let builder = IndexBuilder::new(&config, Path::new("/p"));
        let index = builder.build_from_sources(vec![
            (PathBuf::from("/p/a.kt"), "fun a() {}\n".to_string()),
            (PathBuf::from("/p/notes.md"), "# notes".to_string()),
            (PathBuf::from("/p/B.java"), "class B { void b() {} }".to_string()),
        ]);

        assert_eq!(index.units().len(), 2);
        assert_eq!(index.find_by_name("a").len(), 1);
        assert_eq!(index.find_by_name("b").len(), 1);
        for (idx, unit) in index.units().iter().enumerate() {
            assert_eq!(unit.id, FileId(idx as u32));
        }
    }
}
