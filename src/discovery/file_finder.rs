use crate::config::Config;
use crate::symbol::Language;
use ignore::WalkBuilder;
use miette::{IntoDiagnostic, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Type of source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Kotlin,
    Java,
}

impl FileType {
    /// Determine file type from path
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "kt" | "kts" => Some(FileType::Kotlin),
            "java" => Some(FileType::Java),
            _ => None,
        }
    }

    pub fn language(&self) -> Language {
        match self {
            FileType::Kotlin => Language::Kotlin,
            FileType::Java => Language::Java,
        }
    }
}

/// Represents a discovered source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path to the file
    pub path: PathBuf,

    pub file_type: FileType,
}

impl SourceFile {
    pub fn new(path: PathBuf, file_type: FileType) -> Self {
        Self { path, file_type }
    }

    pub fn read_contents(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).into_diagnostic()
    }
}

/// File finder for discovering source files in a project
pub struct FileFinder<'a> {
    config: &'a Config,
}

impl<'a> FileFinder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Find all Kotlin and Java files under the project's targets and library roots
    pub fn find_files(&self, root: &Path) -> Result<Vec<SourceFile>> {
        debug!("Scanning for files in: {}", root.display());

        let mut targets: Vec<PathBuf> = if self.config.targets.is_empty() {
            vec![root.to_path_buf()]
        } else {
            self.config.targets.iter().map(|t| root.join(t)).collect()
        };
        targets.extend(self.config.library_dirs(root));

        let mut files: Vec<SourceFile> = targets
            .par_iter()
            .flat_map(|target| self.scan_directory(target))
            .collect();

        // Library roots may sit inside a target
        let mut seen = HashSet::new();
        files.retain(|f| seen.insert(f.path.clone()));
        files.sort_by(|a, b| a.path.cmp(&b.path));

        debug!("Found {} files", files.len());
        Ok(files)
    }

    /// Scan a single directory for source files
    fn scan_directory(&self, dir: &Path) -> Vec<SourceFile> {
        if !dir.exists() {
            trace!("Directory does not exist: {}", dir.display());
            return Vec::new();
        }

        // gitignore aware, hidden entries and symlinks skipped
        let walker = WalkBuilder::new(dir)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .parents(true)
            .follow_links(false)
            .build();

        walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let path = entry.path();

                if self.config.should_exclude(path) {
                    trace!("Excluding: {}", path.display());
                    return None;
                }

                let file_type = FileType::from_path(path)?;

                trace!("Found {:?}: {}", file_type, path.display());
                Some(SourceFile::new(path.to_path_buf(), file_type))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_path() {
        assert_eq!(FileType::from_path(Path::new("src/Main.kt")), Some(FileType::Kotlin));
        assert_eq!(FileType::from_path(Path::new("build.gradle.kts")), Some(FileType::Kotlin));
        assert_eq!(FileType::from_path(Path::new("src/Main.java")), Some(FileType::Java));
        assert_eq!(FileType::from_path(Path::new("README.md")), None);
    }

    #[test]
    fn test_find_files_respects_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let build = dir.path().join("build");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&build).unwrap();
        std::fs::write(src.join("A.kt"), "class A").unwrap();
        std::fs::write(src.join("B.java"), "class B {}").unwrap();
        std::fs::write(src.join("notes.txt"), "x").unwrap();
        std::fs::write(build.join("C.kt"), "class C").unwrap();

        let config = Config::default();
        let files = FileFinder::new(&config).find_files(dir.path()).unwrap();

        let names: Vec<_> = files
            .iter()
            .filter_map(|f| f.path.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect();
        assert_eq!(names, vec!["A.kt", "B.java"]);
    }
}
