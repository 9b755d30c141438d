use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for symbolscope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directories to index, relative to the project root (empty: the whole root)
    pub targets: Vec<PathBuf>,

    /// Patterns to exclude from indexing
    pub exclude: Vec<String>,

    /// Compiled library stubs
    pub library_roots: Vec<PathBuf>,

    /// Attached library sources
    pub library_source_roots: Vec<PathBuf>,

    /// Paths holding generated code
    pub generated_patterns: Vec<String>,

    pub collector: CollectorConfig,

    pub aggregation: AggregationConfig,

    pub report: ReportConfig,

    pub index: IndexConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Stop recording usages after this many
    pub max_usages: usize,

    /// Keep reads of parameters and local variables
    pub include_local_reads: bool,

    /// Poll for cancellation every N visited nodes
    pub cancel_check_interval: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Only report declarations written in the project
    pub project_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: text, json
    pub format: String,

    /// Append-only report log
    pub log_file: PathBuf,

    /// Print the report to stdout as well
    pub echo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// How long to wait for indexing before giving up
    pub wait_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: vec![],
            exclude: vec![
                "**/build/**".to_string(),
                "**/.gradle/**".to_string(),
                "**/.idea/**".to_string(),
            ],
            library_roots: vec![],
            library_source_roots: vec![],
            generated_patterns: vec!["**/generated/**".to_string()],
            collector: CollectorConfig::default(),
            aggregation: AggregationConfig::default(),
            report: ReportConfig::default(),
            index: IndexConfig::default(),
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_usages: 1000,
            include_local_reads: false,
            cancel_check_interval: 64,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            log_file: PathBuf::from(".symbolscope/symbol-context.log"),
            echo: true,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 30_000,
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".symbolscope.yml",
            ".symbolscope.yaml",
            ".symbolscope.toml",
            "symbolscope.yml",
            "symbolscope.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    /// Check if a pattern matches for exclusion
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude.iter().any(|pattern| glob_match(pattern, &path_str))
    }

    pub fn is_generated(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.generated_patterns
            .iter()
            .any(|pattern| glob_match(pattern, &path_str))
    }

    /// Whether `path` lies under one of `roots` (relative roots are taken from `project_root`)
    pub fn is_under(roots: &[PathBuf], project_root: &Path, path: &Path) -> bool {
        roots.iter().any(|root| {
            let root = if root.is_absolute() {
                root.clone()
            } else {
                project_root.join(root)
            };
            path.starts_with(&root)
        })
    }

    /// Library roots are searched for files too, even outside `targets`
    pub fn library_dirs(&self, project_root: &Path) -> Vec<PathBuf> {
        self.library_roots
            .iter()
            .chain(&self.library_source_roots)
            .map(|root| {
                if root.is_absolute() {
                    root.clone()
                } else {
                    project_root.join(root)
                }
            })
            .collect()
    }
}

/// Simple glob matching for patterns like "*Test" or "**/build/**"
fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern.starts_with('*') && !pattern.contains('/') {
        // "*Test.kt" matches "FooTest.kt"
        return text.ends_with(&pattern[1..]);
    }

    if pattern.ends_with('*') && !pattern.contains('/') {
        return text.starts_with(&pattern[..pattern.len() - 1]);
    }

    // Handle path patterns with **
    if pattern.contains("**") {
        if pattern.starts_with("**/") && pattern.ends_with("/**") {
            // Must match as a complete directory name, not substring
            let dir_name = pattern.replace("**/", "").replace("/**", "");
            let dir_pattern = format!("/{}/", dir_name.trim_matches('/'));
            return text.contains(&dir_pattern) || text.starts_with(&dir_pattern[1..]);
        }

        let parts: Vec<&str> = pattern.split("**").collect();
        if parts.len() == 2 {
            let prefix = parts[0].trim_end_matches('/');
            let suffix = parts[1].trim_start_matches('/');

            if prefix.is_empty() && suffix.is_empty() {
                return true;
            }

            if prefix.is_empty() {
                return text.ends_with(suffix) || text.contains(&format!("/{}", suffix));
            }

            if suffix.is_empty() {
                return text.starts_with(prefix) || text.contains(&format!("{}/", prefix));
            }

            return (text.starts_with(prefix) || text.contains(&format!("/{}/", prefix)))
                && (text.ends_with(suffix) || text.contains(&format!("/{}", suffix)));
        }
    }

    text == pattern
}
