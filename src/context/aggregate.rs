use super::payload::ReferencedSymbol;
use super::slice::SliceBuilder;
use super::usage::{ResolvedUsage, UsageKind};
use crate::symbol::{NodeKey, Symbol, SymbolIndex};
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

struct Bucket {
    symbol: Symbol,
    kinds: IndexSet<UsageKind>,
}

/// Groups usages by declaring node, first-seen order preserved
pub struct UsageAggregator<'a> {
    index: &'a SymbolIndex,
    project_only: bool,
    target: Option<NodeKey>,
}

impl<'a> UsageAggregator<'a> {
    pub fn new(index: &'a SymbolIndex) -> Self {
        Self {
            index,
            project_only: false,
            target: None,
        }
    }

    /// Keep only declarations from files written in the project
    pub fn project_only(mut self, project_only: bool) -> Self {
        self.project_only = project_only;
        self
    }

    /// Drop declarations lying inside the analyzed declaration
    pub fn excluding(mut self, target: NodeKey) -> Self {
        self.target = Some(target);
        self
    }

    pub fn aggregate(&self, usages: &[ResolvedUsage]) -> Vec<ReferencedSymbol> {
        let mut buckets: IndexMap<NodeKey, Bucket> = IndexMap::new();
        for usage in usages {
            buckets
                .entry(usage.symbol.declaration)
                .or_insert_with(|| Bucket {
                    symbol: usage.symbol.clone(),
                    kinds: IndexSet::new(),
                })
                .kinds
                .insert(usage.kind);
        }

        if let Some(target) = self.target {
            buckets.retain(|key, _| !target.contains(key));
        }

        if self.project_only {
            buckets.retain(|key, _| {
                self.index
                    .unit(key.file)
                    .map(|unit| unit.origin.is_project_authored())
                    .unwrap_or(false)
            });
        }

        let keys: Vec<NodeKey> = buckets.keys().copied().collect();
        buckets.retain(|key, _| {
            let nested = keys.iter().any(|outer| outer.strictly_contains(key));
            if nested {
                debug!("Dropping {} nested in another referenced declaration", key);
            }
            !nested
        });

        let slices = SliceBuilder::new(self.index);
        buckets
            .into_values()
            .filter_map(|bucket| match slices.slice_for_symbol(&bucket.symbol) {
                Ok(slice) => Some(ReferencedSymbol {
                    slice,
                    usage_kinds: bucket.kinds.into_iter().collect(),
                }),
                Err(e) => {
                    warn!("Dropping {}: {}", bucket.symbol.display(), e);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::context::UsageSite;
    use crate::symbol::{FileId, IndexBuilder, SymbolKind};
    use std::path::{Path, PathBuf};

    const SOURCE: &str = r#"package app

class Outer {
    fun inner() {}

    class Nested {
        fun deep() {}
    }
}

fun top() {}
"#;

    fn index() -> SymbolIndex {
        let mut config = Config::default();
        config.library_roots = vec![PathBuf::from("libs")];
        IndexBuilder::new(&config, Path::new("/p")).build_from_sources(vec![
            (PathBuf::from("/p/src/App.kt"), SOURCE.to_string()),
            (PathBuf::from("/p/libs/Lib.kt"), "package lib\n\nfun external(): Int\n".to_string()),
        ])
    }

    fn usage(index: &SymbolIndex, name: &str, kind: UsageKind, at: usize) -> ResolvedUsage {
        let symbol = index
            .find_by_name(name)
            .into_iter()
            .find(|s| s.kind != SymbolKind::Constructor)
            .unwrap()
            .clone();
        ResolvedUsage::new(
            symbol,
            kind,
            UsageSite {
                key: NodeKey::new(FileId(0), at, at + 1),
                node_kind: "call_expression",
            },
        )
    }

    fn names(referenced: &[ReferencedSymbol]) -> Vec<String> {
        referenced
            .iter()
            .map(|r| r.slice.simple_name.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_groups_by_declaration_in_first_seen_order() {
        let index = index();
        let usages = vec![
            usage(&index, "top", UsageKind::Call, 1),
            usage(&index, "external", UsageKind::Call, 2),
            usage(&index, "top", UsageKind::ExtensionReceiver, 3),
            usage(&index, "top", UsageKind::Call, 4),
        ];
        let referenced = UsageAggregator::new(&index).aggregate(&usages);

        assert_eq!(names(&referenced), vec!["top", "external"]);
        assert_eq!(
            referenced[0].usage_kinds,
            vec![UsageKind::Call, UsageKind::ExtensionReceiver]
        );
    }

    #[test]
    fn test_nested_declarations_collapse_into_enclosing() {
        let index = index();
        let usages = vec![
            usage(&index, "deep", UsageKind::Call, 1),
            usage(&index, "Outer", UsageKind::TypeReference, 2),
            usage(&index, "inner", UsageKind::Call, 3),
            usage(&index, "top", UsageKind::Call, 4),
        ];
        let referenced = UsageAggregator::new(&index).aggregate(&usages);

        assert_eq!(names(&referenced), vec!["Outer", "top"]);
        assert_eq!(referenced[0].usage_kinds, vec![UsageKind::TypeReference]);
    }

    #[test]
    fn test_project_only_drops_library_declarations() {
        let index = index();
        let usages = vec![
            usage(&index, "external", UsageKind::Call, 1),
            usage(&index, "top", UsageKind::Call, 2),
        ];

        let all = UsageAggregator::new(&index).aggregate(&usages);
        assert_eq!(names(&all), vec!["external", "top"]);

        let project = UsageAggregator::new(&index).project_only(true).aggregate(&usages);
        assert_eq!(names(&project), vec!["top"]);
    }

    #[test]
    fn test_target_and_its_members_are_excluded() {
        let index = index();
        let outer = index
            .find_by_name("Outer")
            .into_iter()
            .find(|s| s.kind.is_classifier())
            .unwrap()
            .declaration;
        let usages = vec![
            usage(&index, "inner", UsageKind::Call, 1),
            usage(&index, "top", UsageKind::Call, 2),
        ];
        let referenced = UsageAggregator::new(&index).excluding(outer).aggregate(&usages);

        assert_eq!(names(&referenced), vec!["top"]);
    }

    #[test]
    fn test_identical_input_gives_identical_output() {
        let index = index();
        let usages = vec![
            usage(&index, "Nested", UsageKind::TypeReference, 1),
            usage(&index, "external", UsageKind::Call, 2),
            usage(&index, "top", UsageKind::Call, 3),
        ];
        let first = UsageAggregator::new(&index).aggregate(&usages);
        let second = UsageAggregator::new(&index).aggregate(&usages);
        assert_eq!(first, second);
    }
}
