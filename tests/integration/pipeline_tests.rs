//! Pipeline integration tests
//!
//! Covers the full extraction run: collection, aggregation, slicing and
//! rendering, over the fixture project and small in-memory projects.

use std::path::{Path, PathBuf};
use symbolscope::context::{build_payload, find_declaration_at_caret};
use symbolscope::report::TextRenderer;
use symbolscope::{
    extract_symbol_context, CancellationToken, Config, IndexBuilder, LogWriter, Origin, PipelineError,
    PipelineOptions, ReportFormat, Reporter, SymbolContextPayload, UsageKind,
};
use symbolscope::{IndexState, Project};

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/kotlin")
}

fn fixture_project() -> Project {
    let root = fixtures_root();
    let config = Config::from_default_locations(&root).expect("fixture config");
    let project = Project::new(&root, config);
    project.index_now().expect("fixture indexing");
    project
}

fn kotlin_file(name: &str) -> PathBuf {
    fixtures_root().join("src/main/kotlin/com/example").join(name)
}

/// Character offset of `marker` in `path`
fn caret(path: &Path, marker: &str) -> usize {
    let text = std::fs::read_to_string(path).unwrap();
    let byte = text.find(marker).expect("marker in fixture");
    text[..byte].chars().count()
}

fn extract(project: &Project, file: &Path, marker: &str, options: &PipelineOptions) -> SymbolContextPayload {
    extract_symbol_context(project, file, caret(file, marker), options, &CancellationToken::new()).unwrap()
}

fn names(payload: &SymbolContextPayload) -> Vec<String> {
    payload
        .referenced_symbols
        .iter()
        .map(|r| r.slice.simple_name.clone().unwrap_or_default())
        .collect()
}

#[test]
fn test_function_scenario_groups() {
    let project = fixture_project();
    let file = kotlin_file("Client.kt");
    let payload = extract(&project, &file, "fun foo", &PipelineOptions::default());

    let target = payload.target.as_ref().unwrap();
    assert_eq!(target.package_directive.as_deref(), Some("package com.example"));
    assert_eq!(target.imports, vec!["import lib.shout".to_string()]);
    assert_eq!(target.slice.simple_name.as_deref(), Some("foo"));
    assert_eq!(target.slice.relative_qualified_name.as_deref(), Some("Client.foo"));
    assert_eq!((target.slice.caret.line, target.slice.caret.column), (8, 5));

    assert_eq!(names(&payload), vec!["bar", "prop"]);
    assert_eq!(payload.referenced_symbols[0].usage_kinds, vec![UsageKind::Call]);
    assert_eq!(payload.referenced_symbols[1].usage_kinds, vec![UsageKind::PropertyRead]);

    let prop = &payload.referenced_symbols[1].slice;
    assert_eq!(prop.source_text, "val prop: Int = 42");
    assert_eq!(prop.qualified_name.as_deref(), Some("com.example.Holder.prop"));
    assert_eq!(prop.origin_kind, Origin::Source);
    assert!(payload.warning.is_none());
}

#[test]
fn test_supertype_scenario_single_group() {
    let project = fixture_project();
    let file = kotlin_file("Shapes.kt");
    let payload = extract(&project, &file, "class Derived", &PipelineOptions::default());

    assert_eq!(names(&payload), vec!["Base"]);
    let base = &payload.referenced_symbols[0];
    assert_eq!(base.usage_kinds, vec![UsageKind::Supertype, UsageKind::ConstructorCall]);
    assert_eq!(base.slice.source_text, "open class Base");
}

#[test]
fn test_cap_of_one_keeps_first_call() {
    let project = fixture_project();
    let file = kotlin_file("Client.kt");
    let options = PipelineOptions {
        max_usages: 1,
        ..PipelineOptions::default()
    };
    let payload = extract(&project, &file, "fun twice", &options);

    assert_eq!(names(&payload), vec!["bar"]);
}

#[test]
fn test_project_only_drops_library_symbols() {
    let project = fixture_project();
    let file = kotlin_file("Client.kt");

    let all = extract(&project, &file, "fun announce", &PipelineOptions::default());
    assert_eq!(names(&all), vec!["bar", "shout"]);
    assert_eq!(all.referenced_symbols[1].slice.origin_kind, Origin::Library);

    let options = PipelineOptions {
        project_only: true,
        ..PipelineOptions::default()
    };
    let project_only = extract(&project, &file, "fun announce", &options);
    assert_eq!(names(&project_only), vec!["bar"]);
}

#[test]
fn test_render_is_idempotent() {
    let project = fixture_project();
    let file = kotlin_file("Client.kt");
    let renderer = TextRenderer::new();

    let first = renderer.render(&extract(&project, &file, "class Client", &PipelineOptions::default()));
    let second = renderer.render(&extract(&project, &file, "class Client", &PipelineOptions::default()));

    assert_eq!(first, second);
    assert!(first.ends_with("=== END SYMBOL CONTEXT ===\n"));
}

#[test]
fn test_slices_match_file_text() {
    let project = fixture_project();
    let file = kotlin_file("Client.kt");
    let options = PipelineOptions {
        include_local_reads: true,
        ..PipelineOptions::default()
    };
    let payload = extract(&project, &file, "class Client", &options);
    assert!(!payload.referenced_symbols.is_empty());

    let target = payload.target.as_ref().unwrap();
    let slices = payload
        .referenced_symbols
        .iter()
        .map(|r| &r.slice)
        .chain(std::iter::once(&target.slice));
    for slice in slices {
        let text = std::fs::read_to_string(&slice.file_path).unwrap();
        let spanned: String = text
            .chars()
            .skip(slice.caret.offset as usize)
            .take(slice.source_text.chars().count())
            .collect();
        assert_eq!(spanned, slice.source_text);
    }
}

#[test]
fn test_nested_declarations_are_not_repeated() {
    let source = r#"package app

class Outer {
    fun inner() {}
}

fun use(o: Outer) {
    o.inner()
}
"#;
    let project = Project::from_sources(
        Path::new("/p"),
        Config::default(),
        vec![(PathBuf::from("/p/Use.kt"), source.to_string())],
    );
    let offset = source.find("fun use").unwrap();
    let payload = extract_symbol_context(
        &project,
        Path::new("/p/Use.kt"),
        offset,
        &PipelineOptions::default(),
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(names(&payload), vec!["Outer"]);
    assert_eq!(payload.referenced_symbols[0].usage_kinds, vec![UsageKind::TypeReference]);
}

#[test]
fn test_detached_target_has_sentinel_caret() {
    let project = fixture_project();
    let index = project.read();
    let unit = index.unit_for_path(&kotlin_file("Client.kt")).unwrap();
    let (detached, _) = IndexBuilder::new(project.config(), project.root())
        .parse_unit(unit.id, &unit.path, unit.text.clone())
        .unwrap();
    let detached = detached.detached();

    let offset = detached.text.find("fun foo").unwrap();
    let node = find_declaration_at_caret(&detached, offset).unwrap();
    let payload = build_payload(
        &index,
        &detached,
        node,
        &PipelineOptions::default(),
        &CancellationToken::new(),
    )
    .unwrap();

    let target = payload.target.unwrap();
    assert_eq!((target.slice.caret.line, target.slice.caret.column), (-1, -1));
    assert!(target.slice.source_text.starts_with("fun foo(): Int {"));
    assert_eq!(payload.referenced_symbols.len(), 2);
}

#[test]
fn test_index_not_ready_short_circuits() {
    let root = fixtures_root();
    let project = Project::new(&root, Config::default());
    assert_eq!(project.index_state(), IndexState::Pending);

    let file = kotlin_file("Client.kt");
    let payload = extract(&project, &file, "fun foo", &PipelineOptions::default());

    assert!(payload.target.is_none());
    assert!(payload.referenced_symbols.is_empty());
    assert!(payload.warning.is_some());
}

#[test]
fn test_cancelled_run_writes_no_log() {
    let project = fixture_project();
    let file = kotlin_file("Client.kt");
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("context.log");
    let reporter = Reporter::new(ReportFormat::Text, Some(LogWriter::new(&log_path)));

    let token = CancellationToken::new();
    token.cancel();
    let result = extract_symbol_context(
        &project,
        &file,
        caret(&file, "class Client"),
        &PipelineOptions::default(),
        &token,
    );

    match result {
        Ok(payload) => {
            reporter.emit(&payload).unwrap();
            panic!("cancelled run produced a payload");
        }
        Err(e) => assert_eq!(e, PipelineError::Cancelled),
    }
    assert!(!log_path.exists());
}

#[test]
fn test_precondition_errors() {
    let project = fixture_project();
    let options = PipelineOptions::default();
    let token = CancellationToken::new();
    let client = kotlin_file("Client.kt");

    let on_package = extract_symbol_context(&project, &client, 0, &options, &token);
    assert_eq!(on_package, Err(PipelineError::NoDeclarationAtCaret));

    let java = kotlin_file("Notes.java");
    assert!(matches!(
        extract_symbol_context(&project, &java, 0, &options, &token),
        Err(PipelineError::UnsupportedLanguage(_))
    ));

    let outside = fixtures_root().join("Missing.kt");
    assert!(matches!(
        extract_symbol_context(&project, &outside, 0, &options, &token),
        Err(PipelineError::FileNotIndexed(_))
    ));

    assert!(matches!(
        extract_symbol_context(&project, &client, 1_000_000, &options, &token),
        Err(PipelineError::CaretOutOfRange { .. })
    ));
}
