//! Collector integration tests
//!
//! Runs the usage collector over declarations of the fixture project and
//! checks the recorded usages, their order and the cap.

use std::path::PathBuf;
use symbolscope::analysis::open_session;
use symbolscope::context::{find_declaration_at_caret, ResolvedUsage, UsageCollector, UsageKind};
use symbolscope::{CancellationToken, Config, PipelineError, Project};

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

/// Collect usages of the declaration starting at `marker` in `file`
fn collect_at(
    project: &Project,
    file: &str,
    marker: &str,
    max_usages: usize,
    include_local_reads: bool,
) -> Result<Vec<ResolvedUsage>, PipelineError> {
    let index = project.read();
    let unit = index.unit_for_path(&kotlin_file(file)).expect("fixture file indexed");
    let offset = unit.text.find(marker).expect("marker in fixture");
    let node = find_declaration_at_caret(unit, offset).expect("declaration at marker");

    open_session(&index, unit, |session| {
        UsageCollector::new(session, max_usages)
            .include_local_reads(include_local_reads)
            .collect(node)
    })
}

fn summary(usages: &[ResolvedUsage]) -> Vec<(String, UsageKind)> {
    usages.iter().map(|u| (u.symbol.name.clone(), u.kind)).collect()
}

#[test]
fn test_call_then_property_read() {
    let project = fixture_project();
    let usages = collect_at(&project, "Client.kt", "fun foo", 100, false).unwrap();

    assert_eq!(
        summary(&usages),
        vec![
            ("bar".to_string(), UsageKind::Call),
            ("prop".to_string(), UsageKind::PropertyRead),
        ]
    );
}

#[test]
fn test_local_reads_follow_document_order() {
    let project = fixture_project();
    let usages = collect_at(&project, "Client.kt", "fun foo", 100, true).unwrap();

    let names: Vec<&str> = usages.iter().map(|u| u.symbol.name.as_str()).collect();
    assert_eq!(names, vec!["bar", "prop", "obj", "x"]);

    let starts: Vec<usize> = usages.iter().map(|u| u.site.start()).collect();
    assert!(starts.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn test_cap_keeps_first_call() {
    let project = fixture_project();

    let all = collect_at(&project, "Client.kt", "fun twice", 100, false).unwrap();
    assert_eq!(
        summary(&all),
        vec![
            ("bar".to_string(), UsageKind::Call),
            ("helper".to_string(), UsageKind::Call),
        ]
    );

    let capped = collect_at(&project, "Client.kt", "fun twice", 1, false).unwrap();
    assert_eq!(summary(&capped), vec![("bar".to_string(), UsageKind::Call)]);
}

#[test]
fn test_cap_is_never_exceeded() {
    let project = fixture_project();
    for max in 0..4 {
        let usages = collect_at(&project, "Client.kt", "class Client", max, true).unwrap();
        assert!(usages.len() <= max);
    }
}

#[test]
fn test_supertype_with_constructor_call() {
    let project = fixture_project();
    let usages = collect_at(&project, "Shapes.kt", "class Derived", 100, false).unwrap();

    assert_eq!(
        summary(&usages),
        vec![
            ("Base".to_string(), UsageKind::Supertype),
            ("<init>".to_string(), UsageKind::ConstructorCall),
        ]
    );
    assert_eq!(usages[0].symbol.declaration, usages[1].symbol.declaration);
}

#[test]
fn test_library_call_resolves_through_import() {
    let project = fixture_project();
    let usages = collect_at(&project, "Client.kt", "fun announce", 100, false).unwrap();

    assert_eq!(
        summary(&usages),
        vec![
            ("bar".to_string(), UsageKind::Call),
            ("shout".to_string(), UsageKind::Call),
        ]
    );
    assert_eq!(usages[1].symbol.fully_qualified_name.as_deref(), Some("lib.shout"));
}

#[test]
fn test_cancelled_collection_returns_nothing() {
    let project = fixture_project();
    let index = project.read();
    let unit = index.unit_for_path(&kotlin_file("Client.kt")).unwrap();
    let offset = unit.text.find("class Client").unwrap();
    let node = find_declaration_at_caret(unit, offset).unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let result = open_session(&index, unit, |session| {
        UsageCollector::new(session, 100)
            .with_cancellation(token.clone(), 1)
            .collect(node)
    });

    assert!(matches!(result, Err(PipelineError::Cancelled)));
}
