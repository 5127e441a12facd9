//! Integration tests across the lexonto crates
//!
//! Files on disk → views → reconciliation → files on disk again:
//! - YAML sources merged into a master, saved and reloaded
//! - master decomposed back into per-source and per-level ontologies
//! - tree report and xlsx export of the result
//!
//! Run with: cargo test --test integration_tests

use std::path::Path;

use lexonto_core::{
    export_tree_report, DiffMode, MergeOptions, OntologyView, ReconcileConfig, Reconciler,
};
use lexonto_storage::{discover_sources, load_view, save_view};
use tempfile::tempdir;

const A1: &str = "\
legend: [lemma, POS, level, freq, origin]
ont:
  noun:
    common:
    - [ཁྱི, N, '1', '5', '']
  verb:
  - [འགྲོ, V, '1', '2', '']
";

const B2: &str = "\
legend: [lemma, POS, level, freq, origin]
ont:
  noun:
    common:
    - [ཁྱི, N, '2', '3', '']
    - [བྱི་ལ, N, '2', '1', '']
";

fn write(path: &Path, text: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

// ============================================================================
// Merge through files
// ============================================================================

#[test]
fn test_merge_sources_into_master_file() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(&root.join("A").join("A1_words.yaml"), A1);
    write(&root.join("B2_words.yaml"), B2);

    let a1 = load_view(&root.join("A").join("A1_words.yaml")).unwrap();
    let b2 = load_view(&root.join("B2_words.yaml")).unwrap();
    let reconciler = Reconciler::new(ReconcileConfig::default());

    let mut master = OntologyView::default();
    let report = reconciler
        .batch_merge(&mut master, [&a1, &b2], MergeOptions::default())
        .unwrap();
    assert_eq!(report.reconciled, 1);
    assert_eq!(report.added, 3);

    let master_path = root.join("master.yaml");
    save_view(&master, &master_path).unwrap();
    let reloaded = load_view(&master_path).unwrap();

    let dog = reloaded.find_word("ཁྱི");
    assert_eq!(dog.len(), 1);
    assert_eq!(dog[0].0, vec!["noun".to_string(), "common".to_string()]);
    assert_eq!(dog[0].1[0], vec!["ཁྱི", "N", "1", "8", "A1:5 — B2:3"]);

    let diff = reconciler.diff(&master, &reloaded, DiffMode::All).unwrap();
    assert!(diff.base_only.is_empty());
    assert!(diff.other_only.is_empty());
    assert_eq!(diff.shared.len(), 3);
}

// ============================================================================
// Decompose back to disk layout
// ============================================================================

#[test]
fn test_decompose_master_using_discovered_layout() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(&root.join("A").join("A1_words.yaml"), A1);
    write(&root.join("B2_words.yaml"), B2);

    let reconciler = Reconciler::new(ReconcileConfig::default());
    let mut master = OntologyView::default();
    for path in [root.join("A").join("A1_words.yaml"), root.join("B2_words.yaml")] {
        let other = load_view(&path).unwrap();
        reconciler
            .merge(&mut master, &other, MergeOptions::default())
            .unwrap();
    }
    let master_path = root.join("master.yaml");
    save_view(&master, &master_path).unwrap();

    let layout = discover_sources(&master_path).unwrap();
    assert_eq!(layout.plan.level_of("A1"), Some("A"));

    let parts = reconciler.decompose(&master, &layout.plan).unwrap();
    let a1 = &parts.sources["A1"];
    assert_eq!(a1.find_word("ཁྱི")[0].1[0], vec!["ཁྱི", "N", "1", "5", ""]);
    assert!(a1.find_word("བྱི་ལ").is_empty());

    let level_a = &parts.levels["A"];
    assert_eq!(level_a.find_word("འགྲོ")[0].1[0], vec!["འགྲོ", "V", "1", "2", "A1:2"]);

    for (level, view) in &parts.levels {
        save_view(view, &layout.level_path(level)).unwrap();
    }
    let back = load_view(&root.join("A").join("A.yaml")).unwrap();
    assert_eq!(back.list_words().len(), 2);
}

// ============================================================================
// Reports and export
// ============================================================================

#[test]
fn test_report_and_xlsx_export_of_merged_master() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(&root.join("A1_words.yaml"), A1);
    write(&root.join("B2_words.yaml"), B2);

    let reconciler = Reconciler::new(ReconcileConfig::default());
    let mut master = load_view(&root.join("A1_words.yaml")).unwrap();
    let b2 = load_view(&root.join("B2_words.yaml")).unwrap();
    reconciler
        .merge(&mut master, &b2, MergeOptions { add_origin: false, organize_unmatched: false })
        .unwrap();

    let report = export_tree_report(&master).unwrap();
    assert_eq!(report.total_words, 3);
    assert_eq!(
        report.to_string(),
        "noun\n\tcommon: 2\nverb: 1\ntotal: 3"
    );

    let xlsx = root.join("master.xlsx");
    save_view(&master, &xlsx).unwrap();
    let back = load_view(&xlsx).unwrap();
    assert_eq!(back.to_nested().unwrap(), master.to_nested().unwrap());
}
