//! File round trips and source discovery

use super::*;
use lexonto_core::{Entry, PathTrie};
use tempfile::tempdir;

const LEGEND: [&str; 5] = ["lemma", "POS", "level", "freq", "origin"];

fn e(fields: &[&str]) -> Entry {
    fields.iter().map(|s| s.to_string()).collect()
}

fn sample_view() -> OntologyView {
    let mut trie = PathTrie::with_legend(&LEGEND);
    trie.insert(&["noun", "common"], Some(e(&["ཁྱི", "N", "1", "5", "A1:5"])))
        .unwrap();
    trie.insert(&["noun", "proper"], None).unwrap();
    trie.insert(&["verb"], Some(e(&["འགྲོ", "V", "2", "9", "A1:4 — B2:5"])))
        .unwrap();
    OntologyView::new(trie)
}

fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, "legend: [lemma]\nont: {}\n").unwrap();
}

#[test]
fn test_yaml_round_trip_keeps_source() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("A1_words.yaml");
    let view = sample_view();

    save_view(&view, &path).unwrap();
    let back = load_view(&path).unwrap();

    assert_eq!(back.to_nested().unwrap(), view.to_nested().unwrap());
    assert_eq!(back.source(), Some(path.as_path()));
    assert_eq!(back.source_id().as_deref(), Some("A1"));
}

#[test]
fn test_xlsx_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("onto.xlsx");
    let view = sample_view();

    save_view(&view, &path).unwrap();
    let back = load_view(&path).unwrap();

    assert_eq!(back.legend(), LEGEND);
    assert_eq!(back.to_nested().unwrap(), view.to_nested().unwrap());
}

#[test]
fn test_unsupported_extension_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("onto.txt");
    std::fs::write(&path, "legend: []").unwrap();

    let err = load_view(&path).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<OntoError>(),
        Some(OntoError::UnsupportedExtension { .. })
    ));
    assert!(save_view(&sample_view(), &path).is_err());
}

#[test]
fn test_output_paths() {
    let view = sample_view().with_source("/data/onto/A1_words.yaml");
    assert_eq!(
        output_path(&view, None, FileFormat::Xlsx),
        PathBuf::from("/data/onto/A1_words.xlsx")
    );
    assert_eq!(
        output_path(&view, Some(Path::new("/tmp/out")), FileFormat::Yaml),
        PathBuf::from("/tmp/out/A1_words.yaml")
    );
    assert_eq!(
        output_path(&view, Some(Path::new("/tmp/x.xlsx")), FileFormat::Yaml),
        PathBuf::from("/tmp/x.xlsx")
    );
    assert_eq!(
        updated_path(Path::new("/data/onto/A1_words.yaml")),
        PathBuf::from("/data/onto/A1_words_updated.yaml")
    );
}

#[test]
fn test_partial_config_files_keep_defaults() {
    let dir = tempdir().unwrap();
    let yaml = dir.path().join("lexonto.yaml");
    std::fs::write(&yaml, "unfiled_bucket: inbox\n").unwrap();
    let config = load_config(&yaml).unwrap();
    assert_eq!(config.unfiled_bucket, "inbox");
    assert_eq!(config.delimiter, ReconcileConfig::default().delimiter);

    let json = dir.path().join("lexonto.json");
    std::fs::write(&json, r#"{"ignore_fields": ["freq"]}"#).unwrap();
    let config = load_config(&json).unwrap();
    assert_eq!(config.ignore_fields, vec!["freq".to_string()]);
    assert_eq!(config.origin_field, "origin");
}

#[test]
fn test_legend_template_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("adjust_legends.yaml");
    let mut view = sample_view();

    write_legend_template(&view, &path).unwrap();
    let adjustment = read_legend_adjustment(&path).unwrap();
    assert!(adjustment.is_unchanged());
    assert_eq!(adjustment.legend_orig, view.legend());

    std::fs::write(
        &path,
        "legend_orig: [lemma, POS, level, freq, origin]\n\
         legend_new: [lemma, POS, origin]\n\
         replacements: [[origin, sources]]\n",
    )
    .unwrap();
    let adjustment = read_legend_adjustment(&path).unwrap();
    view.apply_legend_adjustment(&adjustment);
    assert_eq!(view.legend(), ["lemma", "POS", "sources"]);
    assert_eq!(view.find_word("ཁྱི")[0].1[0], e(&["ཁྱི", "N", "A1:5"]));
}

#[test]
fn test_discover_sources_routes_levels() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let master = root.join("master.yaml");
    touch(&master);
    touch(&root.join("B2_list.yaml"));
    touch(&root.join("A").join("A1_words.yaml"));
    touch(&root.join("A").join("A.yaml"));
    touch(&root.join("A").join("A1_words_updated.yaml"));
    touch(&root.join("notes.txt"));

    let layout = discover_sources(&master).unwrap();

    let sources: Vec<&str> = layout.plan.sources().collect();
    assert_eq!(sources, vec!["A1", "B2"]);
    assert_eq!(layout.plan.level_of("A1"), Some("A"));
    assert_eq!(layout.plan.level_of("B2"), None);
    assert_eq!(layout.level_path("A"), root.join("A").join("A.yaml"));
    assert_eq!(layout.source_path("A1"), root.join("A").join("A1_words.yaml"));
    assert_eq!(layout.level_path("C"), root.join("C").join("C.yaml"));
}

#[test]
fn test_list_ontologies_is_sorted_and_shallow() {
    let dir = tempdir().unwrap();
    touch(&dir.path().join("b.yaml"));
    touch(&dir.path().join("a.yaml"));
    touch(&dir.path().join("sub").join("c.yaml"));
    std::fs::write(dir.path().join("readme.md"), "").unwrap();

    let found = list_ontologies(dir.path()).unwrap();
    let names: Vec<String> = found
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.yaml", "b.yaml"]);
}
