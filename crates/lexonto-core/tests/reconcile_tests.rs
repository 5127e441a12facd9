use std::collections::BTreeMap;

use lexonto_core::provenance::parse_freq;
use lexonto_core::{
    DecompositionPlan, DiffMode, Entry, MergeOptions, OntoError, OntologyView, PathTrie, Reconciler,
};

const LEGEND: [&str; 5] = ["lemma", "POS", "level", "freq", "origin"];

fn e(fields: &[&str]) -> Entry {
    fields.iter().map(|s| s.to_string()).collect()
}

fn view(name: &str, legend: &[&str], items: &[(&[&str], &[&str])]) -> OntologyView {
    let mut trie = PathTrie::with_legend(legend);
    for (path, entry) in items {
        trie.insert(path, Some(e(entry))).expect("insert");
    }
    OntologyView::new(trie).with_name(name)
}

fn keep_origins() -> MergeOptions {
    MergeOptions {
        add_origin: false,
        organize_unmatched: false,
    }
}

fn freq_per_lemma(view: &OntologyView) -> BTreeMap<String, i64> {
    let mut out = BTreeMap::new();
    for (_, entry) in view.flat_entries() {
        *out.entry(entry[0].clone()).or_insert(0) += parse_freq(&entry[3]);
    }
    out
}

#[test]
fn dog_from_two_sources_becomes_one_entry() {
    let mut base = view(
        "src1",
        &LEGEND,
        &[(&["noun", "common"], &["dog", "N", "1", "5", "src1:5"])],
    );
    let other = view(
        "src2",
        &LEGEND,
        &[(&["noun", "common"], &["dog", "N", "1", "3", "src2:3"])],
    );

    let report = Reconciler::default()
        .merge(&mut base, &other, keep_origins())
        .expect("merge");
    assert_eq!(report.reconciled, 1);

    let found = base.find_entries(&["noun", "common"], Some("dog"));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].1, vec![e(&["dog", "N", "1", "8", "src1:5 — src2:3"])]);
}

#[test]
fn add_origin_credits_the_other_source() {
    let mut base = view(
        "src1",
        &LEGEND,
        &[(&["noun", "common"], &["dog", "N", "1", "5", "src1:5"])],
    );
    let other = view(
        "src2",
        &LEGEND,
        &[(&["noun", "common"], &["dog", "N", "1", "3", "whatever:9"])],
    );
    Reconciler::default()
        .merge(&mut base, &other, MergeOptions::default())
        .expect("merge");
    let found = base.find_word("dog");
    assert_eq!(found[0].1[0][4], "src1:5 — src2:3");
}

#[test]
fn reordered_legend_is_rejected_and_base_untouched() {
    let mut base = view("a", &["lemma", "POS"], &[(&["noun"], &["dog", "N"])]);
    let before = base.trie().clone();
    let other = view("b", &["POS", "lemma"], &[(&["noun"], &["N", "cat"])]);

    let err = Reconciler::default()
        .merge(&mut base, &other, keep_origins())
        .unwrap_err();
    assert!(matches!(err, OntoError::LegendMismatch { .. }));
    assert_eq!(base.trie(), &before);
}

#[test]
fn empty_base_adopts_the_other_legend() {
    let mut base = OntologyView::new(PathTrie::new());
    let other = view("X", &LEGEND, &[(&["verb"], &["go", "V", "1", "2", ""])]);
    Reconciler::default()
        .merge(&mut base, &other, MergeOptions::default())
        .expect("merge");
    assert_eq!(base.legend(), LEGEND);
    assert_eq!(base.list_words(), vec!["go".to_string()]);
}

#[test]
fn non_numeric_frequency_is_treated_as_zero() {
    let mut base = view("A", &LEGEND, &[(&["noun"], &["dog", "N", "1", "lots", "A:0"])]);
    let other = view("B", &LEGEND, &[(&["noun"], &["dog", "N", "1", "3", "B:3"])]);
    Reconciler::default()
        .merge(&mut base, &other, keep_origins())
        .expect("merge");
    assert_eq!(base.find_word("dog")[0].1[0][3], "3");
}

#[test]
fn missing_cat_yields_nothing() {
    let base = view("A", &LEGEND, &[(&["noun", "common"], &["dog", "N", "1", "5", "A:5"])]);
    assert!(base.find_entries(&["noun", "common"], Some("cat")).is_empty());
}

#[test]
fn diff_is_symmetric() {
    let a = view(
        "A",
        &LEGEND,
        &[
            (&["noun"], &["dog", "N", "1", "5", "A:5"]),
            (&["noun"], &["cat", "N", "1", "1", "A:1"]),
        ],
    );
    let b = view(
        "B",
        &LEGEND,
        &[
            (&["noun"], &["dog", "N", "1", "2", "B:2"]),
            (&["verb"], &["go", "V", "2", "1", "B:1"]),
        ],
    );
    let r = Reconciler::default();
    let ab = r.diff(&a, &b, DiffMode::BaseOnly).expect("diff");
    let ba = r.diff(&b, &a, DiffMode::OtherOnly).expect("diff");
    assert_eq!(ab.base_only, ba.other_only);
    assert_eq!(ab.base_only.len(), 1);
    assert_eq!(ab.base_only[0].1[0], "cat");
    assert!(ab.shared.is_empty() && ab.other_only.is_empty());

    let all = r.diff(&a, &b, DiffMode::All).expect("diff");
    assert_eq!(all.shared.len(), 1);
    assert_eq!(all.shared[0].0 .1[3], "5");
    assert_eq!(all.shared[0].1 .1[3], "2");
}

#[test]
fn diff_relays_a_reordered_legend() {
    let a = view("A", &["lemma", "POS", "freq"], &[(&["noun"], &["dog", "N", "5"])]);
    let b = view("B", &["POS", "lemma", "freq"], &[(&["noun"], &["N", "dog", "1"])]);
    let d = Reconciler::default().diff(&a, &b, DiffMode::All).expect("diff");
    assert_eq!(d.shared.len(), 1);
    assert!(d.base_only.is_empty() && d.other_only.is_empty());
}

#[test]
fn diff_requires_the_same_fields() {
    let a = view("A", &["lemma", "POS"], &[]);
    let b = view("B", &["lemma", "level"], &[]);
    assert!(matches!(
        Reconciler::default().diff(&a, &b, DiffMode::All),
        Err(OntoError::LegendMismatch { .. })
    ));
}

#[test]
fn merge_order_does_not_change_frequencies() {
    let x = view(
        "X",
        &LEGEND,
        &[
            (&["noun"], &["dog", "N", "1", "2", ""]),
            (&["verb"], &["go", "V", "1", "4", ""]),
        ],
    );
    let y = view(
        "Y",
        &LEGEND,
        &[
            (&["noun"], &["dog", "N", "2", "3", ""]),
            (&["noun"], &["cat", "N", "1", "1", ""]),
        ],
    );
    let r = Reconciler::default();

    let mut xy = OntologyView::new(PathTrie::new());
    r.batch_merge(&mut xy, [&x, &y], MergeOptions::default()).expect("merge");
    let mut yx = OntologyView::new(PathTrie::new());
    r.batch_merge(&mut yx, [&y, &x], MergeOptions::default()).expect("merge");

    assert_eq!(freq_per_lemma(&xy), freq_per_lemma(&yx));
    assert_eq!(xy.find_word("dog")[0].1, yx.find_word("dog")[0].1);
    assert_eq!(xy.find_word("dog")[0].1[0], e(&["dog", "N", "1", "5", "X:2 — Y:3"]));
}

#[test]
fn decompose_splits_provenance_by_source_and_level() {
    let master = view(
        "master",
        &LEGEND,
        &[
            (&["noun"], &["dog", "N", "1", "5", "A1:2 — B1:3"]),
            (&["verb"], &["go", "V", "2", "7", "A1:1 — C:6"]),
        ],
    );
    let plan = DecompositionPlan::new()
        .route("A1", Some("A"))
        .route("B1", Some("A"))
        .route("C", None);

    let out = Reconciler::default().decompose(&master, &plan).expect("decompose");
    assert_eq!(out.sources.len(), 3);
    assert_eq!(out.levels.len(), 1);

    let a1 = &out.sources["A1"];
    assert_eq!(a1.find_word("dog")[0].1, vec![e(&["dog", "N", "1", "2", ""])]);
    assert_eq!(a1.find_word("go")[0].1, vec![e(&["go", "V", "2", "1", ""])]);
    assert!(out.sources["B1"].find_word("go").is_empty());
    assert_eq!(out.sources["C"].find_word("go")[0].1[0][3], "6");

    let level_a = &out.levels["A"];
    assert_eq!(
        level_a.find_word("dog")[0].1,
        vec![e(&["dog", "N", "1", "5", "A1:2 — B1:3"])]
    );
    assert_eq!(level_a.find_word("go")[0].1, vec![e(&["go", "V", "2", "1", "A1:1"])]);
}

#[test]
fn decompose_then_merge_restores_provenance() {
    let master = view(
        "master",
        &LEGEND,
        &[
            (&["noun"], &["dog", "N", "1", "5", "A1:2 — B1:3"]),
            (&["verb"], &["go", "V", "2", "7", "A1:1 — C:6"]),
        ],
    );
    let plan = DecompositionPlan::new()
        .route("A1", None)
        .route("B1", None)
        .route("C", None);
    let r = Reconciler::default();
    let out = r.decompose(&master, &plan).expect("decompose");

    let mut rebuilt = OntologyView::new(PathTrie::new());
    r.batch_merge(&mut rebuilt, out.sources.values(), MergeOptions::default())
        .expect("merge");
    assert_eq!(rebuilt.flat_entries(), master.flat_entries());
}

#[test]
fn decompose_skips_unplanned_sources() {
    let master = view("m", &LEGEND, &[(&["noun"], &["dog", "N", "1", "5", "Z:5"])]);
    let plan = DecompositionPlan::new().route("A", None);
    let out = Reconciler::default().decompose(&master, &plan).expect("decompose");
    assert!(out.sources["A"].trie().export_all_entries().is_empty());
}
