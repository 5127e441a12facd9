use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn lexonto_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lexonto"))
}

fn run(args: &[&str], cwd: &Path) -> String {
    let output = Command::new(lexonto_bin())
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("run lexonto");
    assert!(
        output.status.success(),
        "lexonto {:?} failed:\n{}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

const A1: &str = "\
legend: [lemma, POS, level, freq, origin]
ont:
  noun:
    common:
    - [dog, N, '1', '5', '']
";

const B2: &str = "\
legend: [lemma, POS, level, freq, origin]
ont:
  noun:
    common:
    - [dog, N, '1', '3', '']
    - [cat, N, '2', '1', '']
";

#[test]
fn merge_then_recompose() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    fs::create_dir_all(root.join("A")).expect("mkdir");
    fs::write(root.join("A").join("A1_list.yaml"), A1).expect("write");
    fs::write(root.join("B2_list.yaml"), B2).expect("write");

    run(
        &["merge", "master.yaml", "A/A1_list.yaml", "B2_list.yaml"],
        root,
    );
    let master = fs::read_to_string(root.join("master.yaml")).expect("read master");
    assert!(master.contains("- [dog, N, '1', '8', 'A1:5 — B2:3']"), "{master}");
    assert!(master.contains("- [cat, N, '2', '1', 'B2:1']"), "{master}");

    run(&["recompose", "master.yaml"], root);
    let a1 = fs::read_to_string(root.join("A").join("A1_list_updated.yaml")).expect("read A1");
    assert!(a1.contains("- [dog, N, '1', '5', '']"), "{a1}");
    let level = fs::read_to_string(root.join("A").join("A_updated.yaml")).expect("read level");
    assert!(level.contains("- [dog, N, '1', '5', 'A1:5']"), "{level}");
}

#[test]
fn diff_as_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    fs::write(root.join("a.yaml"), A1).expect("write");
    fs::write(root.join("b.yaml"), B2).expect("write");

    let out = run(&["diff", "a.yaml", "b.yaml", "--json"], root);
    let diff: serde_json::Value = serde_json::from_str(&out).expect("json");
    assert_eq!(diff["shared"].as_array().map(Vec::len), Some(1));
    assert_eq!(diff["other_only"][0][1][0], "cat");
    assert_eq!(diff["base_only"].as_array().map(Vec::len), Some(0));
}

#[test]
fn export_to_xlsx_and_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    fs::write(root.join("B2_list.yaml"), B2).expect("write");

    run(&["export", "B2_list.yaml"], root);
    assert!(root.join("B2_list.xlsx").is_file());
    run(
        &["export", "B2_list.xlsx", "--format", "yaml", "--out", "copy.yaml"],
        root,
    );
    let copy = fs::read_to_string(root.join("copy.yaml")).expect("read copy");
    // leaves come back sorted
    assert_eq!(
        copy,
        "legend: [lemma, POS, level, freq, origin]\n\
         ont:\n  noun:\n    common:\n    - [cat, N, '2', '1', '']\n    - [dog, N, '1', '3', '']\n"
    );
}
