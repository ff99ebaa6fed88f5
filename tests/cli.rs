use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn parse_jsonl(stdout: &[u8]) -> Vec<Value> {
    let s = String::from_utf8_lossy(stdout);
    s.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<Value>(l).expect("valid jsonl line"))
        .collect()
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn markex() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("markex"))
}

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[test]
fn markers_lists_in_file_order() {
    let temp = tempdir().unwrap();

    write_file(&temp.path().join("b.go"), "//@check(A, 1)\n");
    write_file(&temp.path().join("a.go"), "var A int //@A\n");
    write_file(&temp.path().join("notes.bin"), "//@ignored\n");

    let mut cmd = markex();
    cmd.arg("--root").arg(temp.path()).arg("markers");

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 2);

    assert_eq!(items[0]["path"], "a.go");
    assert_eq!(items[0]["excerpt"], r#"mark(A, "A")"#);
    assert_eq!(items[0]["data"]["method"], "mark");

    assert_eq!(items[1]["path"], "b.go");
    assert_eq!(items[1]["data"]["args"], serde_json::json!(["A", "1"]));
}

#[test]
fn markers_respects_max_depth() {
    let temp = tempdir().unwrap();

    write_file(&temp.path().join("top.go"), "T //@T\n");
    write_file(&temp.path().join("nested/deep.go"), "D //@D\n");

    let mut cmd = markex();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("markers")
        .arg("--max-depth")
        .arg("1");

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["path"], "top.go");
}

#[test]
fn anchors_reports_positions() {
    let mut cmd = markex();
    cmd.arg("--root")
        .arg(fixtures())
        .arg("anchors")
        .arg("markers.go");

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 8);
    assert!(items.iter().all(|i| i["kind"] == "anchor"));

    let names: Vec<_> = items
        .iter()
        .map(|i| i["data"]["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "αSimpleMarker",
            "OffsetMarker",
            "RegexMarker",
            "εMultiple",
            "ζMarker",
            "Declared",
            "Comment",
            "NonIdentifier",
        ]
    );

    assert_eq!(items[1]["path"], "markers.go");
    assert_eq!(items[1]["data"]["column"], 8);
    assert_eq!(items[1]["data"]["offset"], 264);
}

#[test]
fn anchors_markdown_output() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.go"), "var A int //@A\n");

    let mut cmd = markex();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("--format")
        .arg("md")
        .arg("anchors");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("## Anchors"))
        .stdout(predicate::str::contains("`a.go`:1 `A`"));
}

#[test]
fn lint_fixture_is_clean() {
    let mut cmd = markex();
    cmd.arg("--root")
        .arg(fixtures())
        .arg("lint")
        .arg("markers.go")
        .arg("--expect")
        .arg("check=string,position")
        .arg("--expect")
        .arg("printI=string,string,int");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("0 errors"));
}

#[test]
fn lint_flags_duplicate_anchor() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("dup.go"), "A //@A\nA //@A\n");

    let mut cmd = markex();
    cmd.arg("--root").arg(temp.path()).arg("lint");

    let assert = cmd.assert().failure();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["errors"][0]["code"], "DUPLICATE_ANCHOR");
    assert_eq!(items[0]["range"]["start"], 2);
}

#[test]
fn lint_flags_syntax_error_and_keeps_going() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("bad.go"), "//@check(\n");
    write_file(&temp.path().join("good.go"), "A //@A\nA //@A\n");

    let mut cmd = markex();
    cmd.arg("--root").arg(temp.path()).arg("lint");

    let assert = cmd.assert().failure();
    let items = parse_jsonl(&assert.get_output().stdout);
    let codes: Vec<_> = items
        .iter()
        .map(|i| i["errors"][0]["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes, vec!["SYNTAX_ERROR", "DUPLICATE_ANCHOR"]);
}

#[test]
fn lint_rejects_unsupported_kind() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.go"), "//@check(1)\n");

    let mut cmd = markex();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("lint")
        .arg("--expect")
        .arg("check=float");

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("UNSUPPORTED_PARAM"));
}

#[test]
fn lint_flags_bad_arguments() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.go"), "//@count(\"three\")\n");

    let mut cmd = markex();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("lint")
        .arg("--expect")
        .arg("count=int");

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("BAD_ARGUMENTS"));
}

#[test]
fn markers_missing_path_fails() {
    let temp = tempdir().unwrap();

    let mut cmd = markex();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("markers")
        .arg("nope");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Path not found"));
}

#[test]
fn unknown_format_fails() {
    let temp = tempdir().unwrap();

    let mut cmd = markex();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("--format")
        .arg("yaml")
        .arg("markers");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid --format"));
}
