use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_tempfile(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create tempfile");
    write!(file, "{contents}").expect("write tempfile");
    file
}

fn jsondiff() -> Command {
    Command::cargo_bin("jsondiff").expect("binary jsondiff should be built")
}

#[test]
fn help_succeeds() {
    jsondiff()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--factorize"));
}

#[test]
fn version_is_printed() {
    jsondiff().arg("--version").assert().success().stdout(predicate::str::contains("jsondiff"));
}

#[test]
fn diff_prints_patch_and_exits_one() {
    let lhs = write_tempfile(r#"{"a":1,"b":2}"#);
    let rhs = write_tempfile(r#"{"a":2,"b":2}"#);
    jsondiff()
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(1)
        .stdout(r#"[{"op":"replace","path":"/a","value":2}]"#)
        .stderr(predicate::str::is_empty());
}

#[test]
fn identical_inputs_exit_zero() {
    let lhs = write_tempfile(r#"{"a":[1,2]}"#);
    let rhs = write_tempfile(r#"{ "a": [1, 2] }"#);
    jsondiff().arg(lhs.path()).arg(rhs.path()).assert().success().stdout("[]");
}

#[test]
fn single_argument_reads_stdin() {
    let lhs = write_tempfile("[1,2,3]");
    jsondiff()
        .arg(lhs.path())
        .write_stdin("[1,2,3,4]")
        .assert()
        .code(1)
        .stdout(r#"[{"op":"add","path":"/-","value":4}]"#);
}

#[test]
fn flags_select_diff_modes() {
    let lhs = write_tempfile(r#"{"a":5,"b":{}}"#);
    let rhs = write_tempfile(r#"{"b":{"c":5}}"#);
    jsondiff()
        .arg("--factorize")
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(1)
        .stdout(r#"[{"op":"move","from":"/a","path":"/b/c"}]"#);

    jsondiff()
        .args(["--opts", r#"{"invertible":true}"#])
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(1)
        .stdout(r#"[{"op":"test","path":"/a","value":5},{"op":"remove","path":"/a"},{"op":"add","path":"/b/c","value":5}]"#);
}

#[test]
fn ignored_paths_are_skipped() {
    let lhs = write_tempfile(r#"{"a":1,"b":2}"#);
    let rhs = write_tempfile(r#"{"a":9,"b":2}"#);
    jsondiff().args(["--ignore", "/a"]).arg(lhs.path()).arg(rhs.path()).assert().success().stdout("[]");
}

#[test]
fn equivalent_arrays_produce_empty_patch() {
    let lhs = write_tempfile("[1,2,3]");
    let rhs = write_tempfile("[3,2,1]");
    jsondiff().arg("--equivalent").arg(lhs.path()).arg(rhs.path()).assert().success().stdout("[]");
}

#[test]
fn output_file_then_patch_mode_round_trips() {
    let lhs = write_tempfile(r#"{"name":"x","tags":["a"]}"#);
    let rhs = write_tempfile(r#"{"name":"y","tags":["a","b"]}"#);
    let dir = tempfile::tempdir().expect("create tempdir");
    let patch_path = dir.path().join("patch.json");

    jsondiff()
        .args(["--invertible", "-o"])
        .arg(&patch_path)
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&patch_path).expect("patch written");
    assert!(written.starts_with(r#"[{"op":"test","path":"/name","value":"x"}"#));

    jsondiff()
        .arg("-p")
        .arg(&patch_path)
        .arg(lhs.path())
        .assert()
        .success()
        .stdout(r#"{"name":"y","tags":["a","b"]}"#);
}

#[test]
fn invert_prints_the_undo_patch() {
    let lhs = write_tempfile(r#"{"a":1}"#);
    let rhs = write_tempfile(r#"{"a":2}"#);
    jsondiff()
        .arg("--invert")
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(1)
        .stdout(r#"[{"op":"test","path":"/a","value":2},{"op":"replace","path":"/a","value":1}]"#);
}

#[test]
fn failing_patch_reports_error() {
    let patch = write_tempfile(r#"[{"op":"test","path":"/a","value":1}]"#);
    let doc = write_tempfile(r#"{"a":2}"#);
    jsondiff()
        .arg("-p")
        .arg(patch.path())
        .arg(doc.path())
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to apply patch"))
        .stderr(predicate::str::contains("test failed at /a"));
}

#[test]
fn yaml_inputs_are_supported() {
    let lhs = write_tempfile("a: 1\nb: [x]\n");
    let rhs = write_tempfile("a: 1\nb: [x, y]\n");
    jsondiff()
        .arg("--yaml")
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("op: add"))
        .stdout(predicate::str::contains("/b/-"));
}

#[test]
fn malformed_input_is_reported() {
    let lhs = write_tempfile("{");
    let rhs = write_tempfile("{}");
    jsondiff()
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to parse first input"));
}

#[test]
fn json_logs_go_to_stderr() {
    let lhs = write_tempfile(r#"{"a":1}"#);
    let rhs = write_tempfile(r#"{"a":2}"#);
    jsondiff()
        .env("JSONDIFF_LOG", "debug")
        .args(["--log-format", "json"])
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(1)
        .stdout(r#"[{"op":"replace","path":"/a","value":2}]"#)
        .stderr(predicate::str::contains("\"operations\":1"));
}
