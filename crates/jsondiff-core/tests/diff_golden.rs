use std::fs;
use std::path::Path;

use jsondiff_core::{DiffOptions, Node};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct Fixture {
    source: Node,
    target: Node,
    options: DiffOptions,
    patch: Value,
}

fn load_fixture(path: &Path) -> Fixture {
    let data = fs::read_to_string(path).expect("fixture should be readable");
    serde_json::from_str(&data).expect("fixture should deserialize")
}

#[test]
fn diff_golden_parity() {
    let fixtures_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/diff");
    let mut entries: Vec<_> = fs::read_dir(&fixtures_root)
        .expect("fixtures directory must exist")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort();

    assert!(!entries.is_empty(), "expected at least one diff fixture under tests/fixtures/diff");

    for path in entries {
        let fixture = load_fixture(&path);
        let patch = fixture.source.diff(&fixture.target, &fixture.options).expect("diff succeeds");
        let rendered: Value = serde_json::from_str(&patch.to_json_string().unwrap()).unwrap();
        assert_eq!(rendered, fixture.patch, "fixture {path:?}");

        let patched = fixture.source.apply_patch(&patch).expect("patch applies");
        if fixture.options.ignores().is_empty() && !fixture.options.equivalent() {
            assert_eq!(patched, fixture.target, "fixture {path:?}");
        }
    }
}
