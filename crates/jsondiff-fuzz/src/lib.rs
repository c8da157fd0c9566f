//! Fuzzing harnesses for `jsondiff`.
//!
//! Each public function accepts raw bytes so it can be driven from
//! `cargo fuzz` targets as well as from ordinary tests. Decoding failures are
//! swallowed; broken engine invariants panic.
//!
//! # Examples
//!
//! ```
//! jsondiff_fuzz::fuzz_decode(b"{\"a\":1}");
//! jsondiff_fuzz::fuzz_diff(&[1, 2, 3, 4]);
//! jsondiff_fuzz::fuzz_patch(b"example");
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use arbitrary::Unstructured;
use jsondiff_core::{DiffOptions, Node, OperationKind, Patch};
use serde_json::{self, Map as JsonMap, Number as JsonNumber, Value as JsonValue};

const MAX_DEPTH: usize = 4;
const MAX_ARRAY_LEN: u8 = 6;
const MAX_OBJECT_LEN: u8 = 6;
const MAX_STRING_LEN: u8 = 3;

/// Feeds arbitrary bytes through the JSON, YAML and patch decoders.
///
/// ```
/// jsondiff_fuzz::fuzz_decode(b"[{\"op\":\"remove\",\"path\":\"/a\"}]");
/// ```
pub fn fuzz_decode(data: &[u8]) {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = Node::from_json_str(text);
        let _ = Node::from_yaml_str(text);
        let _ = serde_json::from_str::<Patch>(text);
    }
}

/// Diffs two random documents under a random flag combination and checks
/// that the patch applies, restores the target and can be inverted.
///
/// ```
/// jsondiff_fuzz::fuzz_diff(b"seed");
/// ```
pub fn fuzz_diff(data: &[u8]) {
    let mut unstructured = Unstructured::new(data);
    let Ok(flags) = unstructured.int_in_range::<u8>(0..=15) else {
        return;
    };
    let Some(source) = random_node(&mut unstructured) else {
        return;
    };
    let Some(target) = random_node(&mut unstructured) else {
        return;
    };

    let options = options_from_flags(flags);
    let Ok(patch) = source.diff(&target, &options) else {
        return;
    };
    let patched = source
        .apply_patch(&patch)
        .unwrap_or_else(|err| panic!("{options}: patch does not apply: {err}"));
    if !options.equivalent() {
        assert_eq!(patched, target, "{options}: patch does not reach the target");
    }
    if options.invertible() {
        assert!(patch.iter().all(|op| op.kind != OperationKind::Copy), "{options}: copy in invertible patch");
    }

    let inverse = patch
        .invert(&source)
        .unwrap_or_else(|err| panic!("{options}: patch does not invert: {err}"));
    assert_eq!(patched.apply_patch(&inverse).ok(), Some(source), "{options}: inverse does not restore");
}

/// Applies both generated and arbitrary patches to random documents.
///
/// The harness first diffs two random inputs and applies the result. It then
/// tries to decode a patch from the raw bytes and apply it to another random
/// document to exercise the applier's error paths.
///
/// ```
/// jsondiff_fuzz::fuzz_patch(b"patch fuzz");
/// ```
pub fn fuzz_patch(data: &[u8]) {
    let mut unstructured = Unstructured::new(data);
    if let (Some(base), Some(target)) = (random_node(&mut unstructured), random_node(&mut unstructured)) {
        let options = DiffOptions::default().with_factorize(true);
        if let Ok(patch) = base.diff(&target, &options) {
            let _ = base.apply_patch(&patch);
        }
    }

    if let Ok(patch) = serde_json::from_slice::<Patch>(data) {
        let mut unstructured = Unstructured::new(data);
        if let Some(seed) = random_node(&mut unstructured) {
            if let Ok(patched) = seed.apply_patch(&patch) {
                if let Ok(inverse) = patch.invert(&seed) {
                    assert_eq!(patched.apply_patch(&inverse).ok(), Some(seed));
                }
            }
        }
    }
}

fn options_from_flags(flags: u8) -> DiffOptions {
    DiffOptions::default()
        .with_factorize(flags & 1 != 0)
        .with_rationalize(flags & 2 != 0)
        .with_invertible(flags & 4 != 0)
        .with_equivalent(flags & 8 != 0)
}

fn random_node(unstructured: &mut Unstructured<'_>) -> Option<Node> {
    let value = json_value_from_unstructured(unstructured, 0).ok()?;
    Node::from_json_value(value).ok()
}

fn json_value_from_unstructured(
    unstructured: &mut Unstructured<'_>,
    depth: usize,
) -> Result<JsonValue, arbitrary::Error> {
    if depth >= MAX_DEPTH {
        return json_leaf(unstructured);
    }

    let choice = unstructured.int_in_range::<u8>(0..=5)?;
    match choice {
        0..=3 => json_leaf(unstructured),
        4 => {
            let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_ARRAY_LEN)?);
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(json_value_from_unstructured(unstructured, depth + 1)?);
            }
            Ok(JsonValue::Array(items))
        }
        _ => {
            let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_OBJECT_LEN)?);
            let mut map = JsonMap::new();
            for _ in 0..len {
                let key = random_string(unstructured)?;
                let value = json_value_from_unstructured(unstructured, depth + 1)?;
                map.insert(key, value);
            }
            Ok(JsonValue::Object(map))
        }
    }
}

fn json_leaf(unstructured: &mut Unstructured<'_>) -> Result<JsonValue, arbitrary::Error> {
    let choice = unstructured.int_in_range::<u8>(0..=3)?;
    match choice {
        0 => Ok(JsonValue::Null),
        1 => Ok(JsonValue::Bool(unstructured.arbitrary()?)),
        2 => Ok(JsonValue::Number(random_number(unstructured)?)),
        _ => Ok(JsonValue::String(random_string(unstructured)?)),
    }
}

fn random_number(unstructured: &mut Unstructured<'_>) -> Result<JsonNumber, arbitrary::Error> {
    if unstructured.arbitrary()? {
        Ok(JsonNumber::from(unstructured.int_in_range::<i8>(-4..=4)?))
    } else {
        let numerator = f64::from(unstructured.arbitrary::<i32>()?);
        let denominator = f64::from(unstructured.int_in_range::<u16>(1..=1024)?);
        JsonNumber::from_f64(numerator / denominator).ok_or(arbitrary::Error::IncorrectFormat)
    }
}

/// Short strings over a tiny alphabet so keys and values collide often.
fn random_string(unstructured: &mut Unstructured<'_>) -> Result<String, arbitrary::Error> {
    const ALPHABET: &[u8] = b"ab/~0";
    let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_STRING_LEN)?);
    let mut string = String::with_capacity(len);
    for _ in 0..len {
        string.push(char::from(*unstructured.choose(ALPHABET)?));
    }
    Ok(string)
}
