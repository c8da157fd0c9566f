//! Benchmark corpora for `jsondiff`.
//!
//! Each corpus deterministically builds a pair of documents shaped like a
//! workload the diff engine is expected to handle: wide records with
//! scattered edits, deep configuration trees and keyed items that move
//! between containers.
//!
//! # Examples
//!
//! ```
//! use jsondiff_benches::available_corpora;
//! use jsondiff_core::DiffOptions;
//!
//! let corpus = available_corpora().iter().find(|c| c.name() == "config-drift").unwrap();
//! let dataset = corpus.load()?;
//! let patch = dataset.diff(&DiffOptions::default())?;
//! assert!(!patch.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use jsondiff_core::{CanonicalizeError, DiffError, DiffOptions, Node, Patch};
use serde_json::{json, Value as JsonValue};

/// A named generator for a pair of documents.
#[derive(Debug)]
pub struct Corpus {
    name: &'static str,
    description: &'static str,
    build: fn() -> (JsonValue, JsonValue),
}

impl Corpus {
    /// Short identifier used as the benchmark id.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// One-line summary of the workload.
    #[must_use]
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Builds the documents.
    pub fn load(&self) -> Result<Dataset, CanonicalizeError> {
        let (before, after) = (self.build)();
        let bytes = before.to_string().len() + after.to_string().len();
        Ok(Dataset { before: Node::from_json_value(before)?, after: Node::from_json_value(after)?, bytes })
    }
}

/// A loaded pair of documents.
#[derive(Clone, Debug)]
pub struct Dataset {
    before: Node,
    after: Node,
    bytes: usize,
}

impl Dataset {
    /// The source document.
    #[must_use]
    pub fn before(&self) -> &Node {
        &self.before
    }

    /// The target document.
    #[must_use]
    pub fn after(&self) -> &Node {
        &self.after
    }

    /// Combined size of both documents as compact JSON.
    #[must_use]
    pub fn fixture_bytes(&self) -> usize {
        self.bytes
    }

    /// Diffs `before` against `after`.
    pub fn diff(&self, options: &DiffOptions) -> Result<Patch, DiffError> {
        self.before.diff(&self.after, options)
    }
}

static CORPORA: [Corpus; 3] = [
    Corpus {
        name: "wide-records",
        description: "2000 flat records, every seventh one edited",
        build: wide_records,
    },
    Corpus {
        name: "config-drift",
        description: "deep configuration tree where whole sections change",
        build: config_drift,
    },
    Corpus {
        name: "relocated-items",
        description: "keyed items moved and duplicated between buckets",
        build: relocated_items,
    },
];

/// Returns every registered corpus.
#[must_use]
pub fn available_corpora() -> &'static [Corpus] {
    &CORPORA
}

fn record(id: usize, revision: usize) -> JsonValue {
    json!({
        "id": id,
        "name": format!("record-{id}"),
        "active": id % 3 != 0,
        "score": (id * 37 + revision) % 101,
        "tags": [format!("t{}", id % 5), format!("t{}", (id + revision) % 7)],
    })
}

fn wide_records() -> (JsonValue, JsonValue) {
    let before: Vec<_> = (0..2000).map(|id| record(id, 0)).collect();
    let after: Vec<_> = (0..2000).map(|id| record(id, usize::from(id % 7 == 0))).collect();
    (JsonValue::Array(before), JsonValue::Array(after))
}

fn section(depth: usize, seed: usize) -> JsonValue {
    if depth == 0 {
        return json!({ "enabled": seed % 2 == 0, "limit": seed * 10, "label": format!("leaf-{seed}") });
    }
    let mut map = serde_json::Map::new();
    for branch in 0..4 {
        map.insert(format!("s{branch}"), section(depth - 1, seed * 4 + branch));
    }
    JsonValue::Object(map)
}

fn config_drift() -> (JsonValue, JsonValue) {
    let before = section(5, 1);
    let mut after = before.clone();
    for branch in ["s0", "s2"] {
        if let Some(target) = after.get_mut(branch).and_then(|node| node.get_mut("s1")) {
            *target = section(3, 9000);
        }
    }
    (before, after)
}

fn relocated_items() -> (JsonValue, JsonValue) {
    let item = |id: usize| json!({ "sku": format!("sku-{id:04}"), "qty": id % 9, "dims": [id % 4, id % 5, id % 6] });
    let keyed = |ids: &mut dyn Iterator<Item = usize>| -> serde_json::Map<String, JsonValue> {
        ids.map(|id| (format!("sku-{id:04}"), item(id))).collect()
    };
    let bucket = JsonValue::Array((300..600).map(item).collect());

    let stocked = keyed(&mut (0..300_usize));
    let before = json!({ "a": stocked, "b": bucket.clone(), "c": {} });

    let mut relocated = serde_json::Map::new();
    for id in (0..300).filter(|id| id % 10 == 0) {
        relocated.insert(format!("moved-{id:04}"), item(id));
    }
    for id in (0..300).filter(|id| id % 25 == 1) {
        relocated.insert(format!("copy-{id:04}"), item(id));
    }
    let remaining = keyed(&mut (0..300_usize).filter(|id| id % 10 != 0));
    let after = json!({ "a": remaining, "b": bucket, "c": relocated });
    (before, after)
}
