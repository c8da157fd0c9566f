use std::collections::HashMap;

use super::{Pointer, PointerBuf};
use crate::{hash::digest, DiffOptions, HashCode, Node};

/// Locations of subtrees that are identical in the source and the target.
///
/// Filled by the preparatory pass and queried when an added value could be
/// copied from somewhere instead. Only pointers are stored; a hit is confirmed
/// by resolving it against the target document.
#[derive(Clone, Debug, Default)]
pub(crate) struct HashIndex {
    entries: HashMap<HashCode, Pointer>,
}

impl HashIndex {
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Walks the structural intersection of both trees, recording every
    /// maximal subtree that did not change. Later entries win on collision.
    ///
    /// Ignored locations and subtrees holding one are never recorded.
    pub(crate) fn prepare(
        &mut self,
        options: &DiffOptions,
        pointer: &mut PointerBuf,
        source: &Node,
        target: &Node,
    ) {
        if options.is_ignored(pointer.as_str()) || !source.is_comparable(target) {
            return;
        }
        if source == target {
            let location = pointer.snapshot();
            if !options.ignores_within(&location) {
                self.entries.insert(digest(target), location);
                return;
            }
        }
        match (source, target) {
            (Node::Array(lhs), Node::Array(rhs)) => {
                for (index, (lhs, rhs)) in lhs.iter().zip(rhs).enumerate() {
                    pointer.push_index(index);
                    self.prepare(options, pointer, lhs, rhs);
                    pointer.pop();
                }
            }
            (Node::Object(lhs), Node::Object(rhs)) => {
                for (key, lhs) in lhs {
                    if let Some(rhs) = rhs.get(key) {
                        pointer.push_key(key);
                        self.prepare(options, pointer, lhs, rhs);
                        pointer.pop();
                    }
                }
            }
            _ => {}
        }
    }

    /// Returns where an unchanged copy of `value` lives in `document`, if anywhere.
    pub(crate) fn find(&self, document: &Node, value: &Node) -> Option<&Pointer> {
        if self.entries.is_empty() {
            return None;
        }
        self.entries
            .get(&digest(value))
            .filter(|location| document.pointer(location) == Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(text: &str) -> Node {
        Node::from_json_str(text).unwrap()
    }

    fn prepared(source: &str, target: &str) -> HashIndex {
        prepared_with(&DiffOptions::default(), source, target)
    }

    fn prepared_with(options: &DiffOptions, source: &str, target: &str) -> HashIndex {
        let mut index = HashIndex::default();
        index.prepare(options, &mut PointerBuf::new(), &node(source), &node(target));
        index
    }

    #[test]
    fn records_unchanged_subtrees_of_the_intersection() {
        let target = r#"{"keep":{"x":[1,2]},"list":[false,"a"],"new":7}"#;
        let index = prepared(r#"{"keep":{"x":[1,2]},"list":[true,"a",3],"gone":7}"#, target);
        let document = node(target);
        assert_eq!(index.find(&document, &node(r#"{"x":[1,2]}"#)).map(Pointer::as_str), Some("/keep"));
        assert_eq!(index.find(&document, &node(r#""a""#)).map(Pointer::as_str), Some("/list/1"));
        assert!(index.find(&document, &node("[1,2]")).is_none());
        assert!(index.find(&document, &node("7")).is_none());
        assert!(index.find(&document, &node("3")).is_none());
    }

    #[test]
    fn equal_documents_index_the_root() {
        let index = prepared("[1]", "[1]");
        assert_eq!(index.len(), 1);
        assert_eq!(index.find(&node("[1]"), &node("[1]")), Some(&Pointer::root()));
    }

    #[test]
    fn incomparable_branches_are_not_recursed() {
        let index = prepared(r#"{"a":[{"b":1}]}"#, r#"{"a":{"0":{"b":1}}}"#);
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn ignored_locations_are_never_recorded() {
        let options = DiffOptions::default().with_ignores(["/a", "/b/x"]).unwrap();
        let text = r#"{"a":{"k":1},"b":{"x":2,"y":[3]},"c":4}"#;
        let index = prepared_with(&options, text, text);
        let document = node(text);
        assert!(index.find(&document, &node(r#"{"k":1}"#)).is_none());
        assert!(index.find(&document, &node("1")).is_none());
        assert!(index.find(&document, &node("2")).is_none());
        assert!(index.find(&document, &node(r#"{"x":2,"y":[3]}"#)).is_none());
        assert!(index.find(&document, &node(text)).is_none());
        assert_eq!(index.find(&document, &node("[3]")).map(Pointer::as_str), Some("/b/y"));
        assert_eq!(index.find(&document, &node("4")).map(Pointer::as_str), Some("/c"));
    }

    #[test]
    fn hits_are_confirmed_against_the_document() {
        let index = prepared(r#"{"a":[1]}"#, r#"{"a":[1]}"#);
        assert_eq!(index.len(), 1);
        assert!(index.find(&node(r#"{"a":[2]}"#), &node(r#"{"a":[1]}"#)).is_none());
    }
}
