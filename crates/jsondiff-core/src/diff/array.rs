use std::collections::HashMap;

use super::Differ;
use crate::{hash::digest, DiffError, HashCode, Node};

impl Differ {
    /// Compares arrays index by index.
    ///
    /// Surplus source elements are removed from the tail, surplus target
    /// elements are appended with `-`. With `equivalent`, arrays holding the
    /// same elements in a different order produce no operations.
    pub(super) fn compare_arrays(
        &mut self,
        document: &Node,
        source: &[Node],
        target: &[Node],
    ) -> Result<(), DiffError> {
        let shared = source.len().min(target.len());

        // Ignored elements stay put, so later removals land one slot further.
        let mut kept = 0;
        for (index, value) in source.iter().enumerate().skip(shared) {
            if self.is_ignored_at(index) {
                kept += 1;
                continue;
            }
            self.pointer.push_index(shared + kept);
            let path = self.pointer.snapshot();
            self.pointer.pop();
            self.remove(path, value);
        }

        if !(self.options.equivalent() && multiset_equal(source, target)) {
            for (index, (lhs, rhs)) in source.iter().zip(target).enumerate() {
                self.pointer.push_index(index);
                let outcome = self.diff(document, lhs, rhs);
                self.pointer.pop();
                outcome?;
            }
        }

        for (index, value) in target.iter().enumerate().skip(shared) {
            if self.is_ignored_at(index) {
                continue;
            }
            self.pointer.push_append();
            let path = self.pointer.snapshot();
            self.pointer.pop();
            self.add(document, path, value);
        }
        Ok(())
    }

    fn is_ignored_at(&mut self, index: usize) -> bool {
        self.pointer.push_index(index);
        let ignored = self.options.is_ignored(self.pointer.as_str());
        self.pointer.pop();
        ignored
    }
}

/// Returns true when both slices hold the same elements with the same
/// multiplicities, in any order.
fn multiset_equal(source: &[Node], target: &[Node]) -> bool {
    if source.len() != target.len() {
        return false;
    }
    let mut buckets: HashMap<HashCode, Vec<&Node>> = HashMap::with_capacity(source.len());
    for value in source {
        buckets.entry(digest(value)).or_default().push(value);
    }
    for value in target {
        let Some(bucket) = buckets.get_mut(&digest(value)) else {
            return false;
        };
        let Some(position) = bucket.iter().position(|candidate| *candidate == value) else {
            return false;
        };
        bucket.swap_remove(position);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{diff::diff_nodes, DiffOptions};

    fn node(text: &str) -> Node {
        Node::from_json_str(text).unwrap()
    }

    fn elements(text: &str) -> Vec<Node> {
        match node(text) {
            Node::Array(items) => items,
            other => panic!("expected array, got {other:?}"),
        }
    }

    fn wire(source: &str, target: &str, options: &DiffOptions) -> String {
        diff_nodes(&node(source), &node(target), options).unwrap().to_json_string().unwrap()
    }

    #[test]
    fn multiset_equality_counts_duplicates() {
        assert!(multiset_equal(&elements("[1,2,2,{\"a\":[3]}]"), &elements("[{\"a\":[3]},2,1,2]")));
        assert!(!multiset_equal(&elements("[1,1,2]"), &elements("[1,2,2]")));
        assert!(!multiset_equal(&elements("[1,2]"), &elements("[1,2,3]")));
        assert!(!multiset_equal(&elements("[[1,2]]"), &elements("[[2,1]]")));
        assert!(multiset_equal(&[], &[]));
    }

    #[test]
    fn shrinking_removes_from_the_tail() {
        assert_eq!(
            wire("[1,2,3,4]", "[1,2]", &DiffOptions::default()),
            r#"[{"op":"remove","path":"/2"},{"op":"remove","path":"/2"}]"#
        );
    }

    #[test]
    fn elements_are_compared_pairwise() {
        assert_eq!(
            wire(r#"[{"a":1},2]"#, r#"[{"a":2},2,3]"#, &DiffOptions::default()),
            r#"[{"op":"replace","path":"/0/a","value":2},{"op":"add","path":"/-","value":3}]"#
        );
    }

    #[test]
    fn equivalent_arrays_are_left_alone() {
        let options = DiffOptions::default().with_equivalent(true);
        assert_eq!(wire("[1,2,3]", "[3,2,1]", &options), "[]");
        assert_eq!(wire(r#"{"x":[[1,2],3]}"#, r#"{"x":[3,[2,1]]}"#, &options), r#"[{"op":"replace","path":"/x/0","value":3},{"op":"replace","path":"/x/1","value":[2,1]}]"#);
        assert_eq!(wire("[[1,2]]", "[[2,1]]", &options), "[]");
    }
}
