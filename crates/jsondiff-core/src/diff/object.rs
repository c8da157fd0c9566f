use std::collections::{BTreeMap, BTreeSet};

use super::Differ;
use crate::{DiffError, Node};

impl Differ {
    /// Visits the union of both key sets in sorted order.
    pub(super) fn compare_objects(
        &mut self,
        document: &Node,
        source: &BTreeMap<String, Node>,
        target: &BTreeMap<String, Node>,
    ) -> Result<(), DiffError> {
        let keys: BTreeSet<&String> = source.keys().chain(target.keys()).collect();
        for key in keys {
            self.pointer.push_key(key);
            let outcome = match (source.get(key), target.get(key)) {
                (Some(lhs), Some(rhs)) => self.diff(document, lhs, rhs),
                (Some(lhs), None) => {
                    if !self.options.is_ignored(self.pointer.as_str()) {
                        let path = self.pointer.snapshot();
                        self.remove(path, lhs);
                    }
                    Ok(())
                }
                (None, Some(rhs)) => {
                    if !self.options.is_ignored(self.pointer.as_str()) {
                        let path = self.pointer.snapshot();
                        self.add(document, path, rhs);
                    }
                    Ok(())
                }
                (None, None) => Ok(()),
            };
            self.pointer.pop();
            outcome?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{diff::diff_nodes, DiffOptions, Node};

    fn wire(source: &str, target: &str, options: &DiffOptions) -> String {
        let source = Node::from_json_str(source).unwrap();
        let target = Node::from_json_str(target).unwrap();
        diff_nodes(&source, &target, options).unwrap().to_json_string().unwrap()
    }

    #[test]
    fn keys_are_visited_in_sorted_order() {
        assert_eq!(
            wire(r#"{"c":1,"a":1}"#, r#"{"b":2,"c":2}"#, &DiffOptions::default()),
            concat!(
                r#"[{"op":"remove","path":"/a"},"#,
                r#"{"op":"add","path":"/b","value":2},"#,
                r#"{"op":"replace","path":"/c","value":2}]"#
            )
        );
    }

    #[test]
    fn keys_are_escaped_in_paths() {
        assert_eq!(
            wire(r#"{"a/b":{"~":1}}"#, r#"{"a/b":{"~":2}}"#, &DiffOptions::default()),
            r#"[{"op":"replace","path":"/a~1b/~0","value":2}]"#
        );
    }

    #[test]
    fn ignored_members_are_neither_added_nor_removed() {
        let options = DiffOptions::default().with_ignores(["/old", "/new"]).unwrap();
        assert_eq!(wire(r#"{"old":1,"k":1}"#, r#"{"new":1,"k":1}"#, &options), "[]");
    }

    #[test]
    fn invertible_removal_is_guarded() {
        let options = DiffOptions::default().with_invertible(true);
        assert_eq!(
            wire(r#"{"a":{"x":[1]}}"#, "{}", &options),
            r#"[{"op":"test","path":"/a","value":{"x":[1]}},{"op":"remove","path":"/a"}]"#
        );
    }
}
