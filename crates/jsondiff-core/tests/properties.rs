use jsondiff_core::{DiffOptions, JsonEncoder, Node, OperationKind, Patch};
use proptest::{
    collection::{btree_map, vec},
    prelude::*,
    sample::{select, subsequence},
};

/// Small alphabets make equal subtrees common, so moves, copies and
/// rationalization all get exercised.
fn arb_document() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        Just(Node::Null),
        any::<bool>().prop_map(Node::Bool),
        (0..4i32).prop_map(Node::from),
        select(vec!["a", "b", "x/y", "~"]).prop_map(Node::from),
    ];
    leaf.prop_recursive(4, 32, 5, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..5).prop_map(Node::Array),
            btree_map(select(vec!["a", "b", "c", "d/e", "~f"]).prop_map(String::from), inner, 0..5)
                .prop_map(Node::Object),
        ]
    })
}

fn all_options() -> impl Iterator<Item = DiffOptions> {
    (0u8..16).map(|mask| {
        DiffOptions::default()
            .with_factorize(mask & 1 != 0)
            .with_rationalize(mask & 2 != 0)
            .with_invertible(mask & 4 != 0)
            .with_equivalent(mask & 8 != 0)
    })
}

/// Sorts every array so that documents equal up to element order compare equal.
fn canonical(node: &Node) -> Node {
    match node {
        Node::Array(items) => {
            let mut items: Vec<Node> = items.iter().map(canonical).collect();
            items.sort_by_cached_key(Node::to_json_string);
            Node::Array(items)
        }
        Node::Object(map) => {
            Node::Object(map.iter().map(|(key, value)| (key.clone(), canonical(value))).collect())
        }
        other => other.clone(),
    }
}

/// Key-only pointers, so array index shifts never alias an ignored location.
fn arb_ignores() -> impl Strategy<Value = Vec<&'static str>> {
    subsequence(vec!["/a", "/b", "/c", "/a/b", "/b/c", "/c/a", "/d~1e", "/~0f/a"], 0..4)
}

fn render(patch: &Patch) -> String {
    patch.to_json_string().unwrap()
}

proptest! {
    #[test]
    fn patch_turns_source_into_target(source in arb_document(), target in arb_document()) {
        for options in all_options() {
            let patch = source.diff(&target, &options).unwrap();
            let patched = source.apply_patch(&patch);
            prop_assert!(patched.is_ok(), "{options}: {} failed: {:?}", render(&patch), patched);
            let patched = patched.unwrap();
            if options.equivalent() {
                prop_assert_eq!(canonical(&patched), canonical(&target), "{}: {}", options, render(&patch));
            } else {
                prop_assert_eq!(&patched, &target, "{}: {}", options, render(&patch));
            }
        }
    }

    #[test]
    fn operations_stay_clear_of_ignored_locations(
        source in arb_document(),
        target in arb_document(),
        ignores in arb_ignores(),
    ) {
        for options in all_options() {
            let options = options.with_ignores(&ignores).unwrap();
            let patch = source.diff(&target, &options).unwrap();
            for op in patch.iter() {
                for ignored in options.ignores() {
                    prop_assert!(
                        !op.path.starts_with(ignored),
                        "{}: {} touches {}",
                        options,
                        render(&patch),
                        ignored
                    );
                    prop_assert!(
                        !op.from.as_ref().is_some_and(|from| from.starts_with(ignored)),
                        "{}: {} reads {}",
                        options,
                        render(&patch),
                        ignored
                    );
                }
            }
        }
    }

    #[test]
    fn equal_documents_produce_no_operations(source in arb_document()) {
        for options in all_options() {
            prop_assert!(source.diff(&source.clone(), &options).unwrap().is_empty());
        }
    }

    #[test]
    fn patched_document_needs_no_further_changes(source in arb_document(), target in arb_document()) {
        for options in all_options().filter(|options| !options.equivalent()) {
            let patched = source.apply_patch(&source.diff(&target, &options).unwrap()).unwrap();
            prop_assert!(patched.diff(&target, &options).unwrap().is_empty());
        }
    }

    #[test]
    fn invertible_patches_guard_destructive_operations(source in arb_document(), target in arb_document()) {
        for options in all_options().filter(DiffOptions::invertible) {
            let patch = source.diff(&target, &options).unwrap();
            let operations = patch.as_slice();
            for (position, op) in operations.iter().enumerate() {
                prop_assert_ne!(op.kind, OperationKind::Copy, "{}", render(&patch));
                if matches!(op.kind, OperationKind::Remove | OperationKind::Replace) {
                    prop_assert!(position > 0, "{}", render(&patch));
                    let guard = &operations[position - 1];
                    prop_assert_eq!(guard.kind, OperationKind::Test, "{}", render(&patch));
                    prop_assert_eq!(&guard.path, &op.path);
                    prop_assert_eq!(&guard.value, &op.old_value);
                }
            }
        }
    }

    #[test]
    fn inverse_restores_source(source in arb_document(), target in arb_document()) {
        for options in all_options() {
            let patch = source.diff(&target, &options).unwrap();
            let patched = source.apply_patch(&patch).unwrap();
            let inverse = patch.invert(&source).unwrap();
            prop_assert_eq!(patched.apply_patch(&inverse).unwrap(), source.clone(), "{}", render(&inverse));
        }
    }

    #[test]
    fn encoded_len_is_the_wire_length(source in arb_document(), target in arb_document()) {
        for options in all_options() {
            let patch = source.diff(&target, &options).unwrap();
            prop_assert_eq!(patch.encoded_len(&JsonEncoder).unwrap(), render(&patch).len());
        }
    }

    #[test]
    fn patches_survive_serialization(source in arb_document(), target in arb_document()) {
        let options = DiffOptions::default().with_factorize(true);
        let patch = source.diff(&target, &options).unwrap();
        let decoded: Patch = serde_json::from_str(&render(&patch)).unwrap();
        prop_assert_eq!(source.apply_patch(&decoded).unwrap(), target);
    }

    #[test]
    fn rationalized_patches_are_never_larger(source in arb_document(), target in arb_document()) {
        let plain = source.diff(&target, &DiffOptions::default()).unwrap();
        let rationalized = source.diff(&target, &DiffOptions::default().with_rationalize(true)).unwrap();
        prop_assert!(rationalized.encoded_len(&JsonEncoder).unwrap() <= plain.encoded_len(&JsonEncoder).unwrap());
    }
}
