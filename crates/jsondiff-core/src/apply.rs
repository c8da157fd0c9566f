//! RFC 6902 patch application over [`Node`].

use crate::{
    diff::{pointer::parse_index, Pointer, APPEND_TOKEN},
    Node, Operation, OperationKind, Patch, PatchError,
};

pub(crate) fn apply_patch(node: &Node, patch: &Patch) -> Result<Node, PatchError> {
    let mut document = node.clone();
    for operation in patch {
        apply_operation(&mut document, operation)?;
    }
    Ok(document)
}

/// Applies a single operation in place.
///
/// The document is left untouched when the operation fails.
pub(crate) fn apply_operation(document: &mut Node, operation: &Operation) -> Result<(), PatchError> {
    let path = &operation.path;
    match operation.kind {
        OperationKind::Add => add(document, path, operation.required_value()?.clone()),
        OperationKind::Remove => remove(document, path).map(|_| ()),
        OperationKind::Replace => replace(document, path, operation.required_value()?.clone()),
        OperationKind::Move => {
            let from = operation.required_from()?;
            if from == path {
                return lookup(document, from).map(|_| ());
            }
            if from.is_proper_prefix_of(path) {
                return Err(PatchError::MoveIntoDescendant {
                    from: from.to_string(),
                    path: path.to_string(),
                });
            }
            let value = remove(document, from)?;
            if let Err(err) = add(document, path, value.clone()) {
                // Put the detached value back where it came from.
                add(document, from, value)?;
                return Err(err);
            }
            Ok(())
        }
        OperationKind::Copy => {
            let value = lookup(document, operation.required_from()?)?.clone();
            add(document, path, value)
        }
        OperationKind::Test => {
            let expected = operation.required_value()?;
            let found = lookup(document, path)?;
            if found == expected {
                Ok(())
            } else {
                Err(PatchError::TestFailed {
                    path: path.to_string(),
                    expected: expected.to_json_string(),
                    found: found.to_json_string(),
                })
            }
        }
    }
}

fn lookup<'a>(document: &'a Node, path: &Pointer) -> Result<&'a Node, PatchError> {
    document.pointer(path).ok_or_else(|| PatchError::PathNotFound { path: path.to_string() })
}

fn parent_mut<'a>(
    document: &'a mut Node,
    path: &Pointer,
) -> Result<Option<(&'a mut Node, String)>, PatchError> {
    let Some((parent, last)) = path.split_last() else {
        return Ok(None);
    };
    let container = document
        .pointer_mut(&parent)
        .ok_or_else(|| PatchError::PathNotFound { path: parent.to_string() })?;
    Ok(Some((container, last)))
}

fn index(path: &Pointer, token: &str, bound: usize) -> Result<usize, PatchError> {
    match parse_index(token) {
        Some(index) if index <= bound => Ok(index),
        Some(_) => Err(PatchError::PathNotFound { path: path.to_string() }),
        None => Err(PatchError::InvalidIndex { path: path.to_string(), token: token.to_owned() }),
    }
}

fn not_a_container(path: &Pointer) -> PatchError {
    PatchError::NotAContainer { path: path.to_string() }
}

fn add(document: &mut Node, path: &Pointer, value: Node) -> Result<(), PatchError> {
    let Some((container, last)) = parent_mut(document, path)? else {
        *document = value;
        return Ok(());
    };
    match container {
        Node::Object(map) => {
            map.insert(last, value);
            Ok(())
        }
        Node::Array(items) => {
            if last == APPEND_TOKEN {
                items.push(value);
            } else {
                let at = index(path, &last, items.len())?;
                items.insert(at, value);
            }
            Ok(())
        }
        _ => Err(not_a_container(path)),
    }
}

fn remove(document: &mut Node, path: &Pointer) -> Result<Node, PatchError> {
    let Some((container, last)) = parent_mut(document, path)? else {
        return Err(PatchError::RemoveRoot);
    };
    match container {
        Node::Object(map) => {
            map.remove(&last).ok_or_else(|| PatchError::PathNotFound { path: path.to_string() })
        }
        Node::Array(items) if !items.is_empty() => {
            let at = index(path, &last, items.len() - 1)?;
            Ok(items.remove(at))
        }
        Node::Array(_) => Err(PatchError::PathNotFound { path: path.to_string() }),
        _ => Err(not_a_container(path)),
    }
}

fn replace(document: &mut Node, path: &Pointer, value: Node) -> Result<(), PatchError> {
    let Some((container, last)) = parent_mut(document, path)? else {
        *document = value;
        return Ok(());
    };
    let slot = match container {
        Node::Object(map) => map.get_mut(&last),
        Node::Array(items) => {
            let at = index(path, &last, items.len())?;
            items.get_mut(at)
        }
        _ => return Err(not_a_container(path)),
    };
    let slot = slot.ok_or_else(|| PatchError::PathNotFound { path: path.to_string() })?;
    *slot = value;
    Ok(())
}
