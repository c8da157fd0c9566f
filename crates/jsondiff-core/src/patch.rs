//! The JSON Patch (RFC 6902) model produced by the diff engine.
//!
//! Operations keep the value they displaced in `old_value` so that cost
//! estimation and move detection can work on the emitted sequence. That field
//! never appears in the serialized form.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{apply::apply_operation, diff::Pointer, EncodeError, Encoder, Node, PatchError};

/// The six RFC 6902 operation kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Insert a value.
    Add,
    /// Delete a value.
    Remove,
    /// Overwrite a value.
    Replace,
    /// Relocate a value.
    Move,
    /// Duplicate a value.
    Copy,
    /// Assert a value.
    Test,
}

impl OperationKind {
    /// Returns the wire name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
            Self::Move => "move",
            Self::Copy => "copy",
            Self::Test => "test",
        }
    }

    /// Returns true when the wire form carries a `value` member.
    #[must_use]
    pub fn carries_value(self) -> bool {
        matches!(self, Self::Add | Self::Replace | Self::Test)
    }

    /// Returns true when the wire form carries a `from` member.
    #[must_use]
    pub fn carries_from(self) -> bool {
        matches!(self, Self::Move | Self::Copy)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single patch operation.
///
/// ```
/// # use jsondiff_core::{diff::Pointer, Node, Operation};
/// let op = Operation::replace(Pointer::parse("/a")?, Node::from(1), Node::from(2));
/// assert_eq!(serde_json::to_string(&op)?, r#"{"op":"replace","path":"/a","value":2}"#);
/// assert_eq!(op.old_value, Some(Node::from(1)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawOperation")]
pub struct Operation {
    /// Operation kind.
    pub kind: OperationKind,
    /// Source location for `move` and `copy`.
    pub from: Option<Pointer>,
    /// Target location.
    pub path: Pointer,
    /// Value found at `path` before the operation, when known.
    pub old_value: Option<Node>,
    /// Value written by the operation (moved or copied value for `move`/`copy`).
    pub value: Option<Node>,
}

impl Operation {
    fn new(kind: OperationKind, path: Pointer) -> Self {
        Self { kind, from: None, path, old_value: None, value: None }
    }

    /// Builds an `add` operation.
    #[must_use]
    pub fn add(path: Pointer, value: Node) -> Self {
        Self { value: Some(value), ..Self::new(OperationKind::Add, path) }
    }

    /// Builds a `remove` operation remembering the removed value.
    #[must_use]
    pub fn remove(path: Pointer, old_value: Node) -> Self {
        Self { old_value: Some(old_value), ..Self::new(OperationKind::Remove, path) }
    }

    /// Builds a `replace` operation.
    #[must_use]
    pub fn replace(path: Pointer, old_value: Node, value: Node) -> Self {
        Self {
            old_value: Some(old_value),
            value: Some(value),
            ..Self::new(OperationKind::Replace, path)
        }
    }

    /// Builds a `move` operation carrying the relocated value.
    #[must_use]
    pub fn move_from(from: Pointer, path: Pointer, value: Node) -> Self {
        Self { from: Some(from), value: Some(value), ..Self::new(OperationKind::Move, path) }
    }

    /// Builds a `copy` operation carrying the duplicated value.
    #[must_use]
    pub fn copy_from(from: Pointer, path: Pointer, value: Node) -> Self {
        Self { from: Some(from), value: Some(value), ..Self::new(OperationKind::Copy, path) }
    }

    /// Builds a `test` operation.
    #[must_use]
    pub fn test(path: Pointer, expected: Node) -> Self {
        Self { value: Some(expected), ..Self::new(OperationKind::Test, path) }
    }

    /// Returns the `value` member, failing when the kind requires one that is absent.
    pub(crate) fn required_value(&self) -> Result<&Node, PatchError> {
        self.value.as_ref().ok_or_else(|| self.missing("value"))
    }

    /// Returns the `from` member, failing when absent.
    pub(crate) fn required_from(&self) -> Result<&Pointer, PatchError> {
        self.from.as_ref().ok_or_else(|| self.missing("from"))
    }

    fn missing(&self, member: &'static str) -> PatchError {
        PatchError::MissingMember {
            op: self.kind.to_string(),
            path: self.path.to_string(),
            member,
        }
    }

    /// Returns the exact byte length of the serialized operation, with values
    /// measured by `encoder`.
    ///
    /// ```
    /// # use jsondiff_core::{diff::Pointer, JsonEncoder, Node, Operation};
    /// let op = Operation::add(Pointer::parse("/a")?, Node::from_json_str("[1,2]")?);
    /// let wire = serde_json::to_string(&op)?;
    /// assert_eq!(op.encoded_len(&JsonEncoder)?, wire.len());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn encoded_len(&self, encoder: &dyn Encoder) -> Result<usize, EncodeError> {
        // {"op":"<kind>"  ,"from":<str>  ,"path":<str>  ,"value":<bytes>  }
        let mut len = r#"{"op":""#.len() + self.kind.as_str().len() + 1;
        if let (true, Some(from)) = (self.kind.carries_from(), self.from.as_ref()) {
            len += r#","from":"#.len() + quoted_len(from.as_str());
        }
        len += r#","path":"#.len() + quoted_len(self.path.as_str());
        if let (true, Some(value)) = (self.kind.carries_value(), self.value.as_ref()) {
            len += r#","value":"#.len() + encoder.encode(value)?.len();
        }
        Ok(len + 1)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.from {
            Some(from) => write!(f, "{} {} -> {}", self.kind, from, self.path),
            None => write!(f, "{} {}", self.kind, self.path),
        }
    }
}

#[derive(Serialize)]
struct WireOperation<'a> {
    op: OperationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a Pointer>,
    path: &'a Pointer,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a Node>,
}

impl Serialize for Operation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        WireOperation {
            op: self.kind,
            from: self.from.as_ref().filter(|_| self.kind.carries_from()),
            path: &self.path,
            value: self.value.as_ref().filter(|_| self.kind.carries_value()),
        }
        .serialize(serializer)
    }
}

#[derive(Deserialize)]
struct RawOperation {
    op: OperationKind,
    #[serde(default)]
    from: Option<Pointer>,
    path: Pointer,
    #[serde(default, deserialize_with = "present")]
    value: Option<Node>,
}

/// Keeps an explicit `null` distinct from an absent member.
fn present<'de, D>(deserializer: D) -> Result<Option<Node>, D::Error>
where
    D: Deserializer<'de>,
{
    Node::deserialize(deserializer).map(Some)
}

impl TryFrom<RawOperation> for Operation {
    type Error = PatchError;

    fn try_from(raw: RawOperation) -> Result<Self, Self::Error> {
        let op = Self {
            kind: raw.op,
            from: raw.from.filter(|_| raw.op.carries_from()),
            path: raw.path,
            old_value: None,
            value: raw.value.filter(|_| raw.op.carries_value()),
        };
        if op.kind.carries_from() {
            op.required_from()?;
        }
        if op.kind.carries_value() {
            op.required_value()?;
        }
        Ok(op)
    }
}

/// An ordered sequence of operations.
///
/// ```
/// # use jsondiff_core::{DiffOptions, Node, Patch};
/// let patch: Patch = serde_json::from_str(r#"[{"op":"add","path":"/b","value":null}]"#)?;
/// let doc = Node::from_json_str(r#"{"a":1}"#)?;
/// assert_eq!(doc.apply_patch(&patch)?.to_json_string(), r#"{"a":1,"b":null}"#);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    operations: Vec<Operation>,
}

impl Patch {
    /// Constructs an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operation.
    pub fn append(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    /// Removes and returns the operation at `index`, shifting later ones down.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove_at(&mut self, index: usize) -> Operation {
        self.operations.remove(index)
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.operations.truncate(len);
    }

    pub(crate) fn extend(&mut self, operations: impl IntoIterator<Item = Operation>) {
        self.operations.extend(operations);
    }

    pub(crate) fn clear(&mut self) {
        self.operations.clear();
    }

    /// Returns the number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Indicates whether the patch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns an iterator over the operations.
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// Returns the operations as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Operation] {
        &self.operations
    }

    /// Consumes the patch and returns the operations.
    #[must_use]
    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    /// Returns the byte length of the whole serialized patch, brackets included.
    pub fn encoded_len(&self, encoder: &dyn Encoder) -> Result<usize, EncodeError> {
        Ok(encoded_len_of(&self.operations, encoder)? + 2)
    }

    /// Serializes the patch as compact JSON.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the patch as indented JSON.
    pub fn to_json_string_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Builds the patch that undoes `self` once it has been applied to `source`.
    ///
    /// The inverse guards every destructive step with a `test`.
    ///
    /// ```
    /// # use jsondiff_core::{DiffOptions, Node};
    /// let source = Node::from_json_str(r#"{"a":[1,2],"b":"x"}"#)?;
    /// let target = Node::from_json_str(r#"{"a":[1,2,3]}"#)?;
    /// let patch = source.diff(&target, &DiffOptions::default())?;
    /// let inverse = patch.invert(&source)?;
    /// assert_eq!(target.apply_patch(&inverse)?, source);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn invert(&self, source: &Node) -> Result<Patch, PatchError> {
        let mut document = source.clone();
        let mut groups = Vec::with_capacity(self.operations.len());
        for operation in &self.operations {
            let displaced = displaced_value(&document, operation)?;
            apply_operation(&mut document, operation)?;
            groups.push(undo(operation, displaced, &document)?);
        }
        Ok(groups.into_iter().rev().flatten().collect())
    }
}

/// Serialized length of a run of operations, separators included.
pub(crate) fn encoded_len_of(operations: &[Operation], encoder: &dyn Encoder) -> Result<usize, EncodeError> {
    let mut total = operations.len().saturating_sub(1);
    for operation in operations {
        total += operation.encoded_len(encoder)?;
    }
    Ok(total)
}

/// Length of `text` rendered as a JSON string literal.
fn quoted_len(text: &str) -> usize {
    let escaped: usize = text
        .chars()
        .map(|ch| match ch {
            '"' | '\\' | '\u{8}' | '\u{c}' | '\n' | '\r' | '\t' => 2,
            ch if ch < '\u{20}' => 6,
            ch => ch.len_utf8(),
        })
        .sum();
    escaped + 2
}

/// The value an operation is about to overwrite or delete.
fn displaced_value(document: &Node, operation: &Operation) -> Result<Option<Node>, PatchError> {
    let path = &operation.path;
    match operation.kind {
        OperationKind::Test => Ok(None),
        OperationKind::Remove | OperationKind::Replace => Ok(document.pointer(path).cloned()),
        OperationKind::Add | OperationKind::Copy | OperationKind::Move => {
            if operation.kind == OperationKind::Move && operation.required_from()? == path {
                return Ok(None);
            }
            let Some((parent, key)) = path.split_last() else {
                return Ok(Some(document.clone()));
            };
            match document.pointer(&parent) {
                Some(Node::Object(map)) => Ok(map.get(&key).cloned()),
                _ => Ok(None),
            }
        }
    }
}

/// Rewrites a trailing `-` into the index the appended element now occupies.
fn concrete_path(path: &Pointer, after: &Node) -> Pointer {
    let Some((parent, last)) = path.split_last() else {
        return path.clone();
    };
    if last != crate::diff::APPEND_TOKEN {
        return path.clone();
    }
    match after.pointer(&parent) {
        Some(Node::Array(items)) if !items.is_empty() => {
            path.with_last(&(items.len() - 1).to_string())
        }
        _ => path.clone(),
    }
}

fn undo(
    operation: &Operation,
    displaced: Option<Node>,
    after: &Node,
) -> Result<Vec<Operation>, PatchError> {
    let path = &operation.path;
    let not_found = || PatchError::PathNotFound { path: path.to_string() };
    match operation.kind {
        OperationKind::Test => Ok(Vec::new()),
        OperationKind::Remove => Ok(vec![Operation::add(path.clone(), displaced.ok_or_else(not_found)?)]),
        OperationKind::Replace => {
            let current = operation.required_value()?.clone();
            let previous = displaced.ok_or_else(not_found)?;
            Ok(vec![
                Operation::test(path.clone(), current.clone()),
                Operation::replace(path.clone(), current, previous),
            ])
        }
        OperationKind::Add | OperationKind::Copy => {
            let concrete = concrete_path(path, after);
            let current = after.pointer(&concrete).cloned().ok_or_else(not_found)?;
            let restore = match displaced {
                Some(previous) => Operation::replace(concrete.clone(), current.clone(), previous),
                None => Operation::remove(concrete.clone(), current.clone()),
            };
            Ok(vec![Operation::test(concrete, current), restore])
        }
        OperationKind::Move => {
            let from = operation.required_from()?;
            if from == path {
                return Ok(Vec::new());
            }
            let concrete = concrete_path(path, after);
            let current = after.pointer(&concrete).cloned().ok_or_else(not_found)?;
            // The destination swallowed the source's old container.
            let encloses_source = concrete.is_root() || concrete.is_proper_prefix_of(from);
            Ok(match displaced {
                Some(previous) if encloses_source => vec![
                    Operation::test(concrete.clone(), current.clone()),
                    Operation::replace(concrete, current, previous),
                ],
                Some(previous) => vec![
                    Operation::move_from(concrete.clone(), from.clone(), current),
                    Operation::add(concrete, previous),
                ],
                None if encloses_source => vec![
                    Operation::test(concrete.clone(), current.clone()),
                    Operation::remove(concrete, current.clone()),
                    Operation::add(from.clone(), current),
                ],
                None => vec![Operation::move_from(concrete, from.clone(), current)],
            })
        }
    }
}

impl IntoIterator for Patch {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

impl<'a> IntoIterator for &'a Patch {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

impl From<Vec<Operation>> for Patch {
    fn from(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}

impl FromIterator<Operation> for Patch {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self { operations: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonEncoder;

    fn ptr(text: &str) -> Pointer {
        Pointer::parse(text).unwrap()
    }

    fn node(text: &str) -> Node {
        Node::from_json_str(text).unwrap()
    }

    #[test]
    fn wire_form_omits_members_the_kind_does_not_carry() {
        let patch = Patch::from(vec![
            Operation::remove(ptr("/a"), node("1")),
            Operation::move_from(ptr("/a"), ptr("/b"), node("1")),
            Operation::copy_from(ptr("/b"), ptr("/c"), node("1")),
            Operation::test(ptr(""), node("null")),
        ]);
        assert_eq!(
            patch.to_json_string().unwrap(),
            concat!(
                r#"[{"op":"remove","path":"/a"},"#,
                r#"{"op":"move","from":"/a","path":"/b"},"#,
                r#"{"op":"copy","from":"/b","path":"/c"},"#,
                r#"{"op":"test","path":"","value":null}]"#
            )
        );
    }

    #[test]
    fn deserialize_keeps_explicit_null_and_rejects_missing_members() {
        let patch: Patch =
            serde_json::from_str(r#"[{"op":"replace","path":"/x","value":null,"extra":1}]"#)
                .unwrap();
        assert_eq!(patch.as_slice()[0].value, Some(Node::Null));

        let err = serde_json::from_str::<Patch>(r#"[{"op":"add","path":"/x"}]"#).unwrap_err();
        assert!(err.to_string().contains("missing \"value\""), "{err}");
        let err = serde_json::from_str::<Patch>(r#"[{"op":"copy","path":"/x"}]"#).unwrap_err();
        assert!(err.to_string().contains("missing \"from\""), "{err}");
        assert!(serde_json::from_str::<Patch>(r#"[{"op":"frob","path":""}]"#).is_err());
        assert!(serde_json::from_str::<Patch>(r#"[{"op":"remove","path":"x"}]"#).is_err());
    }

    #[test]
    fn encoded_len_matches_serializer_output() {
        let patch = Patch::from(vec![
            Operation::add(ptr("/we\"ird~1key"), node(r#"{"n":[1.5,-2,"\u0001\n"]}"#)),
            Operation::remove(ptr("/a"), node("true")),
            Operation::move_from(ptr("/é"), ptr("/b/-"), node("1")),
        ]);
        let wire = patch.to_json_string().unwrap();
        assert_eq!(patch.encoded_len(&JsonEncoder).unwrap(), wire.len());
        assert_eq!(Patch::new().encoded_len(&JsonEncoder).unwrap(), "[]".len());
    }

    #[test]
    fn encoder_failures_surface() {
        let failing = |_: &Node| -> Result<Vec<u8>, EncodeError> { Err(EncodeError::custom("nope")) };
        let op = Operation::add(ptr("/a"), node("1"));
        assert!(op.encoded_len(&failing).is_err());
        let remove = Operation::remove(ptr("/a"), node("1"));
        assert!(remove.encoded_len(&failing).is_ok());
    }

    #[test]
    fn inverse_restores_overwritten_members() {
        let source = node(r#"{"a":1,"b":2,"list":[1,2]}"#);
        let patch = Patch::from(vec![
            Operation::move_from(ptr("/a"), ptr("/b"), node("1")),
            Operation::add(ptr("/list/-"), node("3")),
            Operation::copy_from(ptr("/b"), ptr("/list/0"), node("1")),
        ]);
        let patched = source.apply_patch(&patch).unwrap();
        assert_eq!(patched, node(r#"{"b":1,"list":[1,1,2,3]}"#));
        let inverse = patch.invert(&source).unwrap();
        assert_eq!(
            inverse.to_json_string().unwrap(),
            concat!(
                r#"[{"op":"test","path":"/list/0","value":1},"#,
                r#"{"op":"remove","path":"/list/0"},"#,
                r#"{"op":"test","path":"/list/2","value":3},"#,
                r#"{"op":"remove","path":"/list/2"},"#,
                r#"{"op":"move","from":"/b","path":"/a"},"#,
                r#"{"op":"add","path":"/b","value":2}]"#
            )
        );
        assert_eq!(patched.apply_patch(&inverse).unwrap(), source);
    }

    #[test]
    fn inverse_of_root_replacement() {
        let source = node("[1]");
        let patch = Patch::from(vec![Operation::add(Pointer::root(), node(r#"{"x":1}"#))]);
        let inverse = patch.invert(&source).unwrap();
        let patched = source.apply_patch(&patch).unwrap();
        assert_eq!(patched.apply_patch(&inverse).unwrap(), source);
    }

    #[test]
    fn inverse_of_moves_onto_an_enclosing_location() {
        let source = node(r#"{"wrap":[{"x":"inner"}],"list":[{"x":1,"y":2}]}"#);
        let patch = Patch::from(vec![
            Operation::move_from(ptr("/wrap/0"), ptr("/wrap"), node(r#"{"x":"inner"}"#)),
            Operation::move_from(ptr("/list/0/x"), ptr("/list/0"), node("1")),
        ]);
        let patched = source.apply_patch(&patch).unwrap();
        assert_eq!(patched, node(r#"{"wrap":{"x":"inner"},"list":[1,{"y":2}]}"#));
        let inverse = patch.invert(&source).unwrap();
        assert_eq!(patched.apply_patch(&inverse).unwrap(), source);
    }

    #[test]
    fn inverse_propagates_apply_errors() {
        let patch = Patch::from(vec![Operation::remove(ptr("/missing"), node("1"))]);
        assert_eq!(
            patch.invert(&node("{}")).unwrap_err(),
            PatchError::PathNotFound { path: "/missing".to_string() }
        );
    }
}
