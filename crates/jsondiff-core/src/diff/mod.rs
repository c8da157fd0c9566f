//! The diff engine.
//!
//! A [`Differ`] walks the source and target documents once (twice when
//! factorization is enabled) and appends RFC 6902 operations to a [`Patch`].
//! The pointer builder, hash index and patch buffer are owned by the differ
//! and reused across comparisons.

mod array;
mod index;
mod object;
pub(crate) mod pointer;

pub use pointer::{Pointer, PointerBuf, APPEND_TOKEN};

use tracing::{debug, trace};

use self::{index::HashIndex, pointer::parse_index};
use crate::{patch::encoded_len_of, DiffError, DiffOptions, Node, Operation, OperationKind, Patch};

/// Generates JSON Patches.
///
/// A differ is cheap to reuse: [`Differ::compare`] resets the internal
/// buffers while keeping their storage. Independent differs share nothing
/// and can run on separate threads.
///
/// ```
/// # use jsondiff_core::{diff::Differ, DiffOptions, Node};
/// let mut differ = Differ::new(DiffOptions::default().with_factorize(true));
/// let source = Node::from_json_str(r#"{"a":5,"b":{}}"#)?;
/// let target = Node::from_json_str(r#"{"b":{"c":5}}"#)?;
/// let patch = differ.compare(&source, &target)?;
/// assert_eq!(patch.to_json_string()?, r#"[{"op":"move","from":"/a","path":"/b/c"}]"#);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct Differ {
    options: DiffOptions,
    patch: Patch,
    pointer: PointerBuf,
    index: HashIndex,
    marks: Vec<usize>,
}

impl Differ {
    /// Creates a differ using `options` for every comparison.
    #[must_use]
    pub fn new(options: DiffOptions) -> Self {
        Self { options, ..Self::default() }
    }

    /// Returns the options in use.
    #[must_use]
    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Returns the patch produced by the last comparison.
    #[must_use]
    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    /// Consumes the differ and returns the last patch.
    #[must_use]
    pub fn into_patch(self) -> Patch {
        self.patch
    }

    /// Empties the buffers, keeping their allocations.
    pub fn reset(&mut self) {
        self.patch.clear();
        self.pointer.clear();
        self.index.clear();
        self.marks.clear();
    }

    /// Computes the operations that turn `source` into `target`.
    ///
    /// Fails only when the configured encoder fails during rationalization,
    /// in which case the partial patch must be discarded.
    pub fn compare(&mut self, source: &Node, target: &Node) -> Result<&Patch, DiffError> {
        self.reset();
        if self.options.factorize() && source != target {
            self.index.prepare(&self.options, &mut self.pointer, source, target);
            self.pointer.clear();
        }
        self.diff(target, source, target)?;
        debug!(
            options = %self.options,
            indexed = self.index.len(),
            operations = self.patch.len(),
            "compared documents"
        );
        Ok(&self.patch)
    }

    /// Compares `source` against `target` at the current pointer. `document`
    /// is the whole target, against which copy sources are confirmed.
    fn diff(&mut self, document: &Node, source: &Node, target: &Node) -> Result<(), DiffError> {
        if self.options.is_ignored(self.pointer.as_str()) {
            return Ok(());
        }
        if !source.is_comparable(target) {
            if self.pointer.is_root() {
                // RFC 6902 4.1: adding at the root replaces the whole document.
                if self.options.invertible() {
                    self.patch.append(Operation::test(Pointer::root(), source.clone()));
                }
                let mut op = Operation::add(Pointer::root(), target.clone());
                op.old_value = Some(source.clone());
                self.patch.append(op);
            } else {
                self.replace(source, target);
            }
            return Ok(());
        }
        if source == target {
            return Ok(());
        }

        let start = self.patch.len();
        self.marks.push(start);
        let outcome = match (source, target) {
            (Node::Array(lhs), Node::Array(rhs)) => self.compare_arrays(document, lhs, rhs),
            (Node::Object(lhs), Node::Object(rhs)) => self.compare_objects(document, lhs, rhs),
            _ => {
                self.replace(source, target);
                Ok(())
            }
        };
        let start = self.marks.pop().unwrap_or(start);
        outcome?;

        if self.options.rationalize()
            && self.patch.len() > start
            && matches!(source, Node::Array(_) | Node::Object(_))
        {
            self.rationalize(start, source, target)?;
        }
        Ok(())
    }

    fn replace(&mut self, source: &Node, target: &Node) {
        let path = self.pointer.snapshot();
        if self.options.invertible() {
            self.patch.append(Operation::test(path.clone(), source.clone()));
        }
        self.patch.append(Operation::replace(path, source.clone(), target.clone()));
    }

    fn remove(&mut self, path: Pointer, value: &Node) {
        if self.options.invertible() {
            self.patch.append(Operation::test(path.clone(), value.clone()));
        }
        self.patch.append(Operation::remove(path, value.clone()));
    }

    fn add(&mut self, document: &Node, path: Pointer, value: &Node) {
        if !self.options.factorize() {
            self.patch.append(Operation::add(path, value.clone()));
            return;
        }
        if let Some(position) = self.find_removed(&path, value) {
            let removed = self.patch.remove_at(position);
            for mark in &mut self.marks {
                if *mark > position {
                    *mark -= 1;
                }
            }
            trace!(from = %removed.path, path = %path, "collapsed remove and add into move");
            self.patch.append(Operation::move_from(removed.path, path, value.clone()));
            return;
        }
        if !self.options.invertible() {
            let source = self
                .index
                .find(document, value)
                .filter(|from| !from.is_proper_prefix_of(&path));
            if let Some(from) = source.cloned() {
                trace!(from = %from, path = %path, "reusing unchanged value");
                self.patch.append(Operation::copy_from(from, path, value.clone()));
                return;
            }
        }
        self.patch.append(Operation::add(path, value.clone()));
    }

    /// Finds the first emitted `remove` of `value` that can be turned into a
    /// move to `path`.
    ///
    /// The move performs the removal where the add sits, so every operation
    /// emitted in between must be unaffected by the delay.
    fn find_removed(&self, path: &Pointer, value: &Node) -> Option<usize> {
        let operations = self.patch.as_slice();
        (0..operations.len()).find(|&position| {
            let op = &operations[position];
            op.kind == OperationKind::Remove
                && op.old_value.as_ref() == Some(value)
                && !op.path.is_proper_prefix_of(path)
                && operations[position + 1..].iter().all(|later| !interferes(&op.path, later))
        })
    }

    /// Collapses the operations emitted since `start` into a single replace
    /// when that serializes strictly smaller.
    fn rationalize(&mut self, start: usize, source: &Node, target: &Node) -> Result<(), DiffError> {
        let path = self.pointer.snapshot();
        if self.options.ignores_within(&path) {
            return Ok(());
        }
        let emitted = &self.patch.as_slice()[start..];
        let escapes = emitted.iter().any(|op| {
            op.kind == OperationKind::Move && op.from.as_ref().is_some_and(|from| !from.starts_with(&path))
        });
        if escapes {
            return Ok(());
        }

        let mut candidate = Vec::with_capacity(2);
        if self.options.invertible() {
            candidate.push(Operation::test(path.clone(), source.clone()));
        }
        candidate.push(Operation::replace(path, source.clone(), target.clone()));

        let encoder = self.options.encoder();
        let current = encoded_len_of(emitted, encoder)?;
        let collapsed = encoded_len_of(&candidate, encoder)?;
        if collapsed < current {
            trace!(path = %self.pointer, current, collapsed, "rationalized subtree");
            self.patch.truncate(start);
            self.patch.extend(candidate);
        }
        Ok(())
    }
}

/// Reports whether delaying the removal of `removed` past `later` changes
/// what `later` does.
fn interferes(removed: &Pointer, later: &Operation) -> bool {
    let siblings = removed
        .split_last()
        .filter(|(_, last)| parse_index(last).is_some())
        .map(|(parent, _)| parent);
    let touches = |location: &Pointer| {
        location.starts_with(removed)
            || removed.starts_with(location)
            || siblings.as_ref().is_some_and(|parent| parent.is_proper_prefix_of(location))
    };
    touches(&later.path) || later.from.as_ref().is_some_and(touches)
}

/// Computes the patch turning `source` into `target`.
///
/// ```
/// # use jsondiff_core::{diff::diff_nodes, DiffOptions, Node};
/// let source = Node::from_json_str("[1,2,3]")?;
/// let target = Node::from_json_str("[1,2,3,4]")?;
/// let patch = diff_nodes(&source, &target, &DiffOptions::default())?;
/// assert_eq!(patch.to_json_string()?, r#"[{"op":"add","path":"/-","value":4}]"#);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn diff_nodes(source: &Node, target: &Node, options: &DiffOptions) -> Result<Patch, DiffError> {
    let mut differ = Differ::new(options.clone());
    differ.compare(source, target)?;
    Ok(differ.into_patch())
}

/// Decodes two JSON documents and computes the patch between them.
///
/// ```
/// # use jsondiff_core::{diff::compare_json, DiffOptions};
/// let patch = compare_json(r#"{"a":1,"b":2}"#, r#"{"b":2}"#, &DiffOptions::default())?;
/// assert_eq!(patch.to_json_string()?, r#"[{"op":"remove","path":"/a"}]"#);
/// assert!(compare_json("{", "{}", &DiffOptions::default()).is_err());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn compare_json(source: &str, target: &str, options: &DiffOptions) -> Result<Patch, DiffError> {
    let source = Node::from_json_str(source)?;
    let target = Node::from_json_str(target)?;
    diff_nodes(&source, &target, options)
}
