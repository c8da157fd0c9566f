//! JSON Patch (RFC 6902) generation.
//!
//! `jsondiff-core` compares two JSON documents and produces the operations
//! that turn the first into the second. Optional modes collapse remove/add
//! pairs into `move`, reuse unchanged values through `copy`, fold subtrees
//! into a single `replace` when that is cheaper, guard destructive operations
//! with `test`, and treat arrays as multisets.
//!
//! ```
//! use jsondiff_core::{DiffOptions, Node};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Node::from_json_str(r#"{"name":"jsondiff","tags":["a"],"draft":true}"#)?;
//!     let target = Node::from_json_str(r#"{"name":"jsondiff","tags":["a","b"]}"#)?;
//!
//!     let options = DiffOptions::default().with_invertible(true);
//!     let patch = source.diff(&target, &options)?;
//!     assert_eq!(
//!         patch.to_json_string()?,
//!         r#"[{"op":"test","path":"/draft","value":true},{"op":"remove","path":"/draft"},{"op":"add","path":"/tags/-","value":"b"}]"#
//!     );
//!
//!     let patched = source.apply_patch(&patch)?;
//!     assert_eq!(patched, target);
//!     assert_eq!(patched.apply_patch(&patch.invert(&source)?)?, source);
//!     Ok(())
//! }
//! ```
//!
//! Numbers are stored as `f64`, so `1` and `1.0` are the same value for
//! every comparison the engine makes.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod apply;
pub mod diff;
mod error;
mod hash;
mod node;
mod number;
mod options;
mod patch;

pub use diff::{compare_json, diff_nodes, Differ, Pointer, PointerBuf};
pub use error::{CanonicalizeError, DiffError, EncodeError, OptionsError, PatchError, PointerError};
pub use hash::{combine, digest, hash_bytes, HashCode};
pub use node::Node;
pub use number::Number;
pub use options::{DiffOptions, Encoder, JsonEncoder};
pub use patch::{Operation, OperationKind, Patch};

/// Returns the semantic version of the `jsondiff-core` crate.
///
/// ```
/// assert!(!jsondiff_core::version().is_empty());
/// ```
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
