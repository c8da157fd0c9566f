//! Content hashing for JSON nodes.
//!
//! Structurally equal nodes always produce the same digest. Digests are not
//! injective, so callers that act on a match confirm it with deep equality.

use std::collections::BTreeMap;

use crate::Node;

/// Type alias representing the 64-bit hash code used throughout the diff engine.
///
/// ```
/// # use jsondiff_core::hash_bytes;
/// let code = hash_bytes(b"jsondiff");
/// assert_ne!(code, 0);
/// ```
pub type HashCode = u64;

const NULL_HASH: HashCode = 0x88E0_32E6_CCAB_73FE;
const BOOL_TRUE_HASH: HashCode = 0x1CDC_59AF_E4E3_6B24;
const BOOL_FALSE_HASH: HashCode = 0xBF1F_7E0A_D177_38C6;
const STRING_SEED: [u8; 8] = [0x3A, 0x91, 0x0C, 0x5E, 0x72, 0xD4, 0x18, 0xB6];
const LIST_SEED: [u8; 8] = [0xF5, 0x18, 0x0A, 0x71, 0xA4, 0xC4, 0x03, 0xF3];
const OBJECT_SEED: [u8; 8] = [0x00, 0x5D, 0x39, 0xA4, 0x18, 0x10, 0xEA, 0xD5];

/// Streaming FNV-1a state.
#[derive(Clone, Copy)]
struct Fnv1a(u64);

impl Fnv1a {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    const fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    fn write(&mut self, input: &[u8]) {
        for byte in input {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn finish(self) -> HashCode {
        self.0
    }
}

/// Compute the FNV-1a hash of the provided bytes.
///
/// ```
/// # use jsondiff_core::hash_bytes;
/// let code = hash_bytes(b"diff");
/// let same = hash_bytes(b"diff");
/// assert_eq!(code, same);
/// ```
#[must_use]
pub fn hash_bytes(input: &[u8]) -> HashCode {
    let mut hasher = Fnv1a::new();
    hasher.write(input);
    hasher.finish()
}

/// Combine a collection of hash codes into a single aggregate hash.
///
/// The result does not depend on the order of `codes`.
///
/// ```
/// # use jsondiff_core::{combine, hash_bytes};
/// let ab = combine(vec![hash_bytes(b"a"), hash_bytes(b"b")]);
/// let ba = combine(vec![hash_bytes(b"b"), hash_bytes(b"a")]);
/// assert_eq!(ab, ba);
/// ```
#[must_use]
pub fn combine(mut codes: Vec<HashCode>) -> HashCode {
    codes.sort_unstable();
    let mut hasher = Fnv1a::new();
    for code in codes {
        hasher.write(&code.to_le_bytes());
    }
    hasher.finish()
}

/// Computes the content digest of a node.
///
/// Arrays are hashed in order, object members are combined commutatively.
///
/// ```
/// # use jsondiff_core::{digest, Node};
/// let lhs = Node::from_json_str(r#"{"a":1,"b":[1,2]}"#)?;
/// let rhs = Node::from_json_str(r#"{"b":[1,2],"a":1}"#)?;
/// assert_eq!(digest(&lhs), digest(&rhs));
///
/// let reordered = Node::from_json_str(r#"{"a":1,"b":[2,1]}"#)?;
/// assert_ne!(digest(&lhs), digest(&reordered));
/// # Ok::<(), jsondiff_core::CanonicalizeError>(())
/// ```
#[must_use]
pub fn digest(node: &Node) -> HashCode {
    match node {
        Node::Null => NULL_HASH,
        Node::Bool(true) => BOOL_TRUE_HASH,
        Node::Bool(false) => BOOL_FALSE_HASH,
        Node::Number(n) => n.hash_code(),
        Node::String(s) => {
            let mut hasher = Fnv1a::new();
            hasher.write(&STRING_SEED);
            hasher.write(s.as_bytes());
            hasher.finish()
        }
        Node::Array(values) => hash_list(values),
        Node::Object(map) => hash_object(map),
    }
}

fn hash_list(values: &[Node]) -> HashCode {
    let mut hasher = Fnv1a::new();
    hasher.write(&LIST_SEED);
    for value in values {
        hasher.write(&digest(value).to_le_bytes());
    }
    hasher.finish()
}

fn hash_object(map: &BTreeMap<String, Node>) -> HashCode {
    let mut members = Vec::with_capacity(map.len() + 1);
    members.push(hash_bytes(&OBJECT_SEED));
    for (key, value) in map {
        let mut hasher = Fnv1a::new();
        hasher.write(key.as_bytes());
        hasher.write(&[0xFF]);
        hasher.write(&digest(value).to_le_bytes());
        members.push(hasher.finish());
    }
    combine(members)
}
