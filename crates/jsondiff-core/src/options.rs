use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{diff::Pointer, EncodeError, Node, OptionsError};

/// Serializes values for cost estimation.
///
/// Rationalization compares the encoded size of candidate operations, so an
/// encoder must be deterministic. Closures with the matching signature
/// implement the trait.
///
/// ```
/// # use jsondiff_core::{EncodeError, Encoder, JsonEncoder, Node};
/// let value = Node::from_json_str("[1, 2]")?;
/// assert_eq!(JsonEncoder.encode(&value)?, b"[1,2]");
///
/// let fixed = |_: &Node| -> Result<Vec<u8>, EncodeError> { Ok(vec![0; 4]) };
/// assert_eq!(fixed.encode(&value)?.len(), 4);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Encoder: Send + Sync {
    /// Encodes a value into bytes.
    fn encode(&self, value: &Node) -> Result<Vec<u8>, EncodeError>;
}

impl<F> Encoder for F
where
    F: Fn(&Node) -> Result<Vec<u8>, EncodeError> + Send + Sync,
{
    fn encode(&self, value: &Node) -> Result<Vec<u8>, EncodeError> {
        self(value)
    }
}

/// The default encoder: compact JSON via `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn encode(&self, value: &Node) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(value)?)
    }
}

#[derive(Clone)]
struct EncoderHandle(Arc<dyn Encoder>);

impl Default for EncoderHandle {
    fn default() -> Self {
        Self(Arc::new(JsonEncoder))
    }
}

impl fmt::Debug for EncoderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Encoder")
    }
}

/// Configuration for a comparison.
///
/// Options are fixed for the duration of a comparison. The encoder is not
/// serialized and falls back to [`JsonEncoder`] when deserialized.
///
/// ```
/// # use jsondiff_core::DiffOptions;
/// let opts: DiffOptions = serde_json::from_str(r#"{"factorize":true,"ignores":["/meta"]}"#)?;
/// assert!(opts.factorize());
/// assert!(opts.is_ignored("/meta"));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffOptions {
    factorize: bool,
    rationalize: bool,
    invertible: bool,
    equivalent: bool,
    ignores: BTreeSet<Pointer>,
    #[serde(skip)]
    encoder: EncoderHandle,
}

impl DiffOptions {
    /// Returns whether add/remove pairs are collapsed into `move` and unchanged values reused via `copy`.
    #[must_use]
    pub fn factorize(&self) -> bool {
        self.factorize
    }

    /// Returns whether subtrees are collapsed into a single `replace` when that is cheaper.
    #[must_use]
    pub fn rationalize(&self) -> bool {
        self.rationalize
    }

    /// Returns whether `test` operations guard destructive operations.
    #[must_use]
    pub fn invertible(&self) -> bool {
        self.invertible
    }

    /// Returns whether arrays compare as multisets.
    #[must_use]
    pub fn equivalent(&self) -> bool {
        self.equivalent
    }

    /// Returns the ignored locations.
    #[must_use]
    pub fn ignores(&self) -> &BTreeSet<Pointer> {
        &self.ignores
    }

    /// Returns the cost estimation encoder.
    #[must_use]
    pub fn encoder(&self) -> &dyn Encoder {
        self.encoder.0.as_ref()
    }

    /// Enables or disables move/copy factorization.
    ///
    /// ```
    /// # use jsondiff_core::DiffOptions;
    /// assert!(DiffOptions::default().with_factorize(true).factorize());
    /// ```
    #[must_use]
    pub fn with_factorize(mut self, enabled: bool) -> Self {
        self.factorize = enabled;
        self
    }

    /// Enables or disables rationalization.
    #[must_use]
    pub fn with_rationalize(mut self, enabled: bool) -> Self {
        self.rationalize = enabled;
        self
    }

    /// Enables or disables invertible patches.
    ///
    /// Invertible patches never contain `copy` operations.
    #[must_use]
    pub fn with_invertible(mut self, enabled: bool) -> Self {
        self.invertible = enabled;
        self
    }

    /// Enables or disables multiset array equivalence.
    #[must_use]
    pub fn with_equivalent(mut self, enabled: bool) -> Self {
        self.equivalent = enabled;
        self
    }

    /// Adds locations that are excluded from the comparison.
    ///
    /// ```
    /// # use jsondiff_core::{DiffOptions, OptionsError};
    /// let opts = DiffOptions::default().with_ignores(["/a", "/b/0"])?;
    /// assert_eq!(opts.ignores().len(), 2);
    /// assert!(DiffOptions::default().with_ignores(["a"]).is_err());
    /// # Ok::<(), OptionsError>(())
    /// ```
    pub fn with_ignores<I, S>(mut self, pointers: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pointer in pointers {
            self.ignores.insert(Pointer::parse(pointer.as_ref())?);
        }
        Ok(self)
    }

    /// Replaces the cost estimation encoder.
    #[must_use]
    pub fn with_encoder<E>(mut self, encoder: E) -> Self
    where
        E: Encoder + 'static,
    {
        self.encoder = EncoderHandle(Arc::new(encoder));
        self
    }

    /// Returns whether the location is ignored.
    #[must_use]
    pub fn is_ignored(&self, pointer: &str) -> bool {
        !self.ignores.is_empty() && self.ignores.contains(pointer)
    }

    /// Returns whether an ignored location lies at or beneath `base`.
    #[must_use]
    pub fn ignores_within(&self, base: &Pointer) -> bool {
        self.ignores.iter().any(|ignored| ignored.starts_with(base))
    }

    /// Copies the boolean toggles and ignores of `other` into `self`, keeping the encoder.
    #[must_use]
    pub fn merged_with(mut self, other: &DiffOptions) -> Self {
        self.factorize |= other.factorize;
        self.rationalize |= other.rationalize;
        self.invertible |= other.invertible;
        self.equivalent |= other.equivalent;
        self.ignores.extend(other.ignores.iter().cloned());
        self
    }
}

impl fmt::Display for DiffOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.factorize, "factorize"),
            (self.rationalize, "rationalize"),
            (self.invertible, "invertible"),
            (self.equivalent, "equivalent"),
        ];
        let enabled: Vec<_> = flags.iter().filter(|(on, _)| *on).map(|(_, name)| *name).collect();
        if enabled.is_empty() {
            f.write_str("default")
        } else {
            f.write_str(&enabled.join("+"))
        }
    }
}
