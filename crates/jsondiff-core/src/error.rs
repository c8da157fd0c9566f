use thiserror::Error;

/// Errors that can occur while canonicalizing external data into [`Node`](crate::Node).
#[derive(Debug, Error)]
pub enum CanonicalizeError {
    /// The provided JSON input was invalid.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The provided YAML input was invalid.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Encountered a number that cannot be represented as an IEEE-754 f64.
    #[error("number {value} cannot be represented as f64")]
    NumberOutOfRange {
        /// The textual representation of the offending number.
        value: String,
    },
    /// YAML maps may only contain string keys.
    #[error("unsupported YAML key type: {found}")]
    NonStringYamlKey {
        /// A description of the key that triggered the error.
        found: String,
    },
    /// YAML tags have no JSON counterpart.
    #[error("unsupported YAML tag: {tag}")]
    UnsupportedYamlTag {
        /// The tag identifier encountered in the document.
        tag: String,
    },
    /// Attempted to construct a [`Number`](crate::Number) that is not finite.
    #[error("non-finite number encountered: {value}")]
    NotFinite {
        /// The offending numeric value.
        value: f64,
    },
}

/// Errors produced when parsing JSON Pointer text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PointerError {
    /// Non-root pointers must start with `/`.
    #[error("JSON Pointer {pointer:?} must be empty or start with '/'")]
    MissingLeadingSlash {
        /// The rejected pointer text.
        pointer: String,
    },
    /// `~` must be followed by `0` or `1`.
    #[error("JSON Pointer {pointer:?} has an invalid escape at byte {offset}")]
    InvalidEscape {
        /// The rejected pointer text.
        pointer: String,
        /// Byte offset of the offending `~`.
        offset: usize,
    },
}

/// Errors emitted when constructing [`DiffOptions`](crate::DiffOptions).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    /// An ignored path is not a valid JSON Pointer.
    #[error("invalid ignore path: {0}")]
    InvalidIgnore(#[from] PointerError),
}

/// Errors returned by an [`Encoder`](crate::Encoder).
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The JSON serializer rejected the value.
    #[error("failed to encode value as JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A custom encoder failed.
    #[error("failed to encode value: {message}")]
    Custom {
        /// Description supplied by the encoder.
        message: String,
    },
}

impl EncodeError {
    /// Builds an [`EncodeError::Custom`] from any displayable message.
    ///
    /// ```
    /// # use jsondiff_core::EncodeError;
    /// let err = EncodeError::custom("boom");
    /// assert_eq!(err.to_string(), "failed to encode value: boom");
    /// ```
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom { message: message.into() }
    }
}

/// Errors that abort a comparison.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The cost estimator could not encode a value; the comparison output is undefined.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// One of the input documents could not be decoded.
    #[error(transparent)]
    Decode(#[from] CanonicalizeError),
}

/// Errors that can occur while applying or inverting a patch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatchError {
    /// No value exists at the referenced location.
    #[error("path {path} does not exist")]
    PathNotFound {
        /// The location that could not be resolved.
        path: String,
    },
    /// An array was addressed with something other than a valid index.
    #[error("invalid array index {token:?} in {path}")]
    InvalidIndex {
        /// The location being resolved.
        path: String,
        /// The offending reference token.
        token: String,
    },
    /// A scalar was addressed as if it were a container.
    #[error("found scalar at parent of {path}: expected JSON object or array")]
    NotAContainer {
        /// The location whose parent is a scalar.
        path: String,
    },
    /// A `test` operation did not match the document.
    #[error("test failed at {path}: expected {expected}, found {found}")]
    TestFailed {
        /// The tested location.
        path: String,
        /// The expected value, rendered as JSON.
        expected: String,
        /// The actual value, rendered as JSON.
        found: String,
    },
    /// The operation lacks a member required by its kind.
    #[error("{op} operation at {path} is missing \"{member}\"")]
    MissingMember {
        /// Operation name.
        op: String,
        /// Operation path.
        path: String,
        /// Name of the missing member.
        member: &'static str,
    },
    /// `move` would place a location inside itself.
    #[error("cannot move {from} into its own descendant {path}")]
    MoveIntoDescendant {
        /// Source location.
        from: String,
        /// Destination location.
        path: String,
    },
    /// The document root cannot be removed.
    #[error("cannot remove the document root")]
    RemoveRoot,
}
