use std::borrow::Borrow;
use std::fmt::{self, Write as _};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PointerError;

/// Token used by JSON Patch to address the slot past the end of an array.
pub const APPEND_TOKEN: &str = "-";

/// An immutable JSON Pointer (RFC 6901).
///
/// The empty pointer addresses the document root.
///
/// ```
/// # use jsondiff_core::diff::Pointer;
/// let pointer = Pointer::parse("/a~1b/0")?;
/// assert_eq!(pointer.tokens().collect::<Vec<_>>(), ["a/b", "0"]);
/// assert!(Pointer::parse("a").is_err());
/// # Ok::<(), jsondiff_core::PointerError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Pointer(String);

impl Pointer {
    /// Returns the pointer to the document root.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Validates pointer text.
    pub fn parse(text: &str) -> Result<Self, PointerError> {
        validate(text)?;
        Ok(Self(text.to_owned()))
    }

    /// Builds a pointer from unescaped reference tokens.
    ///
    /// ```
    /// # use jsondiff_core::diff::Pointer;
    /// let pointer = Pointer::from_tokens(["a/b", "~"]);
    /// assert_eq!(pointer.as_str(), "/a~1b/~0");
    /// ```
    #[must_use]
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut buf = PointerBuf::new();
        for token in tokens {
            buf.push_key(token.as_ref());
        }
        buf.snapshot()
    }

    /// Returns the escaped pointer text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Indicates whether the pointer addresses the document root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the unescaped reference tokens.
    pub fn tokens(&self) -> impl Iterator<Item = String> + '_ {
        self.0.split('/').skip(1).map(unescape)
    }

    /// Returns true when `self` is `base` or lies beneath it.
    ///
    /// ```
    /// # use jsondiff_core::diff::Pointer;
    /// let base = Pointer::parse("/a")?;
    /// assert!(Pointer::parse("/a")?.starts_with(&base));
    /// assert!(Pointer::parse("/a/b")?.starts_with(&base));
    /// assert!(!Pointer::parse("/ab")?.starts_with(&base));
    /// # Ok::<(), jsondiff_core::PointerError>(())
    /// ```
    #[must_use]
    pub fn starts_with(&self, base: &Pointer) -> bool {
        match self.0.strip_prefix(base.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Returns true when `other` lies strictly beneath `self`.
    #[must_use]
    pub fn is_proper_prefix_of(&self, other: &Pointer) -> bool {
        self.0.len() < other.0.len() && other.starts_with(self)
    }

    /// Splits the pointer into its parent and its last (unescaped) token.
    ///
    /// ```
    /// # use jsondiff_core::diff::Pointer;
    /// let pointer = Pointer::parse("/items/3")?;
    /// let (parent, last) = pointer.split_last().unwrap();
    /// assert_eq!(parent.as_str(), "/items");
    /// assert_eq!(last, "3");
    /// assert!(Pointer::root().split_last().is_none());
    /// # Ok::<(), jsondiff_core::PointerError>(())
    /// ```
    #[must_use]
    pub fn split_last(&self) -> Option<(Pointer, String)> {
        let index = self.0.rfind('/')?;
        Some((Self(self.0[..index].to_owned()), unescape(&self.0[index + 1..])))
    }

    /// Returns a sibling pointer whose last token is replaced by `token`.
    pub(crate) fn with_last(&self, token: &str) -> Pointer {
        let parent = self.0.rfind('/').map_or("", |index| &self.0[..index]);
        let mut buf = PointerBuf { text: parent.to_owned(), offsets: Vec::new() };
        buf.push_key(token);
        buf.snapshot()
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Pointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Pointer {
    type Error = PointerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value)?;
        Ok(Self(value))
    }
}

impl From<Pointer> for String {
    fn from(value: Pointer) -> Self {
        value.0
    }
}

impl Borrow<str> for Pointer {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Pointer {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Mutable pointer builder reused across a whole traversal.
///
/// Tokens are pushed before descending into a child and popped on return;
/// [`PointerBuf::snapshot`] copies the current location when it has to be
/// stored.
///
/// ```
/// # use jsondiff_core::diff::PointerBuf;
/// let mut buf = PointerBuf::new();
/// buf.push_key("a/b");
/// buf.push_index(3);
/// assert_eq!(buf.as_str(), "/a~1b/3");
/// buf.pop();
/// buf.push_append();
/// assert_eq!(buf.snapshot().as_str(), "/a~1b/-");
/// buf.clear();
/// assert!(buf.is_root());
/// ```
#[derive(Clone, Debug, Default)]
pub struct PointerBuf {
    text: String,
    offsets: Vec<usize>,
}

impl PointerBuf {
    /// Creates a builder positioned at the document root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an object key, escaping `~` and `/`.
    pub fn push_key(&mut self, key: &str) {
        self.offsets.push(self.text.len());
        self.text.push('/');
        for ch in key.chars() {
            match ch {
                '~' => self.text.push_str("~0"),
                '/' => self.text.push_str("~1"),
                other => self.text.push(other),
            }
        }
    }

    /// Appends an array index.
    pub fn push_index(&mut self, index: usize) {
        self.offsets.push(self.text.len());
        // Writing into a String cannot fail.
        let _ = write!(self.text, "/{index}");
    }

    /// Appends the past-the-end array token `-`.
    pub fn push_append(&mut self) {
        self.offsets.push(self.text.len());
        self.text.push('/');
        self.text.push_str(APPEND_TOKEN);
    }

    /// Removes the most recently pushed token, returning false at the root.
    pub fn pop(&mut self) -> bool {
        match self.offsets.pop() {
            Some(offset) => {
                self.text.truncate(offset);
                true
            }
            None => false,
        }
    }

    /// Returns to the root while keeping the allocated storage.
    pub fn clear(&mut self) {
        self.text.clear();
        self.offsets.clear();
    }

    /// Copies the current location into an immutable [`Pointer`].
    #[must_use]
    pub fn snapshot(&self) -> Pointer {
        Pointer(self.text.clone())
    }

    /// Returns the escaped text of the current location.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Indicates whether the builder is at the root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Returns the number of tokens currently pushed.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.offsets.len()
    }
}

impl fmt::Display for PointerBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Parses an RFC 6901 array index: `0` or a decimal without leading zeroes.
pub(crate) fn parse_index(token: &str) -> Option<usize> {
    let bytes = token.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    token.parse().ok()
}

fn validate(text: &str) -> Result<(), PointerError> {
    if text.is_empty() {
        return Ok(());
    }
    if !text.starts_with('/') {
        return Err(PointerError::MissingLeadingSlash { pointer: text.to_owned() });
    }
    let bytes = text.as_bytes();
    for (offset, byte) in bytes.iter().enumerate() {
        if *byte == b'~' && !matches!(bytes.get(offset + 1), Some(b'0' | b'1')) {
            return Err(PointerError::InvalidEscape { pointer: text.to_owned(), offset });
        }
    }
    Ok(())
}

fn unescape(token: &str) -> String {
    if token.contains('~') {
        token.replace("~1", "/").replace("~0", "~")
    } else {
        token.to_owned()
    }
}
