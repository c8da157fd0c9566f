use std::collections::BTreeMap;
use std::mem;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::{
    diff::{pointer::parse_index, Pointer},
    CanonicalizeError, DiffError, DiffOptions, Number, Operation, Patch, PatchError,
};

/// The JSON data model the diff engine operates on.
///
/// Objects keep their members in a `BTreeMap`, so insertion order is
/// irrelevant to equality and iteration is always sorted by key.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number represented as IEEE-754 double precision.
    Number(Number),
    /// JSON string.
    String(String),
    /// JSON array.
    Array(Vec<Node>),
    /// JSON object with deterministic key ordering.
    Object(BTreeMap<String, Node>),
}

impl Node {
    /// Parses a JSON string into a node.
    ///
    /// ```
    /// # use jsondiff_core::Node;
    /// let node = Node::from_json_str("{\"hello\":\"world\"}")?;
    /// assert!(matches!(node, Node::Object(_)));
    /// # Ok::<(), jsondiff_core::CanonicalizeError>(())
    /// ```
    pub fn from_json_str(input: &str) -> Result<Self, CanonicalizeError> {
        let value: JsonValue = serde_json::from_str(input)?;
        Self::from_json_value(value)
    }

    /// Parses a YAML string into a node.
    ///
    /// ```
    /// # use jsondiff_core::Node;
    /// let node = Node::from_yaml_str("---\nanswer: 42\n")?;
    /// assert!(matches!(node, Node::Object(_)));
    /// # Ok::<(), jsondiff_core::CanonicalizeError>(())
    /// ```
    pub fn from_yaml_str(input: &str) -> Result<Self, CanonicalizeError> {
        let value: YamlValue = serde_yaml::from_str(input)?;
        Self::from_yaml_value(value)
    }

    /// Converts a serde JSON value into a [`Node`].
    pub fn from_json_value(value: JsonValue) -> Result<Self, CanonicalizeError> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(v) => Ok(Self::Bool(v)),
            JsonValue::Number(num) => {
                let Some(as_f64) = num.as_f64() else {
                    return Err(CanonicalizeError::NumberOutOfRange { value: num.to_string() });
                };
                Ok(Self::Number(Number::new(as_f64)?))
            }
            JsonValue::String(s) => Ok(Self::String(s)),
            JsonValue::Array(values) => {
                let mut items = Vec::with_capacity(values.len());
                for value in values {
                    items.push(Self::from_json_value(value)?);
                }
                Ok(Self::Array(items))
            }
            JsonValue::Object(map) => {
                let mut object = BTreeMap::new();
                for (key, value) in map {
                    object.insert(key, Self::from_json_value(value)?);
                }
                Ok(Self::Object(object))
            }
        }
    }

    fn from_yaml_value(value: YamlValue) -> Result<Self, CanonicalizeError> {
        match value {
            YamlValue::Null => Ok(Self::Null),
            YamlValue::Bool(v) => Ok(Self::Bool(v)),
            YamlValue::Number(num) => {
                if let Some(f) = num.as_f64() {
                    return Ok(Self::Number(Number::new(f)?));
                }
                if let Some(i) = num.as_i64() {
                    return Ok(Self::Number(Number::new(i as f64)?));
                }
                if let Some(u) = num.as_u64() {
                    return Ok(Self::Number(Number::new(u as f64)?));
                }
                Err(CanonicalizeError::NumberOutOfRange { value: num.to_string() })
            }
            YamlValue::String(s) => Ok(Self::String(s)),
            YamlValue::Sequence(seq) => {
                let mut items = Vec::with_capacity(seq.len());
                for value in seq {
                    items.push(Self::from_yaml_value(value)?);
                }
                Ok(Self::Array(items))
            }
            YamlValue::Mapping(map) => {
                let mut object = BTreeMap::new();
                for (key, value) in map {
                    let key = match key {
                        YamlValue::String(s) => s,
                        other => {
                            return Err(CanonicalizeError::NonStringYamlKey {
                                found: format!("{other:?}"),
                            });
                        }
                    };
                    object.insert(key, Self::from_yaml_value(value)?);
                }
                Ok(Self::Object(object))
            }
            YamlValue::Tagged(tagged) => {
                Err(CanonicalizeError::UnsupportedYamlTag { tag: tagged.tag.to_string() })
            }
        }
    }

    /// Converts the node into a serde JSON value.
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(v) => JsonValue::Bool(*v),
            Self::Number(n) => JsonValue::Number(n.to_json_number()),
            Self::String(s) => JsonValue::String(s.clone()),
            Self::Array(values) => JsonValue::Array(values.iter().map(Self::to_json_value).collect()),
            Self::Object(map) => {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key.clone(), value.to_json_value());
                }
                JsonValue::Object(object)
            }
        }
    }

    /// Renders the node as compact JSON text.
    ///
    /// ```
    /// # use jsondiff_core::Node;
    /// let node = Node::from_json_str("{\"b\":1.0, \"a\":[true]}")?;
    /// assert_eq!(node.to_json_string(), r#"{"a":[true],"b":1}"#);
    /// # Ok::<(), jsondiff_core::CanonicalizeError>(())
    /// ```
    #[must_use]
    pub fn to_json_string(&self) -> String {
        self.to_json_value().to_string()
    }

    /// Returns true when both nodes have the same shape and can be diffed member-wise.
    #[must_use]
    pub fn is_comparable(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    /// Resolves a JSON Pointer against this node.
    ///
    /// ```
    /// # use jsondiff_core::{diff::Pointer, Node};
    /// let doc = Node::from_json_str(r#"{"a":[10,{"b":true}]}"#)?;
    /// let found = doc.pointer(&Pointer::parse("/a/1/b").unwrap());
    /// assert_eq!(found, Some(&Node::Bool(true)));
    /// assert!(doc.pointer(&Pointer::parse("/a/2").unwrap()).is_none());
    /// # Ok::<(), jsondiff_core::CanonicalizeError>(())
    /// ```
    #[must_use]
    pub fn pointer(&self, pointer: &Pointer) -> Option<&Node> {
        let mut current = self;
        for token in pointer.tokens() {
            current = match current {
                Self::Object(map) => map.get(&token)?,
                Self::Array(values) => values.get(parse_index(&token)?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub(crate) fn pointer_mut(&mut self, pointer: &Pointer) -> Option<&mut Node> {
        let mut current = self;
        for token in pointer.tokens() {
            current = match current {
                Self::Object(map) => map.get_mut(&token)?,
                Self::Array(values) => values.get_mut(parse_index(&token)?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Computes the JSON Patch that turns this node into `other`.
    ///
    /// ```
    /// # use jsondiff_core::{DiffOptions, Node};
    /// let lhs = Node::from_json_str(r#"{"a":1}"#)?;
    /// let rhs = Node::from_json_str(r#"{"a":2}"#)?;
    /// let patch = lhs.diff(&rhs, &DiffOptions::default())?;
    /// assert_eq!(patch.to_json_string()?, r#"[{"op":"replace","path":"/a","value":2}]"#);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn diff(&self, other: &Self, options: &DiffOptions) -> Result<Patch, DiffError> {
        crate::diff::diff_nodes(self, other, options)
    }

    /// Applies a JSON Patch to this node, returning the patched node on success.
    ///
    /// ```
    /// # use jsondiff_core::{DiffOptions, Node};
    /// let base = Node::from_json_str("[1,2,3]")?;
    /// let target = Node::from_json_str("[1,4]")?;
    /// let patch = base.diff(&target, &DiffOptions::default())?;
    /// let patched = base.apply_patch(&patch)?;
    /// assert_eq!(patched, target);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn apply_patch(&self, patch: &Patch) -> Result<Self, PatchError> {
        crate::apply::apply_patch(self, patch)
    }

    /// Applies one operation in place. On error the node is left unchanged.
    ///
    /// ```
    /// # use jsondiff_core::{Node, Operation, Pointer};
    /// let mut doc = Node::from_json_str(r#"{"a":1}"#)?;
    /// doc.apply_operation(&Operation::remove(Pointer::parse("/a")?, Node::from(1)))?;
    /// assert_eq!(doc.to_json_string(), "{}");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn apply_operation(&mut self, operation: &Operation) -> Result<(), PatchError> {
        crate::apply::apply_operation(self, operation)
    }
}

impl TryFrom<JsonValue> for Node {
    type Error = CanonicalizeError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        Self::from_json_value(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(values) => serializer.collect_seq(values),
            Self::Object(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        Self::from_json_value(value).map_err(serde::de::Error::custom)
    }
}
