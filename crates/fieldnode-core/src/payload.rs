//! Payload value trees
//!
//! An envelope payload is a mapping from field name to a small tagged
//! union: string, integer, float, boolean or a nested mapping.
//! Keys are kept ordered so that serialization is deterministic.

use std::collections::btree_map;
use std::collections::BTreeMap;

/// Maximum nesting depth of payload mappings (the top level counts as 1)
pub const MAX_PAYLOAD_DEPTH: usize = 16;

/// A single payload value
#[derive(Clone, Debug, PartialEq)]
pub enum PayloadValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Map(Payload),
}

impl PayloadValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PayloadValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PayloadValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view: integers widen to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PayloadValue::Float(v) => Some(*v),
            PayloadValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PayloadValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Payload> {
        match self {
            PayloadValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            PayloadValue::Str(_) => "string",
            PayloadValue::Int(_) => "integer",
            PayloadValue::Float(_) => "float",
            PayloadValue::Bool(_) => "boolean",
            PayloadValue::Map(_) => "mapping",
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(v: &str) -> Self {
        PayloadValue::Str(v.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(v: String) -> Self {
        PayloadValue::Str(v)
    }
}

impl From<i64> for PayloadValue {
    fn from(v: i64) -> Self {
        PayloadValue::Int(v)
    }
}

impl From<f64> for PayloadValue {
    fn from(v: f64) -> Self {
        PayloadValue::Float(v)
    }
}

impl From<bool> for PayloadValue {
    fn from(v: bool) -> Self {
        PayloadValue::Bool(v)
    }
}

impl From<Payload> for PayloadValue {
    fn from(v: Payload) -> Self {
        PayloadValue::Map(v)
    }
}

/// Ordered mapping of field name to value
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload(BTreeMap<String, PayloadValue>);

impl Payload {
    pub fn new() -> Self {
        Payload(BTreeMap::new())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.0.get(key)
    }

    /// String field lookup; `None` when absent or not a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PayloadValue::as_str)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(PayloadValue::as_f64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, PayloadValue> {
        self.0.iter()
    }

    /// Nesting depth; an empty or flat payload has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .0
            .values()
            .filter_map(PayloadValue::as_map)
            .map(Payload::depth)
            .max()
            .unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a Payload {
    type Item = (&'a String, &'a PayloadValue);
    type IntoIter = btree_map::Iter<'a, String, PayloadValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, PayloadValue)> for Payload {
    fn from_iter<I: IntoIterator<Item = (String, PayloadValue)>>(iter: I) -> Self {
        Payload(iter.into_iter().collect())
    }
}
