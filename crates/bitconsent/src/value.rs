//! Typed values carried by a [`Record`].

use std::collections::BTreeMap;

/// A record: field name to value, in the shape the schema describes.
///
/// Decoded records only contain the fields that were actually present on the
/// wire. A field skipped by its validator has no key at all.
pub type Record = BTreeMap<String, Value>;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Unsigned integer.
    Int(u64),
    Bool(bool),
    /// Milliseconds since the Unix epoch. Stored on the wire in 100 ms units.
    Date(u64),
    /// Raw `'0'`/`'1'` string.
    Bits(String),
    /// Two-letter code such as `"en"`.
    Language(String),
    /// One record per list element.
    List(Vec<Record>),
}

impl Value {
    pub fn as_int(&self) -> Option<u64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Borrows the text of a [`Value::Bits`] or [`Value::Language`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Bits(text) | Value::Language(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Record]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Vec<Record>> for Value {
    fn from(items: Vec<Record>) -> Self {
        Value::List(items)
    }
}

/// Reads `name` from `record` as an integer, treating anything else as 0.
///
/// Computed widths and list counts use this to look at earlier fields.
pub fn int_field(record: &Record, name: &str) -> u64 {
    match record.get(name) {
        Some(Value::Int(value)) => *value,
        Some(Value::Bool(value)) => u64::from(*value),
        _ => 0,
    }
}
