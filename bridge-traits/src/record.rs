//! Item Record Model
//!
//! Listings arrive from the integration layer as loosely-typed field bags whose
//! schema the engine does not own. An [`Item`] is an insertion-ordered mapping
//! from field name to a tagged scalar [`FieldValue`]; identity and timestamp
//! extraction work purely over that mapping.
//!
//! ## JSON Mapping
//!
//! ```text
//! null            -> FieldValue::Absent
//! true / false    -> FieldValue::Bool
//! 42              -> FieldValue::Integer
//! 4.5             -> FieldValue::Float
//! "SKU-1"         -> FieldValue::Text
//! [..] / {..}     -> rejected (not a flat record)
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BridgeError, Result};

/// A single scalar field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Field present but null
    Absent,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Check whether this value carries nothing usable
    ///
    /// Null and empty strings both count as absent for identity purposes.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Absent => true,
            FieldValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Borrow the value as text if it is a string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the value as a number if it is numeric
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Coerce the value to its string form, or `None` when blank
    pub fn to_key_string(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        Some(self.to_string())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Absent => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Absent)
    }
}

/// A loosely-typed listing record
///
/// Field order is preserved so that records serialize back the way they
/// were read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item {
    fields: IndexMap<String, FieldValue>,
}

impl Item {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field, replacing any previous value in place
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Look up a field by exact name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Iterate fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a JSON document that must be an array of flat records
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidRecords`] if the document is not an array,
    /// or any element is not an object of scalar fields.
    pub fn parse_collection(json: &str) -> Result<Vec<Item>> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::collection_from_value(value)
    }

    /// Convert an already-parsed JSON value into a record collection
    pub fn collection_from_value(value: serde_json::Value) -> Result<Vec<Item>> {
        let serde_json::Value::Array(elements) = value else {
            return Err(BridgeError::InvalidRecords(format!(
                "expected an array of records, found {}",
                json_kind(&value)
            )));
        };

        elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| {
                if !element.is_object() {
                    return Err(BridgeError::InvalidRecords(format!(
                        "element {} is {}, not a record",
                        index,
                        json_kind(&element)
                    )));
                }
                serde_json::from_value(element).map_err(|e| {
                    BridgeError::InvalidRecords(format!("element {}: {}", index, e))
                })
            })
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Item
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut item = Item::new();
        for (k, v) in iter {
            item.insert(k, v);
        }
        item
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
