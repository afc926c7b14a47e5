//! Typed attributes derived from descriptor annotations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ProtoError;
use crate::media_type::ANNOTATION_UOR_ATTRIBUTES;

/// Scalar attribute value. Serializes as the bare JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// JSON encoding used for extended attribute values.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    fn from_json(key: &str, value: Value) -> Result<Self, ProtoError> {
        match value {
            Value::Null => Ok(AttributeValue::Null),
            Value::Bool(b) => Ok(AttributeValue::Bool(b)),
            Value::String(s) => Ok(AttributeValue::String(s)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(AttributeValue::Integer(i)),
                None => n
                    .as_f64()
                    .map(AttributeValue::Float)
                    .ok_or_else(|| ProtoError::UnsupportedAttribute(key.to_string())),
            },
            Value::Array(_) | Value::Object(_) => {
                Err(ProtoError::UnsupportedAttribute(key.to_string()))
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

/// Key-ordered attribute list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet {
    entries: BTreeMap<String, AttributeValue>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set from descriptor annotations.
    ///
    /// Plain annotations become string attributes. The `uor.attributes`
    /// annotation holds a JSON object whose members are expanded into typed
    /// attributes. Keys for which `skip` returns true are left out.
    pub fn from_annotations(
        annotations: &BTreeMap<String, String>,
        skip: impl Fn(&str) -> bool,
    ) -> Result<Self, ProtoError> {
        let mut set = AttributeSet::new();
        for (key, value) in annotations {
            if skip(key) {
                continue;
            }
            if key == ANNOTATION_UOR_ATTRIBUTES {
                let object: serde_json::Map<String, Value> = serde_json::from_str(value)
                    .map_err(|source| ProtoError::AttributeJson {
                        key: key.clone(),
                        source,
                    })?;
                for (k, v) in object {
                    if skip(&k) {
                        continue;
                    }
                    let v = AttributeValue::from_json(&k, v)?;
                    set.insert(k, v);
                }
            } else {
                set.insert(key.clone(), AttributeValue::String(value.clone()));
            }
        }
        Ok(set)
    }

    /// Builds the set from an arbitrary JSON object, e.g. a query file.
    pub fn from_json_map(object: serde_json::Map<String, Value>) -> Result<Self, ProtoError> {
        let mut set = AttributeSet::new();
        for (k, v) in object {
            let v = AttributeValue::from_json(&k, v)?;
            set.insert(k, v);
        }
        Ok(set)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn find(&self, key: &str) -> Option<&AttributeValue> {
        self.entries.get(key)
    }

    /// String value of `key`, failing when it is missing or not a string.
    pub fn find_str(&self, key: &str) -> Result<&str, ProtoError> {
        self.find(key)
            .ok_or_else(|| ProtoError::AttributeNotFound(key.to_string()))?
            .as_str()
            .ok_or_else(|| ProtoError::NotAString(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if every entry of `query` is present here with an equal value.
    pub fn contains_all(&self, query: &AttributeSet) -> bool {
        query
            .iter()
            .all(|(k, v)| self.find(k).map_or(false, |mine| mine == v))
    }
}
