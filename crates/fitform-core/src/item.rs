#![forbid(unsafe_code)]

//! Opaque collection records.
//!
//! A [`CollectionItem`] is a JSON object with a stable identity field
//! ([`ID_FIELD`]). The editor never interprets other fields except the
//! per-collection lock field, which it copies across a replace.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the identity field every record carries.
pub const ID_FIELD: &str = "id";

/// One record in an ordered collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionItem(Map<String, Value>);

impl CollectionItem {
    /// Empty record.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Record with only an `id`.
    #[must_use]
    pub fn with_id(id: impl Into<Value>) -> Self {
        let mut fields = Map::new();
        fields.insert(ID_FIELD.to_owned(), id.into());
        Self(fields)
    }

    /// Wrap a JSON value. Returns `None` unless it is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Builder-style field insert.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Identity value, if present.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.0.get(ID_FIELD)
    }

    /// Field value by name.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Set a field, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Borrow the underlying map.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert into a JSON object value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Copy the named fields from `source` onto this record.
    ///
    /// Fields that `source` does not carry are left as they are.
    pub fn carry_over(&mut self, source: &CollectionItem, fields: &[String]) {
        for name in fields {
            if let Some(value) = source.get(name) {
                self.0.insert(name.clone(), value.clone());
            }
        }
    }
}

impl From<CollectionItem> for Value {
    fn from(item: CollectionItem) -> Self {
        item.into_value()
    }
}

/// Identity of an arbitrary JSON element, if it is an object carrying `id`.
#[inline]
#[must_use]
pub fn value_id(value: &Value) -> Option<&Value> {
    value.as_object().and_then(|m| m.get(ID_FIELD))
}
