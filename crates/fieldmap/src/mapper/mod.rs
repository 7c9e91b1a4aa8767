//! Translation between raw store documents and the domain model.
//!
//! The read path ([`to_project`] and friends) is total over missing data:
//! absent nested maps read as empty and absent scalars read as `None`. A value
//! that is present but has the wrong shape is a [`DecodeError`].
//!
//! The write path ([`to_layer_patch`], [`to_title_patch`]) produces a
//! [`Patch`](crate::patch::Patch) addressing exactly one subtree of the
//! owning project document.

mod read;
mod write;

pub use read::{
    to_audit_info, to_feature, to_field, to_form, to_layer, to_observation, to_option,
    to_project, to_user,
};
pub use write::{field_document, form_document, layer_document, to_layer_patch, to_title_patch};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// Borrowed view of one entity's document, remembering which entity it is so
/// decode errors can name it.
pub(crate) struct Fields<'a> {
    entity: &'static str,
    id: &'a str,
    raw: &'a Value,
    data: Option<&'a Map<String, Value>>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(entity: &'static str, id: &'a str, data: &'a Value) -> Result<Self, DecodeError> {
        match data {
            Value::Null | Value::Object(_) => {}
            other => {
                return Err(DecodeError::UnexpectedType {
                    entity,
                    id: id.to_string(),
                    key: String::new(),
                    expected: "map",
                    found: kind(other),
                })
            }
        }
        Ok(Self {
            entity,
            id,
            raw: data,
            data: match data {
                Value::Object(map) => Some(map),
                _ => None,
            },
        })
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.data
            .and_then(|map| map.get(key))
            .filter(|value| !value.is_null())
    }

    fn unexpected(&self, key: impl Into<String>, expected: &'static str, found: &Value) -> DecodeError {
        DecodeError::UnexpectedType {
            entity: self.entity,
            id: self.id.to_string(),
            key: key.into(),
            expected,
            found: kind(found),
        }
    }

    fn missing(&self, key: &'static str) -> DecodeError {
        DecodeError::MissingField {
            entity: self.entity,
            id: self.id.to_string(),
            key,
        }
    }

    /// Nested map at `key`; `None` when absent.
    pub(crate) fn map(&self, key: &str) -> Result<Option<&'a Map<String, Value>>, DecodeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(self.unexpected(key, "map", other)),
        }
    }

    /// Entries of the nested map at `key`; empty when absent.
    pub(crate) fn entries(&self, key: &str) -> Result<impl Iterator<Item = (&'a String, &'a Value)>, DecodeError> {
        Ok(self.map(key)?.into_iter().flat_map(|map| map.iter()))
    }

    /// Value at `key` decoded through its serde representation; `None` when
    /// absent.
    pub(crate) fn decode<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DecodeError> {
        self.get(key)
            .map(|value| T::deserialize(value).map_err(|err| self.malformed(key, err)))
            .transpose()
    }

    /// The whole document decoded through its serde representation; the
    /// default value when the document is absent.
    pub(crate) fn decode_all<T: DeserializeOwned + Default>(&self) -> Result<T, DecodeError> {
        match self.raw {
            Value::Null => Ok(T::default()),
            raw => T::deserialize(raw).map_err(|err| self.malformed("", err)),
        }
    }

    fn malformed(&self, key: &str, err: serde_json::Error) -> DecodeError {
        DecodeError::Malformed {
            entity: self.entity,
            id: self.id.to_string(),
            key: key.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn string(&self, key: &str) -> Result<Option<String>, DecodeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(self.unexpected(key, "string", other)),
        }
    }

    pub(crate) fn required_string(&self, key: &'static str) -> Result<String, DecodeError> {
        self.string(key)?.ok_or_else(|| self.missing(key))
    }

    pub(crate) fn bool(&self, key: &str) -> Result<Option<bool>, DecodeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(*value)),
            Some(other) => Err(self.unexpected(key, "bool", other)),
        }
    }
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}
