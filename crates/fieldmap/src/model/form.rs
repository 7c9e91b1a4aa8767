use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::LocalizedText;

/// Kind of input a field collects.
///
/// Only `Text` is produced when reading documents; other kinds declared by a
/// document are read as `Text` as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    #[serde(rename = "text_field")]
    Text,
}

/// How many options a multiple choice answer may hold.
///
/// Stored as `"select_one"` / `"select_many"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    SelectOne,
    SelectMany,
}

/// One selectable answer of a multiple choice field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOption {
    pub id: String,
    pub code: Option<String>,
    pub label: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipleChoice {
    pub cardinality: Option<Cardinality>,
    pub options: BTreeMap<String, FieldOption>,
}

/// A single question of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub id: String,
    pub field_type: FieldType,
    pub label: LocalizedText,
    pub required: bool,
    /// Present iff the source document carried an `options` map.
    pub choice: Option<MultipleChoice>,
}

impl Field {
    /// An optional free-text question.
    pub fn text(id: impl Into<String>, label: LocalizedText) -> Self {
        Self {
            id: id.into(),
            field_type: FieldType::Text,
            label,
            required: false,
            choice: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    pub id: String,
    pub fields: BTreeMap<String, Field>,
}

impl Form {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Returns a copy with `field` inserted, replacing any field with the same id.
    pub fn with_field(&self, field: Field) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(field.id.clone(), field);
        Self {
            id: self.id.clone(),
            fields,
        }
    }
}
