use std::collections::BTreeMap;

use super::{Form, LocalizedText};
use crate::error::LookupError;

/// A group of features sharing a color and a set of forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layer {
    pub id: String,
    /// Unset means the renderer applies its default color.
    pub color: Option<String>,
    pub name: LocalizedText,
    pub forms: BTreeMap<String, Form>,
}

impl Layer {
    /// A layer with nothing but an id, as created before its first save.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(&self, lang: &str, name: impl Into<String>) -> Self {
        Self {
            name: self.name.with(lang, name),
            ..self.clone()
        }
    }

    pub fn with_color(&self, color: Option<String>) -> Self {
        Self {
            color,
            ..self.clone()
        }
    }

    /// Returns a copy with `forms` replacing the current form map.
    pub fn with_forms(&self, forms: BTreeMap<String, Form>) -> Self {
        Self {
            forms,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub layers: BTreeMap<String, Layer>,
}

impl Project {
    pub fn layer(&self, layer_id: &str) -> Result<&Layer, LookupError> {
        self.layers
            .get(layer_id)
            .ok_or_else(|| LookupError::MissingLayer {
                project_id: self.id.clone(),
                layer_id: layer_id.to_string(),
            })
    }

    /// Resolves `layers[layer_id].forms[form_id]`.
    pub fn form(&self, layer_id: &str, form_id: &str) -> Result<&Form, LookupError> {
        self.layer(layer_id)?
            .forms
            .get(form_id)
            .ok_or_else(|| LookupError::MissingForm {
                layer_id: layer_id.to_string(),
                form_id: form_id.to_string(),
            })
    }

    /// Returns a copy with `layer` inserted, replacing any layer with the same id.
    pub fn with_layer(&self, layer: Layer) -> Self {
        let mut layers = self.layers.clone();
        layers.insert(layer.id.clone(), layer);
        Self {
            layers,
            ..self.clone()
        }
    }
}
