//! Creating and editing a layer of the active project.
//!
//! # Invariants
//! - Nothing is written before the owning project has loaded.
//! - A failed save is reported once through the [`Notifier`] and not retried.
//! - Local edits are not rolled back when a save fails.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, LookupError, Result};
use crate::model::{Field, Form, Layer, LocalizedText, Project};
use crate::service::DataStore;
use crate::surface::{Navigator, Notifier};

pub const DEFAULT_LANGUAGE: &str = "en";
pub const SAVE_FAILED_NOTICE: &str = "Layer update failed.";

/// Which layer an editor works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerRef {
    /// A layer that does not exist yet; it gets a fresh id once the project loads.
    New,
    Existing(String),
}

impl LayerRef {
    /// Parses a route parameter, where `:new` requests a new layer.
    pub fn from_route(param: &str) -> Self {
        if param == ":new" {
            LayerRef::New
        } else {
            LayerRef::Existing(param.to_string())
        }
    }
}

pub struct LayerEditor {
    data: DataStore,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    lang: String,
    target: LayerRef,
    project_id: Option<String>,
    layer: Option<Layer>,
    name: String,
    question: String,
}

impl LayerEditor {
    pub fn new(
        data: DataStore,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
        target: LayerRef,
    ) -> Self {
        Self {
            data,
            navigator,
            notifier,
            lang: DEFAULT_LANGUAGE.to_string(),
            target,
            project_id: None,
            layer: None,
            name: String::new(),
            question: String::new(),
        }
    }

    /// Language used for the layer name and question label.
    pub fn with_language(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Binds the editor to a freshly loaded project.
    ///
    /// A new layer gets an id minted by the store. An existing layer must be
    /// present in `project`.
    ///
    /// Once a new layer has its id the editor targets that id, so a later
    /// project emission that does not contain the layer yet (nothing saved)
    /// fails with [`LookupError::MissingLayer`] instead of minting again.
    pub fn on_project_loaded(&mut self, project: &Project) -> Result<()> {
        let layer = match self.target.clone() {
            LayerRef::New => {
                let id = self.data.generate_id();
                debug!(layer_id = %id, "allocated id for new layer");
                self.target = LayerRef::Existing(id.clone());
                Layer::new(id)
            }
            LayerRef::Existing(id) => project
                .layers
                .get(&id)
                .cloned()
                .ok_or_else(|| LookupError::MissingLayer {
                    project_id: project.id.clone(),
                    layer_id: id,
                })?,
        };
        self.name = layer.name.get(&self.lang).to_string();
        self.layer = Some(layer);
        self.project_id = Some(project.id.clone());
        Ok(())
    }

    pub fn layer(&self) -> Option<&Layer> {
        self.layer.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    /// Builds the layer as it will be written, minting form and field ids.
    ///
    /// With a question set, the layer's forms are replaced by a single form
    /// holding one optional text field; without one the forms are cleared.
    pub fn build_layer(&self) -> Result<Layer> {
        let layer = self
            .layer
            .as_ref()
            .ok_or(Error::MissingContext("layer not resolved"))?;

        let forms = if self.question.is_empty() {
            BTreeMap::new()
        } else {
            let form_id = self.data.generate_id();
            let field_id = self.data.generate_id();
            let field = Field::text(field_id, LocalizedText::single(&self.lang, &self.question));
            BTreeMap::from([(form_id.clone(), Form::new(form_id).with_field(field))])
        };

        Ok(layer.with_name(&self.lang, &self.name).with_forms(forms))
    }

    /// Writes the edited layer.
    ///
    /// Fails with [`Error::MissingContext`] before touching the store when no
    /// project has loaded. On success navigates back to the project.
    pub async fn save(&mut self) -> Result<Layer> {
        let project_id = self
            .project_id
            .clone()
            .ok_or(Error::MissingContext("project not yet loaded"))?;
        let layer = self.build_layer()?;

        match self.data.update_layer(&project_id, &layer).await {
            Ok(()) => {
                self.layer = Some(layer.clone());
                self.navigator.navigate(format!("p/{project_id}"));
                Ok(layer)
            }
            Err(err) => {
                warn!(project_id = %project_id, layer_id = %layer.id, error = %err, "layer save failed");
                self.notifier.notify_failure(SAVE_FAILED_NOTICE);
                Err(err)
            }
        }
    }

    /// Leaves the editor without saving.
    pub fn close(&self) {
        if let Some(project_id) = &self.project_id {
            self.navigator.navigate(format!("p/{project_id}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_param_selects_target() {
        assert_eq!(LayerRef::from_route(":new"), LayerRef::New);
        assert_eq!(
            LayerRef::from_route("layer001"),
            LayerRef::Existing("layer001".into())
        );
    }
}
