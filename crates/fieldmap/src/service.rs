//! Typed access to projects, features, observations and users.

use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::mapper;
use crate::model::{Feature, Layer, Observation, Project, User};
use crate::path::{CollectionPath, DocumentPath};
use crate::store::{DocumentStore, FieldFilter};

/// Maps store documents to domain values and domain edits to patches.
#[derive(Clone)]
pub struct DataStore {
    store: Arc<dyn DocumentStore>,
}

impl DataStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Get the underlying document store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn load_project(&self, id: &str) -> Result<Project> {
        let path = DocumentPath::project(id);
        let data = self.load(&path).await?;
        Ok(mapper::to_project(id, &data)?)
    }

    /// Sets the project title in `lang`, leaving other languages as they are.
    pub async fn update_project_title(&self, project_id: &str, lang: &str, title: &str) -> Result<()> {
        let path = DocumentPath::project(project_id);
        self.store
            .merge_patch(&path, &mapper::to_title_patch(lang, title))
            .await
            .map_err(Error::Store)?;
        info!(project_id, lang, "project title updated");
        Ok(())
    }

    /// Writes `layer` into its project document without touching other layers.
    pub async fn update_layer(&self, project_id: &str, layer: &Layer) -> Result<()> {
        let path = DocumentPath::project(project_id);
        let patch = mapper::to_layer_patch(layer);
        debug!(project_id, layer_id = %layer.id, forms = layer.forms.len(), "writing layer patch");
        self.store
            .merge_patch(&path, &patch)
            .await
            .map_err(Error::Store)?;
        info!(project_id, layer_id = %layer.id, "layer updated");
        Ok(())
    }

    pub async fn load_feature(&self, project_id: &str, feature_id: &str) -> Result<Feature> {
        let path = CollectionPath::features(project_id).doc(feature_id);
        let data = self.load(&path).await?;
        Ok(mapper::to_feature(feature_id, &data)?)
    }

    /// Live list of the project's features; re-emits on every remote change.
    pub fn features(&self, project: &Project) -> BoxStream<'static, Result<Vec<Feature>>> {
        self.store
            .stream_collection(&CollectionPath::features(&project.id), None)
            .map(|snapshots| -> Result<Vec<Feature>> {
                snapshots
                    .map_err(Error::Store)?
                    .iter()
                    .map(|doc| mapper::to_feature(&doc.id, &doc.data).map_err(Error::from))
                    .collect()
            })
            .boxed()
    }

    /// Live list of observations recorded against `feature`.
    pub fn observations(
        &self,
        project: &Project,
        feature: &Feature,
    ) -> BoxStream<'static, Result<Vec<Observation>>> {
        let project = project.clone();
        let feature = feature.clone();
        self.store
            .stream_collection(
                &CollectionPath::observations(&project.id),
                Some(FieldFilter::equals("featureId", feature.id.as_str())),
            )
            .map(move |snapshots| -> Result<Vec<Observation>> {
                snapshots
                    .map_err(Error::Store)?
                    .iter()
                    .map(|doc| mapper::to_observation(&project, &feature, &doc.id, &doc.data))
                    .collect()
            })
            .boxed()
    }

    pub async fn load_user(&self, uid: &str) -> Result<User> {
        let path = CollectionPath::users().doc(uid);
        let data = self.load(&path).await?;
        Ok(mapper::to_user(uid, &data)?)
    }

    /// Mints an id for an entity that has not been written yet.
    pub fn generate_id(&self) -> String {
        self.store.mint_id()
    }

    async fn load(&self, path: &DocumentPath) -> Result<serde_json::Value> {
        self.store
            .load_document(path)
            .await
            .map_err(Error::Store)?
            .ok_or_else(|| Error::NotFound {
                path: path.to_string(),
            })
    }
}
