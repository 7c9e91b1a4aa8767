//! Document store gateway.
//!
//! The store is an opaque async key/value document API addressed by
//! slash-separated paths. Core code consumes it only through
//! [`DocumentStore`]; transport and auth belong to implementations.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::patch::Patch;
use crate::path::{CollectionPath, DocumentPath};

/// One document of a collection snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub id: String,
    pub data: Value,
}

impl Snapshot {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Restricts a collection stream to documents whose top-level `field`
/// equals `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, data: &Value) -> bool {
        data.get(&self.field) == Some(&self.value)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads one document; `None` when it does not exist.
    async fn load_document(&self, path: &DocumentPath) -> Result<Option<Value>>;

    /// Live view of a collection.
    ///
    /// Emits the full (filtered) collection on subscription and again after
    /// every remote change. The stream does not end on its own; dropping it
    /// releases the subscription.
    fn stream_collection(
        &self,
        path: &CollectionPath,
        filter: Option<FieldFilter>,
    ) -> BoxStream<'static, Result<Vec<Snapshot>>>;

    /// Applies `patch` to an existing document.
    ///
    /// Paths the patch does not name must be left as they are.
    async fn merge_patch(&self, path: &DocumentPath, patch: &Patch) -> Result<()>;

    /// Mints an id in the store's id space without writing anything.
    fn mint_id(&self) -> String;
}
