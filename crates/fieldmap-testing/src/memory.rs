use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use fieldmap::ids::auto_id;
use fieldmap::{CollectionPath, DocumentPath, DocumentStore, FieldFilter, Patch, Snapshot};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Document store held in memory.
///
/// Cloning yields another handle onto the same documents.
#[derive(Clone)]
pub struct MemoryDocumentStore {
    inner: Arc<Inner>,
}

struct Inner {
    docs: DashMap<String, Value>,
    /// Collection path of every change.
    changes: broadcast::Sender<String>,
    merge_calls: AtomicUsize,
    fail_writes: AtomicBool,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                docs: DashMap::new(),
                changes,
                merge_calls: AtomicUsize::new(0),
                fail_writes: AtomicBool::new(false),
            }),
        }
    }

    /// Creates or overwrites a whole document and notifies its collection.
    pub fn set_document(&self, path: &DocumentPath, data: Value) {
        self.inner.docs.insert(path.to_string(), data);
        self.inner.notify(&path.parent());
    }

    pub fn remove_document(&self, path: &DocumentPath) -> Option<Value> {
        let removed = self.inner.docs.remove(path.as_str()).map(|(_, data)| data);
        if removed.is_some() {
            self.inner.notify(&path.parent());
        }
        removed
    }

    pub fn document(&self, path: &DocumentPath) -> Option<Value> {
        self.inner.docs.get(path.as_str()).map(|doc| doc.value().clone())
    }

    /// Number of `merge_patch` calls received, including rejected ones.
    pub fn merge_calls(&self) -> usize {
        self.inner.merge_calls.load(Ordering::SeqCst)
    }

    /// Makes every following `merge_patch` fail until switched off again.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of live collection streams.
    pub fn subscriber_count(&self) -> usize {
        self.inner.changes.receiver_count()
    }
}

impl Inner {
    fn notify(&self, collection: &CollectionPath) {
        // No receivers is fine: nobody is watching.
        let _ = self.changes.send(collection.to_string());
    }

    /// Documents directly inside `collection`, ordered by id.
    fn snapshot(&self, collection: &str, filter: Option<&FieldFilter>) -> Vec<Snapshot> {
        let prefix = format!("{collection}/");
        let mut docs: Vec<Snapshot> = self
            .docs
            .iter()
            .filter_map(|entry| {
                let id = entry.key().strip_prefix(&prefix)?;
                if id.contains('/') {
                    return None;
                }
                if filter.is_some_and(|filter| !filter.matches(entry.value())) {
                    return None;
                }
                Some(Snapshot::new(id, entry.value().clone()))
            })
            .collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        docs
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn load_document(&self, path: &DocumentPath) -> Result<Option<Value>> {
        Ok(self.document(path))
    }

    fn stream_collection(
        &self,
        path: &CollectionPath,
        filter: Option<FieldFilter>,
    ) -> BoxStream<'static, Result<Vec<Snapshot>>> {
        // Subscribe before the first snapshot so no change slips in between.
        let changes = self.inner.changes.subscribe();
        let state = (self.inner.clone(), path.to_string(), filter, changes, true);

        stream::unfold(state, |(inner, collection, filter, mut changes, first)| async move {
            if !first {
                loop {
                    match changes.recv().await {
                        Ok(changed) if changed == collection => break,
                        Ok(_) => continue,
                        // Missed notifications: re-read to catch up.
                        Err(RecvError::Lagged(_)) => break,
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
            let snapshot = inner.snapshot(&collection, filter.as_ref());
            Some((Ok::<_, anyhow::Error>(snapshot), (inner, collection, filter, changes, false)))
        })
        .boxed()
    }

    async fn merge_patch(&self, path: &DocumentPath, patch: &Patch) -> Result<()> {
        self.inner.merge_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            bail!("write to `{path}` rejected");
        }

        {
            let mut doc = self
                .inner
                .docs
                .get_mut(path.as_str())
                .ok_or_else(|| anyhow!("document `{path}` does not exist"))?;
            let Value::Object(map) = doc.value_mut() else {
                bail!("document `{path}` is not a map");
            };
            patch.apply_to(map);
        }

        debug!(path = %path, updates = patch.updates().count(), "patch applied");
        self.inner.notify(&path.parent());
        Ok(())
    }

    fn mint_id(&self) -> String {
        auto_id()
    }
}
