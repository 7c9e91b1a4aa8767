//! PostgreSQL implementation of the fieldmap document store.
//!
//! This crate stores every document as a JSONB row keyed by its full path and
//! implements the `DocumentStore` trait from fieldmap on top of it.
//!
//! # Features
//!
//! - Patches applied under `SELECT ... FOR UPDATE`, so concurrent writers to
//!   one document serialize (last write wins)
//! - Live collection streams driven by `LISTEN/NOTIFY`
//! - Equality filters evaluated in SQL against top-level JSONB fields
//!
//! # Database Schema
//!
//! ```sql
//! CREATE TABLE documents (
//!     path TEXT PRIMARY KEY,
//!     collection TEXT NOT NULL,
//!     doc_id TEXT NOT NULL,
//!     data JSONB NOT NULL DEFAULT '{}'::jsonb,
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE INDEX idx_documents_collection ON documents (collection, doc_id);
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use fieldmap::DataStore;
//! use fieldmap_store_postgres::PgDocumentStore;
//! use sqlx::PgPool;
//!
//! let pool = PgPool::connect("postgres://localhost/survey").await?;
//! let store = PgDocumentStore::new(pool);
//!
//! let data = DataStore::new(Arc::new(store));
//! let project = data.load_project("p1").await?;
//! ```

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldmap::ids::auto_id;
use fieldmap::{CollectionPath, DocumentPath, DocumentStore, FieldFilter, Patch, Snapshot};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use sqlx::postgres::PgListener;
use sqlx::{PgPool, Row};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Default `LISTEN/NOTIFY` channel carrying changed collection paths.
pub const DEFAULT_CHANNEL: &str = "fieldmap_document_changes";

/// PostgreSQL document store.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    channel: String,
}

impl PgDocumentStore {
    /// Create a new PostgreSQL document store.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    ///
    /// # Default Settings
    ///
    /// - Notification channel: `fieldmap_document_changes`
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            channel: DEFAULT_CHANNEL.to_string(),
        }
    }

    /// Create a document store notifying on a custom channel.
    ///
    /// Stores sharing a database but not a channel do not see each other's
    /// changes live.
    pub fn with_channel(pool: PgPool, channel: impl Into<String>) -> Self {
        Self {
            pool,
            channel: channel.into(),
        }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create or overwrite a whole document.
    pub async fn set_document(&self, path: &DocumentPath, data: &Value) -> Result<()> {
        let collection = path.parent();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO documents (path, collection, doc_id, data, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (path) DO UPDATE
            SET data = EXCLUDED.data,
                updated_at = NOW()
            "#,
        )
        .bind(path.as_str())
        .bind(collection.as_str())
        .bind(path.id())
        .bind(data)
        .execute(&mut *tx)
        .await?;

        self.notify(&mut tx, &collection).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn notify(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        collection: &CollectionPath,
    ) -> Result<()> {
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(&self.channel)
            .bind(collection.as_str())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn load_document(&self, path: &DocumentPath) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT data FROM documents WHERE path = $1")
            .bind(path.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("data")))
    }

    /// Emits the collection once, then again after every notification for it.
    ///
    /// The listener runs on its own task, which ends when the returned stream
    /// is dropped.
    fn stream_collection(
        &self,
        path: &CollectionPath,
        filter: Option<FieldFilter>,
    ) -> BoxStream<'static, Result<Vec<Snapshot>>> {
        let (tx, rx) = mpsc::channel(1);
        let pool = self.pool.clone();
        let channel = self.channel.clone();
        let collection = path.to_string();

        tokio::spawn(async move {
            // Listen before the first read so no change slips in between.
            let mut listener = match PgListener::connect_with(&pool).await {
                Ok(listener) => listener,
                Err(err) => {
                    let _ = tx.send(Err(err.into())).await;
                    return;
                }
            };
            if let Err(err) = listener.listen(&channel).await {
                let _ = tx.send(Err(err.into())).await;
                return;
            }

            loop {
                let snapshot = query_collection(&pool, &collection, filter.as_ref()).await;
                if tx.send(snapshot).await.is_err() {
                    debug!(collection = %collection, "collection stream dropped");
                    return;
                }

                loop {
                    tokio::select! {
                        _ = tx.closed() => return,
                        notification = listener.recv() => match notification {
                            Ok(notification) if notification.payload() == collection => break,
                            Ok(_) => continue,
                            Err(err) => {
                                // The listener reconnects on the next recv; re-read to catch up.
                                warn!(collection = %collection, error = %err, "listener interrupted");
                                break;
                            }
                        },
                    }
                }
            }
        });

        stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) }).boxed()
    }

    /// Apply a patch to an existing document.
    ///
    /// The row is locked for the read-modify-write, so patches to one document
    /// never interleave. Patching a missing document fails.
    async fn merge_patch(&self, path: &DocumentPath, patch: &Patch) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT data FROM documents WHERE path = $1 FOR UPDATE")
            .bind(path.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| anyhow!("document `{path}` does not exist"))?;

        let mut data: Value = row.get("data");
        let Value::Object(map) = &mut data else {
            return Err(anyhow!("document `{path}` is not a map"));
        };
        patch.apply_to(map);

        sqlx::query(
            r#"
            UPDATE documents
            SET data = $1,
                updated_at = NOW()
            WHERE path = $2
            "#,
        )
        .bind(&data)
        .bind(path.as_str())
        .execute(&mut *tx)
        .await?;

        self.notify(&mut tx, &path.parent()).await?;
        tx.commit().await?;

        debug!(path = %path, updates = patch.updates().count(), "patch applied");
        Ok(())
    }

    fn mint_id(&self) -> String {
        auto_id()
    }
}

/// Reads the documents directly inside `collection`, ordered by id.
async fn query_collection(
    pool: &PgPool,
    collection: &str,
    filter: Option<&FieldFilter>,
) -> Result<Vec<Snapshot>> {
    let rows = match filter {
        None => {
            sqlx::query(
                "SELECT doc_id, data FROM documents WHERE collection = $1 ORDER BY doc_id",
            )
            .bind(collection)
            .fetch_all(pool)
            .await?
        }
        Some(filter) => {
            sqlx::query(
                r#"
                SELECT doc_id, data
                FROM documents
                WHERE collection = $1
                  AND data -> $2 = $3
                ORDER BY doc_id
                "#,
            )
            .bind(collection)
            .bind(&filter.field)
            .bind(&filter.value)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows
        .into_iter()
        .map(|row| Snapshot::new(row.get::<String, _>("doc_id"), row.get("data")))
        .collect())
}

/// Utility functions for store maintenance.
impl PgDocumentStore {
    /// Create the `documents` table and its index if missing.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                path TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                data JSONB NOT NULL DEFAULT '{}'::jsonb,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents (collection, doc_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a document. Returns whether it existed.
    pub async fn delete_document(&self, path: &DocumentPath) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM documents WHERE path = $1")
            .bind(path.as_str())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() > 0 {
            self.notify(&mut tx, &path.parent()).await?;
        }
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get statistics about a collection.
    pub async fn stats(&self, collection: &CollectionPath) -> Result<CollectionStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as documents,
                MAX(updated_at) as last_updated
            FROM documents
            WHERE collection = $1
            "#,
        )
        .bind(collection.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(CollectionStats {
            documents: row.get("documents"),
            last_updated: row.get("last_updated"),
        })
    }
}

/// Collection statistics.
#[derive(Debug, Clone, Copy)]
pub struct CollectionStats {
    pub documents: i64,
    pub last_updated: Option<DateTime<Utc>>,
}
