//! # fieldmap
//!
//! Survey data for field collection: projects organized into layers and
//! forms, features placed on a map, observations recorded against features.
//!
//! ## Architecture
//!
//! ```text
//! DocumentStore ──► mapper (read) ──► model ──► ProjectionEngine ──► MarkerSurface
//!      ▲                                 │
//!      └──── Patch ◄── mapper (write) ◄──┘  (LayerEditor / DataStore)
//! ```
//!
//! - [`model`]: immutable domain values with structural equality
//! - [`mapper`]: total read path from raw documents, patch-producing write path
//! - [`store`]: the async document store gateway
//! - [`DataStore`]: typed loads, live streams and writes over a store
//! - [`LayerEditor`]: create/edit a layer and save it as a single-subtree patch
//! - [`projection`]: recompute map markers from three live inputs
//!
//! ## Key Invariants
//!
//! 1. **Missing is empty** - absent nested maps read as empty, never as errors
//! 2. **Wrong shape fails** - present-but-malformed values are [`DecodeError`]s
//! 3. **Writes are subtree patches** - writing one layer never touches another
//! 4. **Full redraw** - each projection emission clears then re-adds every marker
//! 5. **One handle** - a single [`Subscription`] releases all projection inputs
//!
//! ## Example
//!
//! ```ignore
//! use fieldmap::{DataStore, ProjectionEngine, ProjectionInputs};
//!
//! let data = DataStore::new(store);
//! let project = data.load_project("p1").await?;
//!
//! let subscription = ProjectionEngine::new(map_surface).spawn(ProjectionInputs {
//!     project: futures::stream::iter([project.clone()]).boxed(),
//!     features: data.features(&project),
//!     fragment: router.fragments(),
//! });
//!
//! // on view teardown
//! drop(subscription);
//! ```

// Core modules
pub mod editor;
pub mod error;
pub mod ids;
pub mod mapper;
pub mod model;
pub mod patch;
pub mod path;
pub mod projection;
pub mod service;
pub mod store;
pub mod surface;

// Re-export error types
pub use crate::error::{DecodeError, Error, LookupError, ProjectionError, Result};

// Re-export model types
pub use crate::model::{
    AuditInfo, Cardinality, Feature, Field, FieldOption, FieldType, Form, Layer, LocalizedText,
    Location, MultipleChoice, Observation, Project, Response, User,
};

// Re-export store gateway types
pub use crate::patch::Patch;
pub use crate::path::{CollectionPath, DocumentPath, FieldPath};
pub use crate::store::{DocumentStore, FieldFilter, Snapshot};

// Re-export service and editor types
pub use crate::editor::{LayerEditor, LayerRef};
pub use crate::service::DataStore;

// Re-export projection types
pub use crate::projection::{
    Marker, ProjectionConfig, ProjectionEngine, ProjectionInputs, Subscription,
};
pub use crate::surface::{MarkerSurface, Navigator, Notifier};

// Re-export commonly used external types
pub use async_trait::async_trait;
