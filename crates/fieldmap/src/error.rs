//! Error types for document mapping, lookups, rendering and store access.

use thiserror::Error;

/// A document had a value of the wrong shape, or lacked a value that cannot
/// be defaulted.
///
/// Missing nested maps are *not* decode errors; they read as empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("{entity} `{id}`: expected {expected} at `{key}`, found {found}")]
    UnexpectedType {
        entity: &'static str,
        id: String,
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{entity} `{id}`: missing required field `{key}`")]
    MissingField {
        entity: &'static str,
        id: String,
        key: &'static str,
    },

    /// A value did not match its structured form (localized text, location,
    /// user, cardinality).
    #[error("{entity} `{id}`: malformed value at `{key}`: {message}")]
    Malformed {
        entity: &'static str,
        id: String,
        key: String,
        message: String,
    },

    #[error("{entity} `{id}`: invalid timestamp at `{key}`")]
    InvalidTimestamp {
        entity: &'static str,
        id: String,
        key: &'static str,
    },
}

/// A referenced layer or form does not exist in the project.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("project `{project_id}` has no layer `{layer_id}`")]
    MissingLayer { project_id: String, layer_id: String },

    #[error("layer `{layer_id}` has no form `{form_id}`")]
    MissingForm { layer_id: String, form_id: String },
}

/// Failure to build a marker set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error("feature `{feature_id}` references missing layer `{layer_id}`")]
    MissingLayer {
        feature_id: String,
        layer_id: String,
    },

    /// One of the live inputs failed; the message is the upstream error.
    #[error("input `{input}` failed: {message}")]
    Input {
        input: &'static str,
        message: String,
    },
}

/// Top-level error for service and editor operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The operation needs state that has not been loaded yet.
    #[error("missing required context: {0}")]
    MissingContext(&'static str),

    #[error("document `{path}` not found")]
    NotFound { path: String },

    /// The remote store rejected the operation or could not be reached.
    #[error("store operation failed: {0}")]
    Store(#[source] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
