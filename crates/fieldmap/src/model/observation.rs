use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::Form;

/// Identity of whoever created or modified a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// Who touched a record and when.
///
/// Both timestamps are optional: the server timestamp in particular may not
/// have been resolved yet when the document is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditInfo {
    pub user: Option<User>,
    pub client_timestamp: Option<DateTime<Utc>>,
    pub server_timestamp: Option<DateTime<Utc>>,
}

/// One answer to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Text(String),
    Number(f64),
    /// Selected option codes of a multiple choice field.
    Choices(Vec<String>),
}

/// A filled-in form attached to a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub id: String,
    /// Resolved from the owning project when the observation is read.
    pub form: Form,
    pub created: AuditInfo,
    pub last_modified: AuditInfo,
    pub responses: BTreeMap<String, Response>,
}
