//! Immutable survey domain model.
//!
//! Values here know nothing about the document store. They are built fresh
//! from every document read and never mutated in place: edits go through the
//! `with_*` helpers, which return new values and leave older snapshots valid.
//!
//! Ownership is strictly tree shaped:
//!
//! ```text
//! Project ─► Layer ─► Form ─► Field ─► MultipleChoice ─► FieldOption
//! ```

mod feature;
mod form;
mod observation;
mod project;
mod text;

pub use feature::{Feature, Location};
pub use form::{Cardinality, Field, FieldOption, FieldType, Form, MultipleChoice};
pub use observation::{AuditInfo, Observation, Response, User};
pub use project::{Layer, Project};
pub use text::LocalizedText;
