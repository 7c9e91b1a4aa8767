//! Live map projection.
//!
//! ```text
//! active project ──┐
//! features ────────┼─► combine_latest ─► compute_markers ─► clear + add ─► MarkerSurface
//! URL fragment ────┘
//! ```
//!
//! No diffing: every emission replaces the whole marker set, so nothing stale
//! survives a project swap, a remote feature change or a new selection.

mod combine;
mod engine;
mod marker;
mod selection;

pub use combine::combine_latest;
pub use engine::{ProjectionEngine, ProjectionInputs, Subscription};
pub use marker::{compute_markers, Marker, ProjectionConfig, DEFAULT_MARKER_COLOR, SELECTION_KEY};
pub use selection::{parse_selection, select_feature, selection_fragment};
