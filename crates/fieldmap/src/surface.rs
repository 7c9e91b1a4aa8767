//! Collaborators on the UI side: the map, the router and user notices.

use crate::projection::Marker;

/// Map drawing surface receiving marker instructions.
///
/// The projection engine always clears before re-adding, so implementations
/// need no diffing of their own.
pub trait MarkerSurface: Send {
    fn clear_markers(&mut self);
    fn add_marker(&mut self, marker: &Marker);
}

/// Router boundary.
pub trait Navigator: Send + Sync {
    /// Replaces only the fragment of the current location, keeping the path.
    fn set_fragment(&self, fragment: String);

    /// Navigates to an application path such as `p/<projectId>`.
    fn navigate(&self, path: String);
}

/// Shows user-visible notices.
pub trait Notifier: Send + Sync {
    fn notify_failure(&self, message: &str);
}
