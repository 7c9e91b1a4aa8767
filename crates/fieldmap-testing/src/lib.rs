//! Testing utilities for fieldmap.
//!
//! - [`MemoryDocumentStore`]: an in-process [`DocumentStore`] with live
//!   collection streams, write counting and injectable write failures
//! - [`RecordingSurface`], [`RecordingNavigator`], [`RecordingNotifier`]:
//!   collaborators that remember every call for later assertions

mod memory;
mod recording;

pub use memory::MemoryDocumentStore;
pub use recording::{RecordingNavigator, RecordingNotifier, RecordingSurface, SurfaceOp};

pub use fieldmap::DocumentStore;
