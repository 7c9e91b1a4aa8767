use std::sync::{Arc, Mutex};

use fieldmap::{Marker, MarkerSurface, Navigator, Notifier};

/// One call received by a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Clear,
    Add(Marker),
}

#[derive(Default)]
struct SurfaceState {
    markers: Vec<Marker>,
    ops: Vec<SurfaceOp>,
}

/// Marker surface that keeps the current marker set and a call log.
///
/// Clones share state, so a clone handed to an engine can be inspected from
/// the test.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers currently on the map.
    pub fn markers(&self) -> Vec<Marker> {
        self.state.lock().unwrap().markers.clone()
    }

    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.state.lock().unwrap().ops.clone()
    }

    /// Number of full redraws seen so far.
    pub fn redraws(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::Clear))
            .count()
    }

    pub fn emphasized(&self) -> Vec<String> {
        self.markers()
            .into_iter()
            .filter(|marker| marker.emphasized)
            .map(|marker| marker.feature_id)
            .collect()
    }
}

impl MarkerSurface for RecordingSurface {
    fn clear_markers(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.markers.clear();
        state.ops.push(SurfaceOp::Clear);
    }

    fn add_marker(&mut self, marker: &Marker) {
        let mut state = self.state.lock().unwrap();
        state.markers.push(marker.clone());
        state.ops.push(SurfaceOp::Add(marker.clone()));
    }
}

/// Navigator remembering requested fragments and paths.
#[derive(Clone, Default)]
pub struct RecordingNavigator {
    fragments: Arc<Mutex<Vec<String>>>,
    paths: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fragments(&self) -> Vec<String> {
        self.fragments.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn set_fragment(&self, fragment: String) {
        self.fragments.lock().unwrap().push(fragment);
    }

    fn navigate(&self, path: String) {
        self.paths.lock().unwrap().push(path);
    }
}

/// Notifier remembering every failure notice.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    failures: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_failure(&self, message: &str) {
        self.failures.lock().unwrap().push(message.to_string());
    }
}
