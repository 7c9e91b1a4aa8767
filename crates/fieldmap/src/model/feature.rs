use serde::Deserialize;

/// Stored as `{latitude, longitude}`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A surveyed point belonging to one layer of a project.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: String,
    /// Key into `Project::layers`.
    pub layer_id: String,
    pub location: Location,
}
