use crate::error::ProjectionError;
use crate::model::{Feature, Location, Project};

pub const DEFAULT_MARKER_COLOR: &str = "red";
pub const SELECTION_KEY: &str = "f";

const EMPHASIZED_SCALE: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionConfig {
    /// Color for features whose layer has none, or an empty one.
    pub default_color: String,
    /// Fragment parameter holding the selected feature id.
    pub selection_key: String,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            default_color: DEFAULT_MARKER_COLOR.to_string(),
            selection_key: SELECTION_KEY.to_string(),
        }
    }
}

impl ProjectionConfig {
    pub fn with_default_color(mut self, color: impl Into<String>) -> Self {
        self.default_color = color.into();
        self
    }

    pub fn with_selection_key(mut self, key: impl Into<String>) -> Self {
        self.selection_key = key.into();
        self
    }
}

/// What the map draws for one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub feature_id: String,
    pub position: Location,
    pub color: String,
    /// Set for the selected feature only.
    pub emphasized: bool,
}

impl Marker {
    /// Icon scale: selected markers are drawn larger.
    pub fn scale(&self) -> f64 {
        if self.emphasized {
            EMPHASIZED_SCALE
        } else {
            1.0
        }
    }
}

/// Builds the complete marker set for `features`.
///
/// Fails on the first feature whose layer is missing from `project`; no
/// default is substituted for a missing layer.
pub fn compute_markers(
    project: &Project,
    features: &[Feature],
    selected: Option<&str>,
    config: &ProjectionConfig,
) -> Result<Vec<Marker>, ProjectionError> {
    features
        .iter()
        .map(|feature| {
            let layer = project
                .layers
                .get(&feature.layer_id)
                .ok_or_else(|| ProjectionError::MissingLayer {
                    feature_id: feature.id.clone(),
                    layer_id: feature.layer_id.clone(),
                })?;
            Ok(Marker {
                feature_id: feature.id.clone(),
                position: feature.location,
                color: layer
                    .color
                    .clone()
                    .filter(|color| !color.is_empty())
                    .unwrap_or_else(|| config.default_color.clone()),
                emphasized: selected == Some(feature.id.as_str()),
            })
        })
        .collect()
}
