use futures::stream::{BoxStream, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::combine::combine_latest;
use super::marker::{compute_markers, Marker, ProjectionConfig};
use super::selection::parse_selection;
use crate::error::{ProjectionError, Result};
use crate::model::{Feature, Project};
use crate::surface::MarkerSurface;

/// The three live sources the marker set is derived from.
pub struct ProjectionInputs {
    /// Active project.
    pub project: BoxStream<'static, Project>,
    /// Features of the active project.
    pub features: BoxStream<'static, Result<Vec<Feature>>>,
    /// Current URL fragment.
    pub fragment: BoxStream<'static, String>,
}

/// Keeps a [`MarkerSurface`] in sync with the latest project, feature list
/// and selection.
///
/// Every combined emission rebuilds the full marker set: the surface is
/// cleared and every marker is re-added, with no suspension point in between.
pub struct ProjectionEngine<S> {
    surface: S,
    config: ProjectionConfig,
    renders: u64,
}

impl<S: MarkerSurface> ProjectionEngine<S> {
    pub fn new(surface: S) -> Self {
        Self::with_config(surface, ProjectionConfig::default())
    }

    pub fn with_config(surface: S, config: ProjectionConfig) -> Self {
        Self {
            surface,
            config,
            renders: 0,
        }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Replaces the rendered marker set with the one derived from the inputs.
    ///
    /// The marker set is computed before the surface is touched, so a failed
    /// computation leaves the previous markers in place.
    pub fn render(
        &mut self,
        project: &Project,
        features: &[Feature],
        fragment: &str,
    ) -> Result<Vec<Marker>, ProjectionError> {
        let selected = parse_selection(fragment, &self.config.selection_key);
        let markers = compute_markers(project, features, selected.as_deref(), &self.config)?;

        self.surface.clear_markers();
        for marker in &markers {
            self.surface.add_marker(marker);
        }
        self.renders += 1;
        debug!(
            project_id = %project.id,
            markers = markers.len(),
            selected = selected.as_deref().unwrap_or(""),
            render = self.renders,
            "markers rendered"
        );
        Ok(markers)
    }

    /// Renders on every combined emission until the inputs end.
    ///
    /// Stops at the first failure: an input error or a feature whose layer is
    /// missing from the project.
    pub async fn run(&mut self, inputs: ProjectionInputs) -> Result<(), ProjectionError> {
        let features = inputs.features.map(|features| {
            features.map_err(|err| ProjectionError::Input {
                input: "features",
                message: err.to_string(),
            })
        });
        let mut combined = combine_latest(inputs.project, features, inputs.fragment);

        while let Some((project, features, fragment)) = combined.next().await {
            let rendered = features.and_then(|features| self.render(&project, &features, &fragment));
            if let Err(err) = rendered {
                error!(project_id = %project.id, error = %err, "projection stopped");
                return Err(err);
            }
        }
        Ok(())
    }
}

impl<S: MarkerSurface + 'static> ProjectionEngine<S> {
    /// Runs the engine on the tokio runtime.
    ///
    /// The returned handle owns every input subscription; cancelling or
    /// dropping it stops all further rendering.
    pub fn spawn(mut self, inputs: ProjectionInputs) -> Subscription {
        let task = tokio::spawn(async move { self.run(inputs).await });
        Subscription { task: Some(task) }
    }
}

/// Aggregate handle over a running projection and all of its inputs.
#[must_use = "dropping the subscription stops the projection"]
pub struct Subscription {
    task: Option<JoinHandle<Result<(), ProjectionError>>>,
}

impl Subscription {
    /// Requests the projection to stop and release every input subscription.
    ///
    /// The task is aborted at its next suspension point. On a multi-threaded
    /// runtime a render already running on another worker may still complete
    /// after this returns; use [`Subscription::stop`] to wait for the task.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("projection subscription cancelled");
        }
    }

    /// Aborts the projection and waits until its task has ended.
    ///
    /// No marker changes happen once this returns.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            debug!("projection subscription stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Waits for the projection to end on its own.
    ///
    /// Returns `Ok(())` when the inputs ended or the subscription was
    /// cancelled.
    pub async fn finished(mut self) -> Result<(), ProjectionError> {
        match self.task.take() {
            Some(task) => match task.await {
                Ok(outcome) => outcome,
                Err(join_error) if join_error.is_cancelled() => Ok(()),
                Err(join_error) => std::panic::resume_unwind(join_error.into_panic()),
            },
            None => Ok(()),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use futures::stream;

    use super::*;
    use crate::model::{Layer, Location};

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear,
        Add(String, bool),
    }

    #[derive(Clone, Default)]
    struct Log(Arc<Mutex<Vec<Op>>>);

    impl MarkerSurface for Log {
        fn clear_markers(&mut self) {
            self.0.lock().unwrap().push(Op::Clear);
        }

        fn add_marker(&mut self, marker: &Marker) {
            self.0
                .lock()
                .unwrap()
                .push(Op::Add(marker.feature_id.clone(), marker.emphasized));
        }
    }

    fn project() -> Project {
        Project {
            id: "p1".into(),
            ..Project::default()
        }
        .with_layer(Layer::new("L1"))
    }

    fn feature(id: &str, layer_id: &str) -> Feature {
        Feature {
            id: id.into(),
            layer_id: layer_id.into(),
            location: Location::new(0.0, 0.0),
        }
    }

    #[test]
    fn render_clears_before_adding() {
        let log = Log::default();
        let mut engine = ProjectionEngine::new(log.clone());

        engine.render(&project(), &[feature("f1", "L1")], "").unwrap();
        engine
            .render(&project(), &[feature("f1", "L1"), feature("f2", "L1")], "f=f2")
            .unwrap();

        assert_eq!(
            *log.0.lock().unwrap(),
            vec![
                Op::Clear,
                Op::Add("f1".into(), false),
                Op::Clear,
                Op::Add("f1".into(), false),
                Op::Add("f2".into(), true),
            ]
        );
    }

    #[test]
    fn failed_render_leaves_surface_untouched() {
        let log = Log::default();
        let mut engine = ProjectionEngine::new(log.clone());

        let err = engine
            .render(&project(), &[feature("f1", "L1"), feature("f2", "L9")], "")
            .unwrap_err();

        assert!(matches!(err, ProjectionError::MissingLayer { .. }));
        assert!(log.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_stops_on_input_error() {
        let log = Log::default();
        let mut engine = ProjectionEngine::new(log.clone());
        let inputs = ProjectionInputs {
            project: stream::iter([project()]).boxed(),
            features: stream::iter([
                Ok(vec![feature("f1", "L1")]),
                Err(crate::Error::MissingContext("offline")),
            ])
            .boxed(),
            fragment: stream::iter([String::new()]).boxed(),
        };

        let err = engine.run(inputs).await.unwrap_err();
        assert!(matches!(err, ProjectionError::Input { input: "features", .. }));
    }
}
