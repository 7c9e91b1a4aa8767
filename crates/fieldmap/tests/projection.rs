use std::sync::Arc;
use std::time::Duration;

use fieldmap::projection::select_feature;
use fieldmap::{
    CollectionPath, DataStore, DocumentPath, Feature, Location, Project, ProjectionConfig,
    ProjectionEngine, ProjectionError, ProjectionInputs, Result,
};
use fieldmap_testing::{MemoryDocumentStore, RecordingNavigator, RecordingSurface};
use futures::channel::mpsc::{self, UnboundedSender};
use futures::{stream, StreamExt};
use serde_json::json;

const PATIENCE: Duration = Duration::from_secs(2);

/// Polls `check` until it holds or the patience runs out.
async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(PATIENCE, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn seeded() -> (MemoryDocumentStore, DataStore) {
    let store = MemoryDocumentStore::new();
    store.set_document(
        &DocumentPath::project("p1"),
        json!({
            "layers": {
                "L1": {"color": "red"},
                "L2": {"color": "blue"}
            }
        }),
    );
    let features = CollectionPath::features("p1");
    store.set_document(
        &features.doc("f1"),
        json!({"layerId": "L1", "location": {"latitude": 1, "longitude": 1}}),
    );
    store.set_document(
        &features.doc("f2"),
        json!({"layerId": "L2", "location": {"latitude": 2, "longitude": 2}}),
    );
    let data = DataStore::new(Arc::new(store.clone()));
    (store, data)
}

struct Live {
    projects: UnboundedSender<Project>,
    features: UnboundedSender<Result<Vec<Feature>>>,
    fragments: UnboundedSender<String>,
}

fn live_inputs() -> (Live, ProjectionInputs) {
    let (projects, project_rx) = mpsc::unbounded();
    let (features, features_rx) = mpsc::unbounded();
    let (fragments, fragment_rx) = mpsc::unbounded();
    (
        Live {
            projects,
            features,
            fragments,
        },
        ProjectionInputs {
            project: project_rx.boxed(),
            features: features_rx.boxed(),
            fragment: fragment_rx.boxed(),
        },
    )
}

#[tokio::test]
async fn selected_feature_is_the_only_emphasized_marker() {
    let (store, data) = seeded();
    let project = data.load_project("p1").await.unwrap();
    let surface = RecordingSurface::new();

    let subscription = ProjectionEngine::new(surface.clone()).spawn(ProjectionInputs {
        project: stream::iter([project.clone()]).chain(stream::pending()).boxed(),
        features: data.features(&project),
        fragment: stream::iter(["f=f2".to_string()]).chain(stream::pending()).boxed(),
    });

    eventually(|| surface.markers().len() == 2).await;
    let markers = surface.markers();
    assert_eq!(surface.emphasized(), ["f2"]);
    assert_eq!(markers[0].color, "red");
    assert_eq!(markers[0].position, Location::new(1.0, 1.0));
    assert_eq!(markers[1].color, "blue");
    assert!(subscription.is_active());

    drop(subscription);
    eventually(|| store.subscriber_count() == 0).await;
}

#[tokio::test]
async fn remote_feature_changes_trigger_full_redraw() {
    let (store, data) = seeded();
    let project = data.load_project("p1").await.unwrap();
    let surface = RecordingSurface::new();

    let _subscription = ProjectionEngine::new(surface.clone()).spawn(ProjectionInputs {
        project: stream::iter([project.clone()]).chain(stream::pending()).boxed(),
        features: data.features(&project),
        fragment: stream::iter([String::new()]).chain(stream::pending()).boxed(),
    });
    eventually(|| surface.markers().len() == 2).await;

    store.remove_document(&CollectionPath::features("p1").doc("f1"));
    eventually(|| surface.markers().len() == 1).await;
    assert_eq!(surface.markers()[0].feature_id, "f2");
    assert!(surface.redraws() >= 2);
}

#[tokio::test]
async fn every_input_triggers_recomputation_with_latest_values() {
    let (_, data) = seeded();
    let project = data.load_project("p1").await.unwrap();
    let features = data.features(&project).next().await.unwrap().unwrap();
    let surface = RecordingSurface::new();
    let (live, inputs) = live_inputs();
    let _subscription = ProjectionEngine::new(surface.clone()).spawn(inputs);

    live.projects.unbounded_send(project.clone()).unwrap();
    live.features.unbounded_send(Ok(features.clone())).unwrap();
    live.fragments.unbounded_send(String::new()).unwrap();
    eventually(|| surface.redraws() == 1).await;
    assert!(surface.emphasized().is_empty());

    live.fragments.unbounded_send("f=f1".into()).unwrap();
    eventually(|| surface.redraws() == 2).await;
    assert_eq!(surface.emphasized(), ["f1"]);

    // Same triple again: same marker set, rebuilt from scratch.
    let before = surface.markers();
    live.projects.unbounded_send(project.clone()).unwrap();
    eventually(|| surface.redraws() == 3).await;
    assert_eq!(surface.markers(), before);

    // Project swap: layer colors follow the new project.
    let recolored = project.with_layer(project.layers["L1"].with_color(Some("yellow".into())));
    live.projects.unbounded_send(recolored).unwrap();
    eventually(|| surface.redraws() == 4).await;
    assert_eq!(surface.markers()[0].color, "yellow");
    assert_eq!(surface.markers()[1].color, "blue");
    assert_eq!(surface.emphasized(), ["f1"]);
}

#[tokio::test]
async fn cancelled_subscription_stops_all_rendering() {
    let (_, data) = seeded();
    let project = data.load_project("p1").await.unwrap();
    let features = data.features(&project).next().await.unwrap().unwrap();
    let surface = RecordingSurface::new();
    let (live, inputs) = live_inputs();
    let mut subscription = ProjectionEngine::new(surface.clone()).spawn(inputs);

    live.projects.unbounded_send(project).unwrap();
    live.features.unbounded_send(Ok(features)).unwrap();
    live.fragments.unbounded_send(String::new()).unwrap();
    eventually(|| surface.redraws() == 1).await;

    subscription.cancel();
    eventually(|| live.fragments.is_closed()).await;
    assert!(live.projects.is_closed());
    assert!(live.features.is_closed());

    assert!(live.fragments.unbounded_send("f=f2".into()).is_err());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(surface.redraws(), 1);
    assert!(!subscription.is_active());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stopped_subscription_renders_nothing_more() {
    let (_, data) = seeded();
    let project = data.load_project("p1").await.unwrap();
    let features = data.features(&project).next().await.unwrap().unwrap();
    let surface = RecordingSurface::new();
    let (live, inputs) = live_inputs();
    let subscription = ProjectionEngine::new(surface.clone()).spawn(inputs);

    live.projects.unbounded_send(project).unwrap();
    live.features.unbounded_send(Ok(features)).unwrap();
    for _ in 0..50 {
        live.fragments.unbounded_send("f=f1".into()).unwrap();
    }
    eventually(|| surface.redraws() >= 1).await;

    subscription.stop().await;
    let ops = surface.ops().len();
    assert!(live.fragments.is_closed());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(surface.ops().len(), ops);
}

#[tokio::test]
async fn feature_on_unknown_layer_stops_projection() {
    let (store, data) = seeded();
    store.set_document(
        &CollectionPath::features("p1").doc("f3"),
        json!({"layerId": "L9", "location": {"latitude": 3, "longitude": 3}}),
    );
    let project = data.load_project("p1").await.unwrap();
    let surface = RecordingSurface::new();

    let subscription = ProjectionEngine::new(surface.clone()).spawn(ProjectionInputs {
        project: stream::iter([project.clone()]).chain(stream::pending()).boxed(),
        features: data.features(&project),
        fragment: stream::iter([String::new()]).chain(stream::pending()).boxed(),
    });

    let err = subscription.finished().await.unwrap_err();
    assert_eq!(
        err,
        ProjectionError::MissingLayer {
            feature_id: "f3".into(),
            layer_id: "L9".into(),
        }
    );
    assert!(surface.ops().is_empty());
}

#[test]
fn marker_click_rewrites_only_the_fragment() {
    let navigator = RecordingNavigator::new();
    let config = ProjectionConfig::default();
    select_feature(&navigator, &config.selection_key, "f2");
    assert_eq!(navigator.fragments(), ["f=f2"]);
    assert!(navigator.paths().is_empty());
}
