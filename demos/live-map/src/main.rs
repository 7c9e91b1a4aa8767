//! # Live Map Example
//!
//! Wires a project, its live feature list and the URL fragment into a
//! projection that redraws a console "map", then adds a layer through the
//! layer editor. Everything runs against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use fieldmap::projection::select_feature;
use fieldmap::{
    CollectionPath, DataStore, DocumentPath, LayerEditor, LayerRef, Marker, MarkerSurface,
    Navigator, Notifier, ProjectionConfig, ProjectionEngine, ProjectionInputs,
};
use fieldmap_testing::MemoryDocumentStore;
use futures::channel::mpsc::{self, UnboundedSender};
use futures::stream::{self, StreamExt};
use serde_json::json;

// ============================================================================
// UI collaborators
// ============================================================================

/// Prints every marker instruction instead of drawing it.
struct ConsoleMap;

impl MarkerSurface for ConsoleMap {
    fn clear_markers(&mut self) {
        println!("  [map] cleared");
    }

    fn add_marker(&mut self, marker: &Marker) {
        println!(
            "  [map] {} at ({}, {}) color={} scale={}",
            marker.feature_id,
            marker.position.latitude,
            marker.position.longitude,
            marker.color,
            marker.scale()
        );
    }
}

/// Router feeding fragment changes straight back into the projection.
struct Router {
    fragments: UnboundedSender<String>,
}

impl Navigator for Router {
    fn set_fragment(&self, fragment: String) {
        println!("  [router] #{fragment}");
        let _ = self.fragments.unbounded_send(fragment);
    }

    fn navigate(&self, path: String) {
        println!("  [router] -> {path}");
    }
}

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify_failure(&self, message: &str) {
        eprintln!("  [notice] {message}");
    }
}

// ============================================================================
// Seed data
// ============================================================================

fn seed(store: &MemoryDocumentStore) {
    store.set_document(
        &DocumentPath::project("p1"),
        json!({
            "title": {"en": "Forest survey"},
            "layers": {
                "L1": {"name": {"en": "Trees"}, "color": "red"},
                "L2": {"name": {"en": "Wells"}, "color": "blue"}
            }
        }),
    );

    let features = CollectionPath::features("p1");
    store.set_document(
        &features.doc("f1"),
        json!({"layerId": "L1", "location": {"latitude": -3.1, "longitude": -60.0}}),
    );
    store.set_document(
        &features.doc("f2"),
        json!({"layerId": "L2", "location": {"latitude": -3.2, "longitude": -60.1}}),
    );
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let store = MemoryDocumentStore::new();
    seed(&store);
    let data = DataStore::new(Arc::new(store.clone()));

    let project = data.load_project("p1").await?;
    println!("Loaded project: {}", project.title.get("en"));

    let (fragments, fragment_rx) = mpsc::unbounded();
    let router = Arc::new(Router { fragments });
    let config = ProjectionConfig::default();

    let subscription = ProjectionEngine::with_config(ConsoleMap, config.clone()).spawn(
        ProjectionInputs {
            project: stream::iter([project.clone()]).chain(stream::pending()).boxed(),
            features: data.features(&project),
            fragment: fragment_rx.boxed(),
        },
    );

    println!("Initial render:");
    router.set_fragment(String::new());
    settle().await;

    println!("Selecting f2:");
    select_feature(router.as_ref(), &config.selection_key, "f2");
    settle().await;

    println!("Remote feature added:");
    store.set_document(
        &CollectionPath::features("p1").doc("f3"),
        json!({"layerId": "L1", "location": {"latitude": -3.3, "longitude": -60.2}}),
    );
    settle().await;

    println!("Adding a layer:");
    let mut editor = LayerEditor::new(
        data.clone(),
        router.clone(),
        Arc::new(ConsoleNotifier),
        LayerRef::from_route(":new"),
    );
    editor.on_project_loaded(&project)?;
    editor.set_name("Plots");
    editor.set_question("Canopy cover?");
    let layer = editor.save().await?;
    println!("Saved layer {} ({})", layer.id, layer.name.get("en"));

    let reloaded = data.load_project("p1").await?;
    println!("Project now has {} layers", reloaded.layers.len());

    subscription.stop().await;
    println!("Projection stopped.");

    Ok(())
}
