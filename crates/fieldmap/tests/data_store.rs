use std::sync::Arc;

use fieldmap::{
    DataStore, DocumentPath, Error, Field, Form, Layer, LocalizedText, CollectionPath, Response,
};
use fieldmap_testing::MemoryDocumentStore;
use futures::StreamExt;
use serde_json::json;

fn seeded() -> (MemoryDocumentStore, DataStore) {
    let store = MemoryDocumentStore::new();
    store.set_document(
        &DocumentPath::project("p1"),
        json!({
            "title": {"en": "Forest survey", "pt": "Levantamento florestal"},
            "layers": {
                "A": {"name": {"en": "Trees"}, "color": "green", "forms": {}},
                "B": {
                    "name": {"en": "Wells"},
                    "forms": {"form1": {"elements": {"q1": {"label": {"en": "Depth?"}}}}}
                }
            }
        }),
    );
    let data = DataStore::new(Arc::new(store.clone()));
    (store, data)
}

#[tokio::test]
async fn loads_project_tree() {
    let (_, data) = seeded();
    let project = data.load_project("p1").await.unwrap();

    assert_eq!(project.title.get("pt"), "Levantamento florestal");
    assert_eq!(project.layers.len(), 2);
    assert_eq!(project.layers["A"].color.as_deref(), Some("green"));
    assert_eq!(project.form("B", "form1").unwrap().fields["q1"].label.get("en"), "Depth?");
}

#[tokio::test]
async fn missing_project_is_not_found() {
    let (_, data) = seeded();
    let err = data.load_project("p2").await.unwrap_err();
    assert!(matches!(err, Error::NotFound { ref path } if path == "projects/p2"));
}

#[tokio::test]
async fn writing_one_layer_leaves_siblings_untouched() {
    let (store, data) = seeded();
    let before = data.load_project("p1").await.unwrap();

    let edited = before.layers["A"]
        .with_name("en", "Old trees")
        .with_forms([("f9".to_string(), Form::new("f9"))].into());
    data.update_layer("p1", &edited).await.unwrap();

    let after = data.load_project("p1").await.unwrap();
    assert_eq!(after.layers["A"], edited);
    assert_eq!(after.layers["B"], before.layers["B"]);
    assert_eq!(after.title, before.title);

    let raw = store.document(&DocumentPath::project("p1")).unwrap();
    assert_eq!(raw["layers"]["B"]["name"], json!({"en": "Wells"}));
}

#[tokio::test]
async fn cleared_fields_are_written_as_empty() {
    let (_, data) = seeded();
    data.update_layer("p1", &Layer::new("B")).await.unwrap();

    let after = data.load_project("p1").await.unwrap();
    assert!(after.layers["B"].name.is_empty());
    assert!(after.layers["B"].forms.is_empty());
    assert_eq!(after.layers["A"].name.get("en"), "Trees");
}

#[tokio::test]
async fn new_layer_is_added_next_to_existing_ones() {
    let (_, data) = seeded();
    let id = data.generate_id();
    let form = Form::new("form1").with_field(Field::text("q1", LocalizedText::single("en", "Species?")));
    let layer = Layer::new(id.clone())
        .with_name("en", "Plots")
        .with_forms([("form1".to_string(), form)].into());

    data.update_layer("p1", &layer).await.unwrap();

    let project = data.load_project("p1").await.unwrap();
    assert_eq!(project.layers.len(), 3);
    assert_eq!(project.layers[&id], layer);
}

#[tokio::test]
async fn title_update_keeps_other_languages() {
    let (_, data) = seeded();
    data.update_project_title("p1", "en", "Woodland survey").await.unwrap();

    let project = data.load_project("p1").await.unwrap();
    assert_eq!(project.title.get("en"), "Woodland survey");
    assert_eq!(project.title.get("pt"), "Levantamento florestal");
}

#[tokio::test]
async fn failed_write_surfaces_as_store_error() {
    let (store, data) = seeded();
    store.fail_writes(true);
    let err = data.update_layer("p1", &Layer::new("A")).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));

    store.fail_writes(false);
    let project = data.load_project("p1").await.unwrap();
    assert_eq!(project.layers["A"].name.get("en"), "Trees");
}

#[tokio::test]
async fn features_stream_follows_remote_changes() {
    let (store, data) = seeded();
    let features = CollectionPath::features("p1");
    store.set_document(
        &features.doc("f1"),
        json!({"layerId": "A", "location": {"latitude": 1.0, "longitude": 1.0}}),
    );
    let project = data.load_project("p1").await.unwrap();
    let mut stream = data.features(&project);

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.len(), 1);

    store.set_document(
        &features.doc("f2"),
        json!({"layerId": "B", "location": {"latitude": 2.0, "longitude": 2.0}}),
    );
    let second = stream.next().await.unwrap().unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[1].layer_id, "B");

    store.set_document(&features.doc("f3"), json!({"layerId": "B"}));
    let third = stream.next().await.unwrap();
    assert!(matches!(third, Err(Error::Decode(_))));
}

#[tokio::test]
async fn observations_are_scoped_to_their_feature() {
    let (store, data) = seeded();
    store.set_document(
        &CollectionPath::features("p1").doc("f1"),
        json!({"layerId": "B", "location": {"latitude": 0, "longitude": 0}}),
    );
    let observations = CollectionPath::observations("p1");
    store.set_document(
        &observations.doc("o1"),
        json!({"featureId": "f1", "formId": "form1", "responses": {"q1": "12m"}}),
    );
    store.set_document(
        &observations.doc("o2"),
        json!({"featureId": "f2", "formId": "form1", "responses": {"q1": "3m"}}),
    );

    let project = data.load_project("p1").await.unwrap();
    let feature = data.load_feature("p1", "f1").await.unwrap();
    let list = data
        .observations(&project, &feature)
        .next()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, "o1");
    assert_eq!(list[0].form.id, "form1");
    assert_eq!(list[0].responses["q1"], Response::Text("12m".into()));
}

#[tokio::test]
async fn loads_user_profile() {
    let (store, data) = seeded();
    store.set_document(
        &CollectionPath::users().doc("u1"),
        json!({"displayName": "Ana", "email": "ana@example.org"}),
    );
    let user = data.load_user("u1").await.unwrap();
    assert_eq!(user.id.as_deref(), Some("u1"));
    assert_eq!(user.display_name.as_deref(), Some("Ana"));
}

#[test]
fn generated_ids_are_distinct_before_any_write() {
    let (store, data) = seeded();
    let first = data.generate_id();
    let second = data.generate_id();
    assert_ne!(first, second);
    assert_eq!(store.merge_calls(), 0);
}
