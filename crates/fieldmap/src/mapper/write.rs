use serde_json::{json, Map, Value};

use crate::model::{Field, FieldOption, Form, Layer, LocalizedText};
use crate::patch::Patch;
use crate::path::FieldPath;

/// Patch writing `layer` at `layers.<layer.id>` of its project document.
///
/// The whole layer subtree is replaced, so `name` and `forms` always carry an
/// explicit (possibly empty) map: a cleared name or form set must overwrite
/// what the store holds. Sibling layers are not part of the patch.
pub fn to_layer_patch(layer: &Layer) -> Patch {
    Patch::new().set(
        FieldPath::new(["layers", layer.id.as_str()]),
        layer_document(layer),
    )
}

/// Patch setting the project title in one language, keeping the others.
pub fn to_title_patch(lang: &str, title: &str) -> Patch {
    Patch::new().set(FieldPath::new(["title", lang]), json!(title))
}

pub fn layer_document(layer: &Layer) -> Value {
    let mut doc = Map::new();
    doc.insert("name".into(), text_document(&layer.name));
    doc.insert(
        "forms".into(),
        Value::Object(
            layer
                .forms
                .iter()
                .map(|(id, form)| (id.clone(), form_document(form)))
                .collect(),
        ),
    );
    if let Some(color) = &layer.color {
        doc.insert("color".into(), json!(color));
    }
    Value::Object(doc)
}

pub fn form_document(form: &Form) -> Value {
    let elements: Map<String, Value> = form
        .fields
        .iter()
        .map(|(id, field)| (id.clone(), field_document(field)))
        .collect();
    json!({ "elements": elements })
}

pub fn field_document(field: &Field) -> Value {
    let mut doc = Map::new();
    doc.insert("type".into(), json!(field.field_type));
    doc.insert("label".into(), text_document(&field.label));
    doc.insert("required".into(), json!(field.required));
    if let Some(choice) = &field.choice {
        if let Some(cardinality) = choice.cardinality {
            doc.insert("cardinality".into(), json!(cardinality));
        }
        doc.insert(
            "options".into(),
            Value::Object(
                choice
                    .options
                    .iter()
                    .map(|(id, option)| (id.clone(), option_document(option)))
                    .collect(),
            ),
        );
    }
    Value::Object(doc)
}

fn option_document(option: &FieldOption) -> Value {
    let mut doc = Map::new();
    if let Some(code) = &option.code {
        doc.insert("code".into(), json!(code));
    }
    doc.insert("label".into(), text_document(&option.label));
    Value::Object(doc)
}

fn text_document(text: &LocalizedText) -> Value {
    json!(text)
}
