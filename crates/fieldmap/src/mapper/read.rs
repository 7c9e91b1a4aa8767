use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use super::Fields;
use crate::error::{DecodeError, Error};
use crate::model::{
    AuditInfo, Cardinality, Feature, Field, FieldOption, FieldType, Form, Layer, LocalizedText,
    Location, MultipleChoice, Observation, Project, Response, User,
};

/// Converts a project document into a [`Project`].
///
/// ```text
/// {
///   title: {en: "Survey"},
///   description: {en: "..."},
///   layers: {layer001: {...}, ...}
/// }
/// ```
pub fn to_project(id: &str, data: &Value) -> Result<Project, DecodeError> {
    let fields = Fields::new("project", id, data)?;
    Ok(Project {
        id: id.to_string(),
        title: localized(&fields, "title")?,
        description: localized(&fields, "description")?,
        layers: fields
            .entries("layers")?
            .map(|(id, data)| Ok((id.clone(), to_layer(id, data)?)))
            .collect::<Result<_, DecodeError>>()?,
    })
}

pub fn to_layer(id: &str, data: &Value) -> Result<Layer, DecodeError> {
    let fields = Fields::new("layer", id, data)?;
    Ok(Layer {
        id: id.to_string(),
        color: fields.string("color")?,
        name: localized(&fields, "name")?,
        forms: fields
            .entries("forms")?
            .map(|(id, data)| Ok((id.clone(), to_form(id, data)?)))
            .collect::<Result<_, DecodeError>>()?,
    })
}

/// Converts a form document. Fields live under the `elements` key.
pub fn to_form(id: &str, data: &Value) -> Result<Form, DecodeError> {
    let fields = Fields::new("form", id, data)?;
    Ok(Form {
        id: id.to_string(),
        fields: fields
            .entries("elements")?
            .map(|(id, data)| Ok((id.clone(), to_field(id, data)?)))
            .collect::<Result<_, DecodeError>>()?,
    })
}

/// Converts a form element document.
///
/// ```text
/// {
///   index: 1,
///   label: {en: "Question 2"},
///   required: false,
///   type: "multiple_choice",
///   cardinality: "select_one",
///   options: {option001: {index: 0, code: "A", label: {en: "Option A"}}}
/// }
/// ```
///
/// The declared `type` is not consulted; every field reads as
/// [`FieldType::Text`].
pub fn to_field(id: &str, data: &Value) -> Result<Field, DecodeError> {
    let fields = Fields::new("field", id, data)?;
    // Decoded up front so a bad value fails even without options.
    let cardinality = fields.decode::<Cardinality>("cardinality")?;
    let choice = match fields.map("options")? {
        None => None,
        Some(options) => Some(MultipleChoice {
            cardinality,
            options: options
                .iter()
                .map(|(id, data)| Ok((id.clone(), to_option(id, data)?)))
                .collect::<Result<_, DecodeError>>()?,
        }),
    };
    Ok(Field {
        id: id.to_string(),
        field_type: FieldType::Text,
        label: localized(&fields, "label")?,
        required: fields.bool("required")?.unwrap_or(false),
        choice,
    })
}

pub fn to_option(id: &str, data: &Value) -> Result<FieldOption, DecodeError> {
    let fields = Fields::new("option", id, data)?;
    Ok(FieldOption {
        id: id.to_string(),
        code: fields.string("code")?,
        label: localized(&fields, "label")?,
    })
}

/// Converts a feature document; `layerId` and `location` are required.
pub fn to_feature(id: &str, data: &Value) -> Result<Feature, DecodeError> {
    let fields = Fields::new("feature", id, data)?;
    let location = fields
        .decode::<Location>("location")?
        .ok_or_else(|| fields.missing("location"))?;
    Ok(Feature {
        id: id.to_string(),
        layer_id: fields.required_string("layerId")?,
        location,
    })
}

/// Converts an observation document, resolving its form through `project`.
///
/// ```text
/// {
///   featureId: "feature123",
///   formId: "form001",
///   responses: {element001: "Response text", element002: ["A", "B"]},
///   created: <AUDIT_INFO>,
///   lastModified: <AUDIT_INFO>
/// }
/// ```
///
/// A form that cannot be found under the feature's layer is a lookup error;
/// no empty form is substituted.
pub fn to_observation(
    project: &Project,
    feature: &Feature,
    id: &str,
    data: &Value,
) -> Result<Observation, Error> {
    let fields = Fields::new("observation", id, data)?;
    let form_id = fields.required_string("formId")?;
    let form = project.form(&feature.layer_id, &form_id)?.clone();

    let mut responses = BTreeMap::new();
    for (field_id, value) in fields.entries("responses")? {
        responses.insert(field_id.clone(), response(id, field_id, value)?);
    }

    Ok(Observation {
        id: id.to_string(),
        form,
        created: audit_info(id, data.get("created").unwrap_or(&Value::Null))?,
        last_modified: audit_info(id, data.get("lastModified").unwrap_or(&Value::Null))?,
        responses,
    })
}

/// Converts an audit info map.
///
/// ```text
/// {
///   user: {id: ..., displayName: ..., email: ...},
///   clientTimestamp: ...,
///   serverTimestamp: ...
/// }
/// ```
pub fn to_audit_info(data: &Value) -> Result<AuditInfo, DecodeError> {
    audit_info("", data)
}

pub fn to_user(id: &str, data: &Value) -> Result<User, DecodeError> {
    let user: User = Fields::new("user", id, data)?.decode_all()?;
    Ok(User {
        id: user.id.or_else(|| (!id.is_empty()).then(|| id.to_string())),
        ..user
    })
}

fn audit_info(owner: &str, data: &Value) -> Result<AuditInfo, DecodeError> {
    let fields = Fields::new("audit info", owner, data)?;
    let user = match fields.map("user")? {
        Some(_) => Some(to_user("", &data["user"])?),
        None => None,
    };
    Ok(AuditInfo {
        user,
        client_timestamp: timestamp(owner, data, "clientTimestamp")?,
        server_timestamp: timestamp(owner, data, "serverTimestamp")?,
    })
}

/// Reads an RFC 3339 string or a `{seconds, nanoseconds}` map.
///
/// Both parts of the map form must be integers, with nanoseconds in
/// `0..1_000_000_000`.
fn timestamp(
    owner: &str,
    data: &Value,
    key: &'static str,
) -> Result<Option<DateTime<Utc>>, DecodeError> {
    let invalid = || DecodeError::InvalidTimestamp {
        entity: "audit info",
        id: owner.to_string(),
        key,
    };
    let parsed = match data.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw)
            .map(|at| at.with_timezone(&Utc))
            .ok(),
        Some(Value::Object(parts)) => {
            let seconds = parts.get("seconds").and_then(Value::as_i64);
            let nanos = match parts.get("nanoseconds") {
                None | Some(Value::Null) => Some(0),
                Some(value) => value
                    .as_u64()
                    .and_then(|nanos| u32::try_from(nanos).ok())
                    .filter(|nanos| *nanos < 1_000_000_000),
            };
            match (seconds, nanos) {
                (Some(seconds), Some(nanos)) => Utc.timestamp_opt(seconds, nanos).single(),
                _ => None,
            }
        }
        Some(_) => None,
    };
    parsed.map(Some).ok_or_else(invalid)
}

fn localized(fields: &Fields<'_>, key: &str) -> Result<LocalizedText, DecodeError> {
    Ok(fields.decode(key)?.unwrap_or_default())
}

fn response(observation: &str, field_id: &str, value: &Value) -> Result<Response, DecodeError> {
    let unexpected = |found: &Value| DecodeError::UnexpectedType {
        entity: "observation",
        id: observation.to_string(),
        key: format!("responses.{field_id}"),
        expected: "string, number or list of strings",
        found: super::kind(found),
    };
    match value {
        Value::String(text) => Ok(Response::Text(text.clone())),
        Value::Number(number) => number.as_f64().map(Response::Number).ok_or_else(|| unexpected(value)),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(code) => Ok(code.clone()),
                other => Err(unexpected(other)),
            })
            .collect::<Result<_, _>>()
            .map(Response::Choices),
        other => Err(unexpected(other)),
    }
}
