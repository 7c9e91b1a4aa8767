//! Addresses inside the document store.
//!
//! Documents and collections alternate along slash-separated paths
//! (`projects/p1/features/f1`). Inside a document, nested values are
//! addressed by dot-separated field paths (`layers.L1.name`).

use std::fmt;

/// Path of a collection: an odd number of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

/// Path of a single document: an even number of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath(String);

impl CollectionPath {
    /// A top-level collection.
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn doc(&self, id: &str) -> DocumentPath {
        DocumentPath(format!("{}/{}", self.0, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn projects() -> Self {
        Self::root("projects")
    }

    pub fn users() -> Self {
        Self::root("users")
    }

    pub fn features(project_id: &str) -> Self {
        Self::projects().doc(project_id).collection("features")
    }

    pub fn observations(project_id: &str) -> Self {
        Self::projects().doc(project_id).collection("observations")
    }
}

impl DocumentPath {
    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}", self.0, name))
    }

    /// The last segment, which is the document's id.
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The collection holding this document.
    pub fn parent(&self) -> CollectionPath {
        match self.0.rsplit_once('/') {
            Some((parent, _)) => CollectionPath(parent.to_string()),
            None => CollectionPath(String::new()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn project(project_id: &str) -> Self {
        CollectionPath::projects().doc(project_id)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dot-separated path to a value nested inside one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn parse(dotted: &str) -> Self {
        Self::new(dotted.split('.'))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_collection_paths() {
        let features = CollectionPath::features("p1");
        assert_eq!(features.as_str(), "projects/p1/features");

        let doc = features.doc("f1");
        assert_eq!(doc.as_str(), "projects/p1/features/f1");
        assert_eq!(doc.id(), "f1");
        assert_eq!(doc.parent(), features);
    }

    #[test]
    fn field_path_round_trips_through_dots() {
        let path = FieldPath::parse("layers.L1.name");
        assert_eq!(path.segments(), ["layers", "L1", "name"]);
        assert_eq!(path.to_string(), "layers.L1.name");
    }
}
