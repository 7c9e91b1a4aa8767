//! Partial writes into a single document.
//!
//! A [`Patch`] is a set of `field path → value` updates. Applying it replaces
//! the value found at each path and leaves every path it does not name
//! untouched, so writing `layers.A` never disturbs `layers.B`. Clearing a
//! subtree therefore requires an explicit empty value; omitting the key keeps
//! whatever the store already holds.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::path::FieldPath;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    updates: BTreeMap<FieldPath, Value>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an update, replacing an earlier update of the same path.
    pub fn set(mut self, path: FieldPath, value: Value) -> Self {
        self.updates.insert(path, value);
        self
    }

    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        self.updates.get(path)
    }

    pub fn updates(&self) -> impl Iterator<Item = (&FieldPath, &Value)> {
        self.updates.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Applies every update to `doc` in place.
    ///
    /// Intermediate maps are created as needed; a non-map value standing in
    /// the way of a path is replaced by a map.
    pub fn apply_to(&self, doc: &mut Map<String, Value>) {
        for (path, value) in &self.updates {
            let Some((leaf, parents)) = path.segments().split_last() else {
                continue;
            };
            let mut node = &mut *doc;
            for segment in parents {
                let slot = node
                    .entry(segment.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                node = match slot {
                    Value::Object(map) => map,
                    _ => unreachable!("slot was just made an object"),
                };
            }
            node.insert(leaf.clone(), value.clone());
        }
    }

    /// Nested document equivalent of this patch, as if applied to an empty
    /// document.
    pub fn to_document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        self.apply_to(&mut doc);
        doc
    }
}
