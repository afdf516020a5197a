//! Geometry payloads exchanged with providers and renderers.
//!
//! These types are carried through the fetch engine without interpretation.
//! Geometry and properties are kept as raw JSON values; only the renderer
//! gives them meaning.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single feature: an optional identifier, a geometry and free-form properties.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub geometry: Value,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Creates a feature with the given geometry and no properties.
    pub fn new(geometry: Value) -> Self {
        Self {
            id: None,
            geometry,
            properties: Map::new(),
        }
    }

    /// Sets the feature identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// The geometry produced for one tile.
///
/// An empty collection means "nothing to deliver".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }
}

impl From<Vec<Feature>> for FeatureCollection {
    fn from(features: Vec<Feature>) -> Self {
        Self { features }
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

/// A feature filter expression, passed to the renderer unevaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Value);

impl Filter {
    pub fn new(expression: Value) -> Self {
        Self(expression)
    }

    pub fn expression(&self) -> &Value {
        &self.0
    }
}
