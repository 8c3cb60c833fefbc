//! Feature-collection data model for the map panel.
//!
//! Collections arrive fully resolved from the analysis pipeline; this core
//! never fetches or mutates them in place. The shapes mirror the GeoJSON
//! subset the pipeline actually emits: point features, single-polygon
//! features, and an optional metadata block that selects weather-mode
//! rendering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A coordinate pair in WGS84: `[lon_deg, lat_deg]`.
pub type Coordinate = [f64; 2];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    /// A single position.
    Point(Coordinate),
    /// Rings of positions; the first ring is the outer boundary.
    Polygon(Vec<Vec<Coordinate>>),
}

impl Geometry {
    /// Flatten every coordinate of this geometry, ring vertices included.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        match self {
            Geometry::Point(p) => vec![*p],
            Geometry::Polygon(rings) => rings.iter().flatten().copied().collect(),
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Geometry::Point(_))
    }

    pub fn is_polygon(&self) -> bool {
        matches!(self, Geometry::Polygon(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    /// String-keyed property bag of mixed primitive values.
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_owned(), value.into());
        self
    }

    /// String property lookup, `None` when absent or not a string.
    pub fn string_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// The per-feature layer tag used to partition weather features.
    pub fn layer_tag(&self) -> Option<&str> {
        self.string_property("layer")
    }
}

/// Optional collection annotations supplied by the analysis pipeline.
///
/// Wire names are camelCase because the descriptor is an external input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_layers: Option<WeatherDescriptor>,
}

/// Which weather overlays exist and their initial visibility.
///
/// Keys are parameter names; unknown names are tolerated here and filtered
/// downstream, since the descriptor is externally supplied and may evolve.
pub type WeatherDescriptor = BTreeMap<String, OverlayEntry>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayEntry {
    pub visible: bool,
    /// Progressively-disclosed parameters nested one level down.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional: BTreeMap<String, OverlayEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CollectionMetadata>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            features,
            metadata: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True when the collection selects weather-mode rendering.
    pub fn weather_descriptor(&self) -> Option<&WeatherDescriptor> {
        self.metadata.as_ref()?.weather_layers.as_ref()
    }
}
