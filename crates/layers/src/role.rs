//! Semantic layer roles and their stable source/layer identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use engine::{LayerId, SourceId};

/// The closed set of weather overlay parameters.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum WeatherParameter {
    Temperature,
    Precipitation,
    Wind,
    Pressure,
    Humidity,
}

impl WeatherParameter {
    pub const ALL: [WeatherParameter; 5] = [
        WeatherParameter::Temperature,
        WeatherParameter::Precipitation,
        WeatherParameter::Wind,
        WeatherParameter::Pressure,
        WeatherParameter::Humidity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherParameter::Temperature => "temperature",
            WeatherParameter::Precipitation => "precipitation",
            WeatherParameter::Wind => "wind",
            WeatherParameter::Pressure => "pressure",
            WeatherParameter::Humidity => "humidity",
        }
    }

    /// Parse an externally supplied parameter name; `None` for unknown
    /// names, which callers log and skip rather than error on.
    pub fn parse(name: &str) -> Option<Self> {
        WeatherParameter::ALL
            .into_iter()
            .find(|p| p.as_str() == name)
    }
}

impl fmt::Display for WeatherParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic category of rendered content, mapped 1:1 to one source/layer
/// pair. At most one live pair exists per role at any time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerRole {
    /// Point markers.
    Wells,
    /// Filled + outlined polygons, color keyed by a `status` property.
    Blocks,
    /// Per-parameter heatmap.
    Weather(WeatherParameter),
}

impl LayerRole {
    pub fn source_id(&self) -> SourceId {
        SourceId(format!("{self}-source"))
    }

    pub fn layer_id(&self) -> LayerId {
        LayerId(format!("{self}-layer"))
    }
}

impl fmt::Display for LayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerRole::Wells => f.write_str("wells"),
            LayerRole::Blocks => f.write_str("blocks"),
            LayerRole::Weather(param) => write!(f, "weather:{param}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_names_round_trip() {
        for param in WeatherParameter::ALL {
            assert_eq!(WeatherParameter::parse(param.as_str()), Some(param));
        }
        assert_eq!(WeatherParameter::parse("fog"), None);
    }

    #[test]
    fn role_identifiers_are_distinct_per_role() {
        let roles = [
            LayerRole::Wells,
            LayerRole::Blocks,
            LayerRole::Weather(WeatherParameter::Wind),
        ];
        for a in &roles {
            for b in &roles {
                if a != b {
                    assert_ne!(a.source_id(), b.source_id());
                    assert_ne!(a.layer_id(), b.layer_id());
                }
            }
        }
        assert_eq!(
            LayerRole::Weather(WeatherParameter::Wind).to_string(),
            "weather:wind"
        );
    }
}
