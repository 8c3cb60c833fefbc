//! The one piece of state that survives a destructive re-style or a
//! panel hide/show round trip.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use engine::CameraPose;
use geometry::FeatureCollection;
use layers::WeatherParameter;

/// Captured session state: camera pose, the last-applied collection, and
/// which weather parameters were toggled visible.
///
/// The feature data is held in memory rather than re-derived from the
/// engine — the engine does not expose "what layers currently exist" in
/// a form safe to replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub pose: CameraPose,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_collection: Option<FeatureCollection>,
    #[serde(default)]
    pub active_weather: BTreeSet<WeatherParameter>,
}
