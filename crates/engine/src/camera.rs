use serde::{Deserialize, Serialize};

use geometry::Coordinate;

/// Full camera state: `{center, zoom, pitch, bearing}`.
///
/// Pitch and bearing default to zero on the wire; callers that only carry
/// `{center, zoom}` restore to a flat, north-up view.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub center: Coordinate,
    pub zoom: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub bearing: f64,
}

impl CameraPose {
    pub const fn new(center: Coordinate, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            pitch: 0.0,
            bearing: 0.0,
        }
    }

    /// A pose is only safe to apply when center and zoom are finite.
    pub fn is_valid(&self) -> bool {
        self.center[0].is_finite() && self.center[1].is_finite() && self.zoom.is_finite()
    }
}

/// The fixed pose the panel opens with and returns to on a clear.
pub const DEFAULT_POSE: CameraPose = CameraPose::new([106.0, 14.0], 5.0);

/// Pitch applied for the 3D perspective view.
pub const PITCH_3D_DEG: f64 = 60.0;

impl Default for CameraPose {
    fn default() -> Self {
        DEFAULT_POSE
    }
}
