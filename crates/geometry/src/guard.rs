//! Coordinate validation at the engine boundary.
//!
//! The rendering engine's bounds/camera entry points throw or silently
//! corrupt state when handed non-finite numbers, so every path where
//! external data reaches an engine call (bounds fitting, camera restore,
//! style replay) goes through this guard first.

use tracing::warn;

use crate::feature::{Coordinate, FeatureCollection};

/// True iff both components are finite numbers (not NaN, not ±Infinity).
pub fn is_valid_coordinate(pair: Coordinate) -> bool {
    pair[0].is_finite() && pair[1].is_finite()
}

/// Drop every feature whose geometry contains an invalid coordinate.
///
/// Validity is evaluated per whole feature; a feature is never partially
/// sanitized. Dropping is diagnostic-only, never fatal.
pub fn sanitize(collection: &FeatureCollection) -> FeatureCollection {
    let before = collection.features.len();
    let features: Vec<_> = collection
        .features
        .iter()
        .filter(|f| f.geometry.coordinates().iter().all(|c| is_valid_coordinate(*c)))
        .cloned()
        .collect();

    let dropped = before - features.len();
    if dropped > 0 {
        warn!(dropped, "dropped features with non-finite coordinates");
    }

    FeatureCollection {
        features,
        metadata: collection.metadata.clone(),
    }
}
