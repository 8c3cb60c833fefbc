//! Camera-target derivation from a feature collection.
//!
//! The single-feature and many-feature cases are deliberately distinct: a
//! one-point "fit" degenerates to an undefined or absurd zoom in most
//! rendering engines' bounds APIs, so one valid coordinate centers the
//! camera at a fixed default zoom instead.

use serde::{Deserialize, Serialize};

use crate::feature::{Coordinate, FeatureCollection};
use crate::guard::is_valid_coordinate;

/// Zoom applied when centering on a single feature.
pub const SINGLE_POINT_ZOOM: f64 = 10.0;
/// Screen padding requested around a fitted rectangle, in pixels.
pub const FIT_PADDING_PX: f64 = 50.0;
/// Zoom ceiling for a fit so tight clusters do not zoom in unreasonably far.
pub const FIT_MAX_ZOOM: f64 = 12.0;

/// Axis-aligned geographic rectangle in WGS84 degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LonLatBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl LonLatBounds {
    pub fn from_point(p: Coordinate) -> Self {
        Self {
            min_lon: p[0],
            min_lat: p[1],
            max_lon: p[0],
            max_lat: p[1],
        }
    }

    pub fn extend(&mut self, p: Coordinate) {
        self.min_lon = self.min_lon.min(p[0]);
        self.min_lat = self.min_lat.min(p[1]);
        self.max_lon = self.max_lon.max(p[0]);
        self.max_lat = self.max_lat.max(p[1]);
    }

    pub fn center(&self) -> Coordinate {
        [
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        ]
    }
}

/// Where the camera should go after a data update.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CameraTarget {
    /// No valid coordinate; leave the camera alone.
    None,
    /// Exactly one valid coordinate; center on it at [`SINGLE_POINT_ZOOM`].
    Center(Coordinate),
    /// Two or more valid coordinates; fit the spanning rectangle.
    Fit(LonLatBounds),
}

/// Flatten, guard, then classify by valid-coordinate count.
pub fn compute_camera_target(collection: &FeatureCollection) -> CameraTarget {
    let mut valid = collection
        .features
        .iter()
        .flat_map(|f| f.geometry.coordinates())
        .filter(|c| is_valid_coordinate(*c));

    let Some(first) = valid.next() else {
        return CameraTarget::None;
    };
    let Some(second) = valid.next() else {
        return CameraTarget::Center(first);
    };

    let mut bounds = LonLatBounds::from_point(first);
    bounds.extend(second);
    for c in valid {
        bounds.extend(c);
    }
    CameraTarget::Fit(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Feature, FeatureCollection, Geometry};

    #[test]
    fn empty_collection_yields_none() {
        let target = compute_camera_target(&FeatureCollection::default());
        assert_eq!(target, CameraTarget::None);
    }

    #[test]
    fn all_invalid_coordinates_yield_none() {
        let collection =
            FeatureCollection::new(vec![Feature::new(Geometry::Point([f64::NAN, 1.0]))]);
        assert_eq!(compute_camera_target(&collection), CameraTarget::None);
    }

    #[test]
    fn single_point_yields_center() {
        let collection =
            FeatureCollection::new(vec![Feature::new(Geometry::Point([106.9, 10.2]))]);
        assert_eq!(
            compute_camera_target(&collection),
            CameraTarget::Center([106.9, 10.2])
        );
    }

    #[test]
    fn many_coordinates_yield_spanning_fit() {
        let collection = FeatureCollection::new(vec![
            Feature::new(Geometry::Point([100.0, 5.0])),
            Feature::new(Geometry::Polygon(vec![vec![
                [102.0, 8.0],
                [104.0, 6.0],
                [103.0, 4.0],
                [102.0, 8.0],
            ]])),
        ]);
        let CameraTarget::Fit(bounds) = compute_camera_target(&collection) else {
            panic!("expected fit");
        };
        assert_eq!(bounds.min_lon, 100.0);
        assert_eq!(bounds.max_lon, 104.0);
        assert_eq!(bounds.min_lat, 4.0);
        assert_eq!(bounds.max_lat, 8.0);
    }

    #[test]
    fn invalid_coordinates_are_skipped_not_spanned() {
        let collection = FeatureCollection::new(vec![
            Feature::new(Geometry::Point([100.0, 5.0])),
            Feature::new(Geometry::Point([f64::INFINITY, 5.0])),
        ]);
        assert_eq!(
            compute_camera_target(&collection),
            CameraTarget::Center([100.0, 5.0])
        );
    }
}
