//! In-memory [`MapEngine`] implementation.
//!
//! Tracks exactly the state the trait contract describes — sources,
//! layers with paint properties, camera, style, terrain attachment — and
//! queues notifications for the next `poll_events` drain. Used by the
//! session tests and by hosts that render elsewhere.

use std::collections::BTreeMap;

use serde_json::Value;

use geometry::{Coordinate, FeatureCollection, LonLatBounds};

use crate::camera::{CameraPose, DEFAULT_POSE};
use crate::map_engine::{
    EngineError, EngineEvent, LayerId, LayerSpec, MapEngine, SourceId,
};

/// A camera-fit request as received, retained for inspection.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FitRequest {
    pub bounds: LonLatBounds,
    pub padding_px: f64,
    pub max_zoom: f64,
}

#[derive(Debug, Default)]
pub struct HeadlessEngine {
    sources: BTreeMap<SourceId, FeatureCollection>,
    layers: BTreeMap<LayerId, LayerSpec>,
    /// Insertion order; later layers render on top of earlier ones.
    layer_order: Vec<LayerId>,
    camera: CameraPose,
    style: String,
    dem_sources: BTreeMap<SourceId, String>,
    terrain: Option<SourceId>,
    pending: Vec<EngineEvent>,
    fit_requests: Vec<FitRequest>,
    terrain_supported: bool,
    rejected_dem_sources: Vec<SourceId>,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self {
            camera: DEFAULT_POSE,
            style: "light".to_owned(),
            terrain_supported: true,
            ..Self::default()
        }
    }

    /// Simulate a style that cannot render terrain.
    pub fn without_terrain_support(mut self) -> Self {
        self.terrain_supported = false;
        self
    }

    /// Simulate an elevation source that fails to attach.
    pub fn rejecting_dem_source(mut self, id: SourceId) -> Self {
        self.rejected_dem_sources.push(id);
        self
    }

    pub fn source(&self, id: &SourceId) -> Option<&FeatureCollection> {
        self.sources.get(id)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn layer(&self, id: &LayerId) -> Option<&LayerSpec> {
        self.layers.get(id)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Render order of live layers, bottom to top.
    pub fn layer_order(&self) -> &[LayerId] {
        &self.layer_order
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn terrain_source(&self) -> Option<&SourceId> {
        self.terrain.as_ref()
    }

    pub fn fit_requests(&self) -> &[FitRequest] {
        &self.fit_requests
    }
}

impl MapEngine for HeadlessEngine {
    fn add_source(&mut self, id: SourceId, data: FeatureCollection) -> Result<(), EngineError> {
        self.sources.insert(id.clone(), data);
        self.pending.push(EngineEvent::SourceSettled(id));
        Ok(())
    }

    fn remove_source(&mut self, id: &SourceId) -> Result<(), EngineError> {
        self.sources
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| EngineError::SourceNotFound(id.clone()))
    }

    fn has_source(&self, id: &SourceId) -> bool {
        self.sources.contains_key(id)
    }

    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), EngineError> {
        if !self.sources.contains_key(&spec.source) {
            return Err(EngineError::SourceNotFound(spec.source.clone()));
        }
        if !self.layers.contains_key(&spec.id) {
            self.layer_order.push(spec.id.clone());
        }
        self.layers.insert(spec.id.clone(), spec);
        Ok(())
    }

    fn remove_layer(&mut self, id: &LayerId) -> Result<(), EngineError> {
        if self.layers.remove(id).is_none() {
            return Err(EngineError::LayerNotFound(id.clone()));
        }
        self.layer_order.retain(|l| l != id);
        Ok(())
    }

    fn has_layer(&self, id: &LayerId) -> bool {
        self.layers.contains_key(id)
    }

    fn set_paint_property(
        &mut self,
        id: &LayerId,
        key: &str,
        value: Value,
    ) -> Result<(), EngineError> {
        let spec = self
            .layers
            .get_mut(id)
            .ok_or_else(|| EngineError::LayerNotFound(id.clone()))?;
        spec.paint.insert(key.to_owned(), value);
        Ok(())
    }

    fn camera_pose(&self) -> CameraPose {
        self.camera
    }

    fn jump_to(&mut self, pose: CameraPose) {
        self.camera = pose;
    }

    fn center_on(&mut self, center: Coordinate, zoom: f64) {
        self.camera.center = center;
        self.camera.zoom = zoom;
    }

    fn fit_bounds(&mut self, bounds: LonLatBounds, padding_px: f64, max_zoom: f64) {
        self.fit_requests.push(FitRequest {
            bounds,
            padding_px,
            max_zoom,
        });
        // Model the animation end state: center on the rectangle at a
        // zoom capped by the ceiling.
        self.camera.center = bounds.center();
        self.camera.zoom = self.camera.zoom.min(max_zoom);
    }

    fn set_style(&mut self, style: &str) {
        self.style = style.to_owned();
        self.sources.clear();
        self.layers.clear();
        self.layer_order.clear();
        self.dem_sources.clear();
        self.terrain = None;
        self.pending.push(EngineEvent::StyleLoaded);
    }

    fn add_dem_source(&mut self, id: SourceId, url: &str) -> Result<(), EngineError> {
        if self.rejected_dem_sources.contains(&id) {
            return Err(EngineError::SourceUnavailable(id));
        }
        self.dem_sources.insert(id, url.to_owned());
        Ok(())
    }

    fn set_terrain(&mut self, source: &SourceId) -> Result<(), EngineError> {
        if !self.terrain_supported {
            return Err(EngineError::TerrainUnsupported);
        }
        if !self.dem_sources.contains_key(source) {
            return Err(EngineError::SourceUnavailable(source.clone()));
        }
        self.terrain = Some(source.clone());
        Ok(())
    }

    fn clear_terrain(&mut self) {
        self.terrain = None;
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::{Feature, Geometry};

    fn one_point() -> FeatureCollection {
        FeatureCollection::new(vec![Feature::new(Geometry::Point([106.9, 10.2]))])
    }

    #[test]
    fn add_source_queues_settled_event() {
        let mut engine = HeadlessEngine::new();
        engine
            .add_source(SourceId("wells".into()), one_point())
            .unwrap();
        assert_eq!(
            engine.poll_events(),
            vec![EngineEvent::SourceSettled(SourceId("wells".into()))]
        );
        assert!(engine.poll_events().is_empty());
    }

    #[test]
    fn style_swap_discards_everything_and_signals_loaded() {
        let mut engine = HeadlessEngine::new();
        engine
            .add_source(SourceId("wells".into()), one_point())
            .unwrap();
        engine
            .add_layer(LayerSpec {
                id: LayerId("wells".into()),
                source: SourceId("wells".into()),
                kind: crate::LayerKind::Circle,
                paint: BTreeMap::new(),
                interaction: None,
            })
            .unwrap();

        engine.set_style("dark");
        assert_eq!(engine.source_count(), 0);
        assert_eq!(engine.layer_count(), 0);
        assert!(engine.poll_events().contains(&EngineEvent::StyleLoaded));
    }

    #[test]
    fn layer_requires_its_source() {
        let mut engine = HeadlessEngine::new();
        let err = engine
            .add_layer(LayerSpec {
                id: LayerId("orphan".into()),
                source: SourceId("missing".into()),
                kind: crate::LayerKind::Fill,
                paint: BTreeMap::new(),
                interaction: None,
            })
            .unwrap_err();
        assert_eq!(err, EngineError::SourceNotFound(SourceId("missing".into())));
    }

    #[test]
    fn terrain_honors_configured_failures() {
        let mut engine =
            HeadlessEngine::new().rejecting_dem_source(SourceId("dem-primary".into()));
        let err = engine
            .add_dem_source(SourceId("dem-primary".into()), "atlas://terrain")
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::SourceUnavailable(SourceId("dem-primary".into()))
        );

        engine
            .add_dem_source(SourceId("dem-backup".into()), "atlas://terrain-backup")
            .unwrap();
        engine.set_terrain(&SourceId("dem-backup".into())).unwrap();
        assert_eq!(engine.terrain_source(), Some(&SourceId("dem-backup".into())));
    }
}
