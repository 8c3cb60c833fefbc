//! The map session orchestrator.
//!
//! Owns the rendering-engine instance exclusively and wires the guard,
//! registry, bounds calculator, weather controller, draw bridge, and
//! snapshot together behind the imperative command surface the panel
//! calls. No command ever surfaces an error to the caller: invalid input
//! is skipped, a missing engine makes every command a defensive no-op,
//! and unsupported capabilities degrade locally.

use tracing::{debug, warn};

use engine::{
    CameraPose, DEFAULT_POSE, EngineError, EngineEvent, MapEngine, PITCH_3D_DEG, SourceId,
};
use geometry::{
    CameraTarget, FIT_MAX_ZOOM, FIT_PADDING_PX, Feature, FeatureCollection, LonLatBounds,
    SINGLE_POINT_ZOOM, compute_camera_target, sanitize,
};
use layers::{
    LayerRegistry, LayerRole, WeatherOverlayController, WeatherParameter, blocks_style,
    wells_style,
};

use crate::draw::{DrawBridge, DrawEvent, PolygonEvent, PolygonFilter};
use crate::snapshot::SessionSnapshot;

/// Primary elevation source attached in 3D mode.
pub const TERRAIN_DEM_PRIMARY: &str = "terrain-dem";
/// Alternate elevation source tried when the primary is unavailable.
pub const TERRAIN_DEM_FALLBACK: &str = "terrain-dem-backup";

const TERRAIN_DEM_PRIMARY_URL: &str = "atlas://terrain/primary";
const TERRAIN_DEM_FALLBACK_URL: &str = "atlas://terrain/backup";

type PolygonObserver = Box<dyn FnMut(PolygonEvent)>;

/// One map panel's session over one engine instance.
///
/// A session may be constructed detached (panel not yet mounted); every
/// command no-ops until an engine is attached, and detaching captures a
/// snapshot that the next attach replays.
pub struct MapSession<E: MapEngine> {
    engine: Option<E>,
    registry: LayerRegistry,
    weather: WeatherOverlayController,
    draw: DrawBridge,
    snapshot: SessionSnapshot,
    last_collection: Option<FeatureCollection>,
    /// Fit deferred until the just-added source settles; a newer update
    /// supersedes it.
    pending_fit: Option<CameraTarget>,
    /// Destructive re-style in flight; repopulation waits for the
    /// style-loaded notification.
    style_swapping: bool,
    three_d: bool,
    observer: Option<PolygonObserver>,
}

impl<E: MapEngine> MapSession<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Some(engine),
            registry: LayerRegistry::new(),
            weather: WeatherOverlayController::new(),
            draw: DrawBridge::new(),
            snapshot: SessionSnapshot::default(),
            last_collection: None,
            pending_fit: None,
            style_swapping: false,
            three_d: false,
            observer: None,
        }
    }

    /// A session with no engine yet; commands no-op until
    /// [`MapSession::attach_engine`].
    pub fn detached() -> Self {
        Self {
            engine: None,
            registry: LayerRegistry::new(),
            weather: WeatherOverlayController::new(),
            draw: DrawBridge::new(),
            snapshot: SessionSnapshot::default(),
            last_collection: None,
            pending_fit: None,
            style_swapping: false,
            three_d: false,
            observer: None,
        }
    }

    /// Register the outbound polygon-event callback.
    pub fn on_polygon_event(&mut self, observer: impl FnMut(PolygonEvent) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn is_3d(&self) -> bool {
        self.three_d
    }

    pub fn polygons(&self) -> impl Iterator<Item = &PolygonFilter> {
        self.draw.polygons()
    }

    /// Mount: take ownership of the engine and replay the held snapshot.
    pub fn attach_engine(&mut self, engine: E) {
        self.engine = Some(engine);
        self.restore_snapshot_now();
    }

    /// Unmount: capture a snapshot, then release the engine.
    pub fn detach_engine(&mut self) -> Option<E> {
        if self.engine.is_some() {
            self.snapshot = self.capture();
        }
        self.style_swapping = false;
        self.pending_fit = None;
        self.engine.take()
    }

    /// Drain engine notifications and run the work gated on them: the
    /// style-loaded replay and any pending bounds fit.
    pub fn pump_events(&mut self) {
        let events = match self.engine.as_mut() {
            Some(engine) => engine.poll_events(),
            None => return,
        };
        for event in events {
            match event {
                EngineEvent::StyleLoaded => self.finish_style_swap(),
                EngineEvent::SourceSettled(source) => {
                    debug!(%source, "source settled");
                    self.run_pending_fit();
                }
            }
        }
    }

    // --- command surface -------------------------------------------------

    /// Bulk data replacement. A collection is either "weather mode" or
    /// "standard mode", never mixed in one call.
    pub fn update_map_data(&mut self, collection: FeatureCollection) {
        if self.engine.is_none() {
            debug!("update_map_data before engine attach");
            return;
        }
        if self.style_swapping {
            // The new style is not safe to populate yet; the style-loaded
            // replay will render whatever arrived last.
            debug!("style swap in flight; deferring update to style load");
            self.last_collection = Some(collection.clone());
            self.snapshot.last_collection = Some(collection);
            return;
        }

        if collection.is_empty() {
            debug!("update with empty feature collection");
        }

        self.last_collection = Some(collection.clone());
        self.render_collection(&collection);

        // The fit is deferred until the engine reports the new source
        // settled; fitting an unsettled source intermittently computes an
        // empty or stale box.
        self.pending_fit = match compute_camera_target(&sanitize(&collection)) {
            CameraTarget::None => None,
            target => Some(target),
        };
    }

    pub fn fit_bounds(&mut self, bounds: LonLatBounds) {
        let Some(engine) = self.engine.as_mut() else {
            debug!("fit_bounds before engine attach");
            return;
        };
        let finite = [
            bounds.min_lon,
            bounds.min_lat,
            bounds.max_lon,
            bounds.max_lat,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            warn!("fit_bounds rejected non-finite rectangle");
            return;
        }
        engine.fit_bounds(bounds, FIT_PADDING_PX, FIT_MAX_ZOOM);
    }

    pub fn toggle_weather_layer(&mut self, parameter: &str, visible: bool) {
        let Some(param) = WeatherParameter::parse(parameter) else {
            warn!(parameter, "ignoring unknown weather parameter");
            return;
        };
        let Some(engine) = self.engine.as_mut() else {
            debug!("toggle_weather_layer before engine attach");
            return;
        };
        self.weather.toggle(&mut *engine, param, visible);
    }

    /// Names of the weather parameters with a live heatmap layer.
    pub fn weather_layers(&self) -> Vec<String> {
        self.registry
            .roles()
            .filter_map(|role| match role {
                LayerRole::Weather(param) => Some(param.as_str().to_owned()),
                _ => None,
            })
            .collect()
    }

    pub fn map_state(&self) -> CameraPose {
        self.engine
            .as_ref()
            .map(|e| e.camera_pose())
            .unwrap_or(self.snapshot.pose)
    }

    /// Guarded camera restore: a non-finite center or zoom aborts the
    /// jump without throwing.
    pub fn restore_map_state(&mut self, pose: CameraPose) {
        if !pose.is_valid() {
            warn!("restore_map_state rejected non-finite pose");
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            debug!("restore_map_state before engine attach");
            return;
        };
        engine.jump_to(pose);
    }

    /// Attach elevation for a 3D perspective, degrading source by source:
    /// primary DEM, then the alternate, then pitch-only when terrain
    /// rendering itself is unsupported.
    pub fn toggle_3d(&mut self, enabled: bool) {
        let Some(engine) = self.engine.as_mut() else {
            debug!("toggle_3d before engine attach");
            return;
        };
        self.three_d = enabled;

        if enabled {
            if !attach_terrain(&mut *engine) {
                warn!("elevation unavailable; applying pitch-only 3D");
            }
            let mut pose = engine.camera_pose();
            pose.pitch = PITCH_3D_DEG;
            engine.jump_to(pose);
        } else {
            engine.clear_terrain();
            let mut pose = engine.camera_pose();
            pose.pitch = 0.0;
            engine.jump_to(pose);
        }
    }

    /// Remove every role, delete all drawn polygons, reset the camera to
    /// the default pose, and discard the snapshot. This is the only
    /// operation that discards the snapshot itself.
    pub fn clear_map(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            debug!("clear_map before engine attach");
            return;
        };
        let roles: Vec<LayerRole> = self.registry.roles().collect();
        for role in roles {
            self.registry.remove(&mut *engine, role);
        }
        self.weather.clear();
        engine.jump_to(DEFAULT_POSE);

        let removed = self.draw.clear();
        if !removed.is_empty() {
            self.emit(PolygonEvent::Deleted(removed));
        }

        self.last_collection = None;
        self.snapshot = SessionSnapshot::default();
        self.pending_fit = None;
    }

    /// Destructive theme swap. The snapshot is captured up front; all
    /// repopulation waits for the engine's style-loaded notification.
    pub fn set_style(&mut self, style: &str) {
        if self.engine.is_none() {
            debug!("set_style before engine attach");
            return;
        }
        self.snapshot = self.capture();
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        engine.set_style(style);
        // The swap already invalidated every handle; forget them now so
        // the replay starts from a clean ledger.
        self.style_swapping = true;
        self.registry.reset();
        self.weather.clear();
    }

    /// Inbound edge from the draw tool; relays at most one domain event
    /// to the registered observer.
    pub fn handle_draw_event(&mut self, event: DrawEvent) {
        if let Some(domain_event) = self.draw.handle(event) {
            self.emit(domain_event);
        }
    }

    /// Snapshot of pose, last-applied data, and active weather set.
    pub fn capture(&self) -> SessionSnapshot {
        SessionSnapshot {
            pose: self.map_state(),
            last_collection: self.last_collection.clone(),
            active_weather: self.weather.active().clone(),
        }
    }

    // --- internals -------------------------------------------------------

    fn emit(&mut self, event: PolygonEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(event);
        }
    }

    fn finish_style_swap(&mut self) {
        if !self.style_swapping {
            return;
        }
        debug!("style loaded; replaying session snapshot");
        self.style_swapping = false;
        self.restore_snapshot_now();
    }

    /// Replay order is contractual: camera first (avoids a flash of
    /// default framing), then data through the normal upsert path (never
    /// assume any layer survived), then weather visibility (the layers
    /// must exist before their opacity is set).
    fn restore_snapshot_now(&mut self) {
        let snapshot = self.snapshot.clone();

        if snapshot.pose.is_valid() {
            if let Some(engine) = self.engine.as_mut() {
                engine.jump_to(snapshot.pose);
            }
        } else {
            warn!("snapshot pose non-finite; skipping camera restore");
        }

        if let Some(collection) = &snapshot.last_collection {
            self.last_collection = Some(collection.clone());
            self.render_collection(collection);
        }

        // The re-render recreated weather layers with the descriptor's
        // initial visibility; reconcile every live overlay against the
        // captured active set so user toggles survive the replay.
        let live: Vec<WeatherParameter> = self
            .registry
            .roles()
            .filter_map(|role| match role {
                LayerRole::Weather(param) => Some(param),
                _ => None,
            })
            .collect();
        if let Some(engine) = self.engine.as_mut() {
            self.weather
                .sync_active(&mut *engine, &snapshot.active_weather, &live);
        }

        // A replay reproduces the captured pose exactly; it never fits.
        self.pending_fit = None;
    }

    fn render_collection(&mut self, collection: &FeatureCollection) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        if let Some(descriptor) = collection.weather_descriptor() {
            // Weather mode: heatmaps plus untagged point markers; the
            // generic point/polygon partition path does not run.
            let weather_features: Vec<Feature> = collection
                .features
                .iter()
                .filter(|f| f.layer_tag().is_some())
                .cloned()
                .collect();
            let wells: Vec<Feature> = collection
                .features
                .iter()
                .filter(|f| f.layer_tag().is_none() && f.geometry.is_point())
                .cloned()
                .collect();

            // Heatmaps before markers so markers render on top.
            self.weather
                .apply_descriptor(&mut *engine, &mut self.registry, descriptor, &weather_features);
            if wells.is_empty() {
                self.registry.remove(&mut *engine, LayerRole::Wells);
            } else {
                self.registry.upsert(
                    &mut *engine,
                    LayerRole::Wells,
                    &FeatureCollection::new(wells),
                    wells_style(),
                );
            }
            return;
        }

        // Standard mode: polygons become blocks, points become wells.
        let blocks: Vec<Feature> = collection
            .features
            .iter()
            .filter(|f| f.geometry.is_polygon())
            .cloned()
            .collect();
        let wells: Vec<Feature> = collection
            .features
            .iter()
            .filter(|f| f.geometry.is_point())
            .cloned()
            .collect();

        // Blocks before wells so markers render on top.
        if blocks.is_empty() {
            self.registry.remove(&mut *engine, LayerRole::Blocks);
        } else {
            self.registry.upsert(
                &mut *engine,
                LayerRole::Blocks,
                &FeatureCollection::new(blocks),
                blocks_style(),
            );
        }
        if wells.is_empty() {
            self.registry.remove(&mut *engine, LayerRole::Wells);
        } else {
            self.registry.upsert(
                &mut *engine,
                LayerRole::Wells,
                &FeatureCollection::new(wells),
                wells_style(),
            );
        }
    }

    fn run_pending_fit(&mut self) {
        let Some(target) = self.pending_fit.take() else {
            return;
        };
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        match target {
            CameraTarget::Center(point) => engine.center_on(point, SINGLE_POINT_ZOOM),
            CameraTarget::Fit(bounds) => engine.fit_bounds(bounds, FIT_PADDING_PX, FIT_MAX_ZOOM),
            CameraTarget::None => {}
        }
    }
}

/// Try the primary DEM source, then the fallback. Returns false when no
/// elevation could be attached; the caller still applies the pitched
/// camera (3D perspective without relief).
fn attach_terrain(engine: &mut dyn MapEngine) -> bool {
    let candidates = [
        (TERRAIN_DEM_PRIMARY, TERRAIN_DEM_PRIMARY_URL),
        (TERRAIN_DEM_FALLBACK, TERRAIN_DEM_FALLBACK_URL),
    ];
    for (id, url) in candidates {
        let source = SourceId(id.to_owned());
        if let Err(err) = engine.add_dem_source(source.clone(), url) {
            warn!(%source, %err, "elevation source rejected");
            continue;
        }
        match engine.set_terrain(&source) {
            Ok(()) => return true,
            Err(EngineError::TerrainUnsupported) => {
                warn!("terrain rendering unsupported by current style");
                return false;
            }
            Err(err) => {
                warn!(%source, %err, "terrain attach failed");
            }
        }
    }
    false
}
