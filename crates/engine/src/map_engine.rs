//! The narrow imperative command set this core drives the rendering
//! engine through.
//!
//! The real renderer is an opaque external capability; everything above
//! this seam talks to it exclusively via [`MapEngine`]. Implementations
//! must treat `set_style` as destructive: it discards every source and
//! layer, and the new style is only safe to populate once a
//! [`EngineEvent::StyleLoaded`] notification is observed.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use geometry::{FeatureCollection, LonLatBounds};

use crate::camera::CameraPose;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub String);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renderer family for a layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Circle,
    Fill,
    Line,
    Heatmap,
}

/// Pointer-interaction behavior bound to a layer at creation time.
///
/// Bindings are layer-scoped: they are discarded automatically when the
/// layer is removed, so there is no separate teardown lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionSpec {
    /// Switch to a pointer cursor while hovering features of this layer.
    pub hover_cursor: bool,
    /// Click → detail popup keyed off the feature's property bag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup: Option<PopupSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopupSpec {
    /// Property used as the popup title, when present on the feature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_property: Option<String>,
    /// Properties listed in the popup body; empty means all of them.
    #[serde(default)]
    pub properties: Vec<String>,
}

/// Everything needed to create one layer over one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: LayerId,
    pub source: SourceId,
    pub kind: LayerKind,
    /// Paint properties, engine-expression values included.
    #[serde(default)]
    pub paint: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<InteractionSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    SourceNotFound(SourceId),
    LayerNotFound(LayerId),
    /// The requested elevation data source cannot be attached.
    SourceUnavailable(SourceId),
    /// Terrain rendering is not supported by the current style.
    TerrainUnsupported,
    /// A destructive style swap is in flight; the style is not yet safe
    /// to populate.
    StyleNotReady,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::SourceNotFound(id) => write!(f, "source not found: {id}"),
            EngineError::LayerNotFound(id) => write!(f, "layer not found: {id}"),
            EngineError::SourceUnavailable(id) => write!(f, "source unavailable: {id}"),
            EngineError::TerrainUnsupported => write!(f, "terrain rendering unsupported"),
            EngineError::StyleNotReady => write!(f, "style swap in flight"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Notifications the engine surfaces back to its driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A destructive style swap finished loading; the style may now be
    /// repopulated.
    StyleLoaded,
    /// A just-added source finished internal layout/projection
    /// bookkeeping and is safe to fit the camera against.
    SourceSettled(SourceId),
}

/// Imperative command surface of the underlying renderer.
///
/// Camera motions are fire-and-forget: a later request supersedes an
/// in-flight animation, relying on the engine's own interruption
/// behavior. Implementations never panic on missing handles; they report
/// [`EngineError`] and leave state untouched.
pub trait MapEngine {
    fn add_source(&mut self, id: SourceId, data: FeatureCollection) -> Result<(), EngineError>;
    fn remove_source(&mut self, id: &SourceId) -> Result<(), EngineError>;
    fn has_source(&self, id: &SourceId) -> bool;

    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), EngineError>;
    fn remove_layer(&mut self, id: &LayerId) -> Result<(), EngineError>;
    fn has_layer(&self, id: &LayerId) -> bool;
    fn set_paint_property(
        &mut self,
        id: &LayerId,
        key: &str,
        value: Value,
    ) -> Result<(), EngineError>;

    fn camera_pose(&self) -> CameraPose;
    fn jump_to(&mut self, pose: CameraPose);
    fn center_on(&mut self, center: geometry::Coordinate, zoom: f64);
    fn fit_bounds(&mut self, bounds: LonLatBounds, padding_px: f64, max_zoom: f64);

    /// Destructive: discards all sources and layers. Repopulation must
    /// wait for [`EngineEvent::StyleLoaded`].
    fn set_style(&mut self, style: &str);

    /// Register an elevation (DEM) source by url.
    fn add_dem_source(&mut self, id: SourceId, url: &str) -> Result<(), EngineError>;
    fn set_terrain(&mut self, source: &SourceId) -> Result<(), EngineError>;
    fn clear_terrain(&mut self);

    /// Drain pending notifications in emission order.
    fn poll_events(&mut self) -> Vec<EngineEvent>;
}
