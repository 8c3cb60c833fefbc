//! Fixed styling policy per layer role.
//!
//! Styling is policy, not per-call configuration: wells are constant
//! circle markers, blocks are translucent fills colored by their `status`
//! property, and each weather parameter gets a heatmap tuned to that
//! parameter's natural value range.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use engine::{InteractionSpec, LayerKind, PopupSpec};

use crate::role::WeatherParameter;

/// Style material for one role: renderer family, paint properties, and
/// the pointer-interaction binding attached at layer creation.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleStyle {
    pub kind: LayerKind,
    pub paint: BTreeMap<String, Value>,
    pub interaction: Option<InteractionSpec>,
}

/// Discrete `status → color` lookup for block polygons.
pub const STATUS_COLORS: &[(&str, &str)] = &[
    ("producing", "#2e7d32"),
    ("development", "#1565c0"),
    ("exploration", "#ef6c00"),
    ("suspended", "#c62828"),
];

/// Fallback for unrecognized status values.
pub const DEFAULT_STATUS_COLOR: &str = "#78909c";

pub const BLOCK_FILL_OPACITY: f64 = 0.3;
pub const WELL_RADIUS_PX: f64 = 6.0;
pub const WELL_FILL_COLOR: &str = "#ffb300";
pub const WELL_STROKE_COLOR: &str = "#263238";

/// Heatmap tuning for one weather parameter.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HeatmapTuning {
    /// Natural value range the weight ramp spans.
    pub weight_domain: [f64; 2],
    pub intensity: f64,
    pub radius_px: f64,
    /// Opacity when the overlay is visible; hidden overlays get 0 instead
    /// of removal, so a re-toggle never pays recreate cost.
    pub visible_opacity: f64,
}

pub fn heatmap_tuning(param: WeatherParameter) -> HeatmapTuning {
    match param {
        WeatherParameter::Temperature => HeatmapTuning {
            weight_domain: [24.0, 32.0],
            intensity: 1.2,
            radius_px: 40.0,
            visible_opacity: 0.7,
        },
        WeatherParameter::Precipitation => HeatmapTuning {
            weight_domain: [0.0, 25.0],
            intensity: 1.0,
            radius_px: 35.0,
            visible_opacity: 0.65,
        },
        WeatherParameter::Wind => HeatmapTuning {
            weight_domain: [0.0, 20.0],
            intensity: 0.9,
            radius_px: 30.0,
            visible_opacity: 0.6,
        },
        WeatherParameter::Pressure => HeatmapTuning {
            weight_domain: [1000.0, 1020.0],
            intensity: 0.8,
            radius_px: 45.0,
            visible_opacity: 0.55,
        },
        WeatherParameter::Humidity => HeatmapTuning {
            weight_domain: [40.0, 100.0],
            intensity: 1.0,
            radius_px: 38.0,
            visible_opacity: 0.6,
        },
    }
}

/// Color ramp shared by every heatmap; weight/intensity carry the
/// per-parameter character.
fn heatmap_color_ramp() -> Value {
    json!([
        "interpolate",
        ["linear"],
        ["heatmap-density"],
        0.0, "rgba(33, 102, 172, 0)",
        0.2, "rgb(103, 169, 207)",
        0.4, "rgb(209, 229, 240)",
        0.6, "rgb(253, 219, 199)",
        0.8, "rgb(239, 138, 98)",
        1.0, "rgb(178, 24, 43)"
    ])
}

pub fn wells_style() -> RoleStyle {
    let mut paint = BTreeMap::new();
    paint.insert("circle-radius".to_owned(), json!(WELL_RADIUS_PX));
    paint.insert("circle-color".to_owned(), json!(WELL_FILL_COLOR));
    paint.insert("circle-stroke-width".to_owned(), json!(1.5));
    paint.insert("circle-stroke-color".to_owned(), json!(WELL_STROKE_COLOR));

    RoleStyle {
        kind: LayerKind::Circle,
        paint,
        interaction: Some(InteractionSpec {
            hover_cursor: true,
            popup: Some(PopupSpec {
                title_property: Some("name".to_owned()),
                properties: Vec::new(),
            }),
        }),
    }
}

pub fn blocks_style() -> RoleStyle {
    let mut match_expr = vec![json!("match"), json!(["get", "status"])];
    for (status, color) in STATUS_COLORS {
        match_expr.push(json!(status));
        match_expr.push(json!(color));
    }
    match_expr.push(json!(DEFAULT_STATUS_COLOR));
    let fill_color = Value::Array(match_expr);

    let mut paint = BTreeMap::new();
    paint.insert("fill-color".to_owned(), fill_color.clone());
    paint.insert("fill-opacity".to_owned(), json!(BLOCK_FILL_OPACITY));
    paint.insert("fill-outline-color".to_owned(), fill_color);

    RoleStyle {
        kind: LayerKind::Fill,
        paint,
        interaction: Some(InteractionSpec {
            hover_cursor: true,
            popup: Some(PopupSpec {
                title_property: Some("name".to_owned()),
                properties: Vec::new(),
            }),
        }),
    }
}

pub fn weather_style(param: WeatherParameter, visible: bool) -> RoleStyle {
    let tuning = heatmap_tuning(param);
    let [lo, hi] = tuning.weight_domain;

    let mut paint = BTreeMap::new();
    paint.insert(
        "heatmap-weight".to_owned(),
        json!(["interpolate", ["linear"], ["get", "value"], lo, 0.0, hi, 1.0]),
    );
    paint.insert("heatmap-intensity".to_owned(), json!(tuning.intensity));
    paint.insert("heatmap-radius".to_owned(), json!(tuning.radius_px));
    paint.insert("heatmap-color".to_owned(), heatmap_color_ramp());
    paint.insert(
        "heatmap-opacity".to_owned(),
        json!(if visible { tuning.visible_opacity } else { 0.0 }),
    );

    RoleStyle {
        kind: LayerKind::Heatmap,
        paint,
        interaction: None,
    }
}
