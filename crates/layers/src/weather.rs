//! Weather overlay control.
//!
//! The descriptor decides which heatmap layers exist; the toggle path is
//! paint-property-only because it is user-driven and frequent. Hidden
//! overlays stay created at opacity 0 so re-toggling never pays recreate
//! cost.

use std::collections::BTreeSet;

use serde_json::json;
use tracing::warn;

use engine::MapEngine;
use geometry::{Feature, FeatureCollection, WeatherDescriptor};

use crate::registry::LayerRegistry;
use crate::role::{LayerRole, WeatherParameter};
use crate::symbology::{heatmap_tuning, weather_style};

#[derive(Debug, Default)]
pub struct WeatherOverlayController {
    active: BTreeSet<WeatherParameter>,
}

impl WeatherOverlayController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters currently toggled visible.
    pub fn active(&self) -> &BTreeSet<WeatherParameter> {
        &self.active
    }

    /// Create one heatmap layer per descriptor parameter, nested
    /// "additional" parameters included, from the features tagged for it.
    /// Unknown parameter names are logged and ignored; the descriptor is
    /// externally supplied and may evolve ahead of this enumeration.
    pub fn apply_descriptor(
        &mut self,
        engine: &mut dyn MapEngine,
        registry: &mut LayerRegistry,
        descriptor: &WeatherDescriptor,
        weather_features: &[Feature],
    ) {
        for (name, visible) in flatten_descriptor(descriptor) {
            let Some(param) = WeatherParameter::parse(&name) else {
                warn!(parameter = %name, "unknown weather parameter in descriptor");
                continue;
            };

            let partition: Vec<Feature> = weather_features
                .iter()
                .filter(|f| f.layer_tag() == Some(param.as_str()))
                .cloned()
                .collect();

            registry.upsert(
                engine,
                LayerRole::Weather(param),
                &FeatureCollection::new(partition),
                weather_style(param, visible),
            );
            if visible {
                self.active.insert(param);
            } else {
                self.active.remove(&param);
            }
        }
    }

    /// Cheap visibility flip: opacity paint property plus active-set
    /// bookkeeping. Never touches the create/destroy path.
    pub fn toggle(&mut self, engine: &mut dyn MapEngine, param: WeatherParameter, visible: bool) {
        let opacity = if visible {
            heatmap_tuning(param).visible_opacity
        } else {
            0.0
        };
        let layer = LayerRole::Weather(param).layer_id();
        if let Err(err) = engine.set_paint_property(&layer, "heatmap-opacity", json!(opacity)) {
            warn!(%param, %err, "weather toggle skipped");
            return;
        }

        if visible {
            self.active.insert(param);
        } else {
            self.active.remove(&param);
        }
    }

    /// Reconcile every live overlay against a previously captured active
    /// set. Layers recreated from a descriptor carry the descriptor's
    /// initial visibility, which user toggles may have since overridden;
    /// the captured set wins. The layers must already exist; restore
    /// ordering guarantees that.
    pub fn sync_active(
        &mut self,
        engine: &mut dyn MapEngine,
        desired: &BTreeSet<WeatherParameter>,
        live: &[WeatherParameter],
    ) {
        for param in live {
            self.toggle(engine, *param, desired.contains(param));
        }
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

/// Top-level parameters followed by their nested "additional" entries.
fn flatten_descriptor(descriptor: &WeatherDescriptor) -> Vec<(String, bool)> {
    let mut out = Vec::new();
    for (name, entry) in descriptor {
        out.push((name.clone(), entry.visible));
        for (nested, nested_entry) in &entry.additional {
            out.push((nested.clone(), nested_entry.visible));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::HeadlessEngine;
    use geometry::{Geometry, OverlayEntry};

    fn tagged(param: &str, lon: f64, value: f64) -> Feature {
        Feature::new(Geometry::Point([lon, 10.0]))
            .with_property("layer", param)
            .with_property("value", value)
    }

    fn descriptor(entries: &[(&str, bool)]) -> WeatherDescriptor {
        entries
            .iter()
            .map(|(name, visible)| {
                (
                    (*name).to_owned(),
                    OverlayEntry {
                        visible: *visible,
                        additional: Default::default(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn descriptor_creates_one_layer_per_known_parameter() {
        let mut engine = HeadlessEngine::new();
        let mut registry = LayerRegistry::new();
        let mut weather = WeatherOverlayController::new();

        let features = vec![
            tagged("temperature", 106.0, 28.0),
            tagged("wind", 107.0, 12.0),
        ];
        weather.apply_descriptor(
            &mut engine,
            &mut registry,
            &descriptor(&[("temperature", true), ("wind", false), ("smog", true)]),
            &features,
        );

        assert!(registry.is_live(LayerRole::Weather(WeatherParameter::Temperature)));
        assert!(registry.is_live(LayerRole::Weather(WeatherParameter::Wind)));
        assert_eq!(engine.layer_count(), 2);
        assert!(weather.active().contains(&WeatherParameter::Temperature));
        assert!(!weather.active().contains(&WeatherParameter::Wind));
    }

    #[test]
    fn nested_additional_parameters_are_created_too() {
        let mut engine = HeadlessEngine::new();
        let mut registry = LayerRegistry::new();
        let mut weather = WeatherOverlayController::new();

        let mut desc = descriptor(&[("temperature", true)]);
        desc.get_mut("temperature").unwrap().additional.insert(
            "pressure".to_owned(),
            OverlayEntry {
                visible: true,
                additional: Default::default(),
            },
        );

        weather.apply_descriptor(&mut engine, &mut registry, &desc, &[]);
        assert!(registry.is_live(LayerRole::Weather(WeatherParameter::Pressure)));
    }

    #[test]
    fn toggle_changes_opacity_without_recreating() {
        let mut engine = HeadlessEngine::new();
        let mut registry = LayerRegistry::new();
        let mut weather = WeatherOverlayController::new();

        weather.apply_descriptor(
            &mut engine,
            &mut registry,
            &descriptor(&[("precipitation", true)]),
            &[tagged("precipitation", 106.0, 4.0)],
        );
        engine.poll_events();

        weather.toggle(&mut engine, WeatherParameter::Precipitation, false);

        let layer = LayerRole::Weather(WeatherParameter::Precipitation).layer_id();
        let spec = engine.layer(&layer).unwrap();
        assert_eq!(spec.paint["heatmap-opacity"], json!(0.0));
        // No settle event: the source was not recreated.
        assert!(engine.poll_events().is_empty());
        assert!(!weather.active().contains(&WeatherParameter::Precipitation));
    }

    #[test]
    fn sync_active_overrides_descriptor_visibility() {
        let mut engine = HeadlessEngine::new();
        let mut registry = LayerRegistry::new();
        let mut weather = WeatherOverlayController::new();

        // Descriptor says visible, but the captured active set is empty:
        // the captured set wins.
        weather.apply_descriptor(
            &mut engine,
            &mut registry,
            &descriptor(&[("temperature", true), ("wind", false)]),
            &[tagged("temperature", 106.0, 28.0), tagged("wind", 107.0, 9.0)],
        );

        let desired = [WeatherParameter::Wind].into_iter().collect();
        weather.sync_active(
            &mut engine,
            &desired,
            &[WeatherParameter::Temperature, WeatherParameter::Wind],
        );

        let temp_layer = LayerRole::Weather(WeatherParameter::Temperature).layer_id();
        let wind_layer = LayerRole::Weather(WeatherParameter::Wind).layer_id();
        assert_eq!(
            engine.layer(&temp_layer).unwrap().paint["heatmap-opacity"],
            json!(0.0)
        );
        assert_eq!(
            engine.layer(&wind_layer).unwrap().paint["heatmap-opacity"],
            json!(heatmap_tuning(WeatherParameter::Wind).visible_opacity)
        );
        assert_eq!(weather.active(), &desired);
    }

    #[test]
    fn toggle_on_a_missing_layer_is_a_logged_noop() {
        let mut engine = HeadlessEngine::new();
        let mut weather = WeatherOverlayController::new();
        weather.toggle(&mut engine, WeatherParameter::Humidity, true);
        assert!(weather.active().is_empty());
    }
}
