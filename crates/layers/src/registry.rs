//! Role → source/layer lifecycle.
//!
//! Updating a role is always "remove-if-present, then recreate"; the
//! engine's in-place source mutation path is never used, which sidesteps
//! stale-handle and partial-update bugs after destructive re-styles. The
//! registry tracks only which roles it created — never engine-internal
//! handles, which become invalid after any style swap.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use engine::{LayerSpec, MapEngine};
use geometry::{FeatureCollection, sanitize};

use crate::role::LayerRole;
use crate::symbology::RoleStyle;

#[derive(Debug, Default)]
pub struct LayerRegistry {
    live: BTreeSet<LayerRole>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roles with a live source/layer pair, in stable order.
    pub fn roles(&self) -> impl Iterator<Item = LayerRole> + '_ {
        self.live.iter().copied()
    }

    pub fn is_live(&self, role: LayerRole) -> bool {
        self.live.contains(&role)
    }

    /// Idempotent create-or-replace for one role.
    ///
    /// Data is sanitized on write; the interaction binding travels inside
    /// the layer spec and dies with the layer.
    pub fn upsert(
        &mut self,
        engine: &mut dyn MapEngine,
        role: LayerRole,
        collection: &FeatureCollection,
        style: RoleStyle,
    ) {
        self.remove(engine, role);

        let clean = sanitize(collection);
        let source = role.source_id();
        if let Err(err) = engine.add_source(source.clone(), clean) {
            warn!(%role, %err, "source creation failed");
            return;
        }
        let spec = LayerSpec {
            id: role.layer_id(),
            source,
            kind: style.kind,
            paint: style.paint,
            interaction: style.interaction,
        };
        if let Err(err) = engine.add_layer(spec) {
            warn!(%role, %err, "layer creation failed");
            return;
        }

        self.live.insert(role);
        debug!(%role, "layer upserted");
    }

    /// Tear down both handles for a role; a no-op when absent. Not-found
    /// conditions from the engine are ignored by design of the
    /// remove-then-recreate protocol.
    pub fn remove(&mut self, engine: &mut dyn MapEngine, role: LayerRole) {
        let _ = engine.remove_layer(&role.layer_id());
        let _ = engine.remove_source(&role.source_id());
        self.live.remove(&role);
    }

    /// Forget all bookkeeping without touching the engine. Used after a
    /// destructive style swap, which already discarded every handle.
    pub fn reset(&mut self) {
        self.live.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::HeadlessEngine;
    use geometry::{Feature, Geometry};

    use crate::symbology::wells_style;

    fn wells() -> FeatureCollection {
        FeatureCollection::new(vec![
            Feature::new(Geometry::Point([106.9, 10.2])),
            Feature::new(Geometry::Point([107.1, 10.4])),
        ])
    }

    #[test]
    fn upsert_twice_leaves_exactly_one_pair() {
        let mut engine = HeadlessEngine::new();
        let mut registry = LayerRegistry::new();

        registry.upsert(&mut engine, LayerRole::Wells, &wells(), wells_style());
        registry.upsert(&mut engine, LayerRole::Wells, &wells(), wells_style());

        assert_eq!(engine.source_count(), 1);
        assert_eq!(engine.layer_count(), 1);
        assert!(registry.is_live(LayerRole::Wells));
    }

    #[test]
    fn upsert_sanitizes_on_write() {
        let mut engine = HeadlessEngine::new();
        let mut registry = LayerRegistry::new();

        let mut collection = wells();
        collection
            .features
            .push(Feature::new(Geometry::Point([f64::NAN, 10.0])));
        registry.upsert(&mut engine, LayerRole::Wells, &collection, wells_style());

        let stored = engine.source(&LayerRole::Wells.source_id()).unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn remove_is_a_noop_when_absent() {
        let mut engine = HeadlessEngine::new();
        let mut registry = LayerRegistry::new();
        registry.remove(&mut engine, LayerRole::Blocks);
        assert_eq!(engine.layer_count(), 0);
    }
}
