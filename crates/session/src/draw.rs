//! Bridge between the embedded draw tool and domain polygon records.
//!
//! One-directional: the draw tool is the source of truth for in-progress
//! geometry and this core never injects polygons back into it. Each
//! inbound event produces exactly one outbound domain event, and area is
//! always recomputed from the ring at event time — never cached — so the
//! domain copy cannot drift from the tool's internal representation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use geo::{Coord, GeodesicArea, LineString, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use geometry::{Coordinate, is_valid_coordinate};

/// A user-drawn region of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonFilter {
    pub id: String,
    /// Closed outer ring in WGS84 degrees.
    pub ring: Vec<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub area_km2: f64,
}

/// Inbound events from the draw tool.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    Created {
        ring: Vec<Coordinate>,
        name: Option<String>,
        metadata: Option<Value>,
    },
    Updated {
        id: String,
        ring: Vec<Coordinate>,
    },
    Deleted {
        ids: Vec<String>,
    },
}

/// Outbound domain events, delivered synchronously to the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PolygonEvent {
    Created(PolygonFilter),
    Updated(PolygonFilter),
    /// Removed identifiers only; geometry is not resurfaced.
    Deleted(Vec<String>),
}

#[derive(Debug, Default)]
pub struct DrawBridge {
    polygons: BTreeMap<String, PolygonFilter>,
}

impl DrawBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn polygons(&self) -> impl Iterator<Item = &PolygonFilter> {
        self.polygons.values()
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Relay one draw-tool event into at most one domain event.
    pub fn handle(&mut self, event: DrawEvent) -> Option<PolygonEvent> {
        match event {
            DrawEvent::Created {
                ring,
                name,
                metadata,
            } => {
                let area_km2 = ring_area_km2(&ring)?;
                let polygon = PolygonFilter {
                    id: Uuid::new_v4().to_string(),
                    ring,
                    name,
                    metadata,
                    created_at: Utc::now(),
                    area_km2,
                };
                self.polygons.insert(polygon.id.clone(), polygon.clone());
                Some(PolygonEvent::Created(polygon))
            }
            DrawEvent::Updated { id, ring } => {
                let area_km2 = ring_area_km2(&ring)?;
                let Some(polygon) = self.polygons.get_mut(&id) else {
                    warn!(%id, "update for unknown polygon");
                    return None;
                };
                polygon.ring = ring;
                polygon.area_km2 = area_km2;
                Some(PolygonEvent::Updated(polygon.clone()))
            }
            DrawEvent::Deleted { ids } => {
                for id in &ids {
                    self.polygons.remove(id);
                }
                Some(PolygonEvent::Deleted(ids))
            }
        }
    }

    /// Drop every record, returning the removed identifiers.
    pub fn clear(&mut self) -> Vec<String> {
        let ids: Vec<String> = self.polygons.keys().cloned().collect();
        self.polygons.clear();
        ids
    }
}

/// Geodesic ring area in km², `None` for degenerate or non-finite rings.
fn ring_area_km2(ring: &[Coordinate]) -> Option<f64> {
    if ring.len() < 3 || ring.iter().any(|c| !is_valid_coordinate(*c)) {
        warn!(vertices = ring.len(), "rejected degenerate polygon ring");
        return None;
    }
    let coords: Vec<Coord<f64>> = ring.iter().map(|c| Coord { x: c[0], y: c[1] }).collect();
    let polygon = Polygon::new(LineString::new(coords), Vec::new());
    Some(polygon.geodesic_area_unsigned() / 1.0e6)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: [Coordinate; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    #[test]
    fn create_assigns_id_and_positive_area() {
        let mut bridge = DrawBridge::new();
        let event = bridge
            .handle(DrawEvent::Created {
                ring: TRIANGLE.to_vec(),
                name: Some("block A".to_owned()),
                metadata: None,
            })
            .unwrap();

        let PolygonEvent::Created(polygon) = event else {
            panic!("expected create");
        };
        assert!(!polygon.id.is_empty());
        assert!(polygon.area_km2 > 0.0);
        assert_eq!(bridge.len(), 1);
    }

    #[test]
    fn update_recomputes_area_for_same_id() {
        let mut bridge = DrawBridge::new();
        let PolygonEvent::Created(polygon) = bridge
            .handle(DrawEvent::Created {
                ring: TRIANGLE.to_vec(),
                name: None,
                metadata: None,
            })
            .unwrap()
        else {
            panic!("expected create");
        };

        let bigger = vec![[0.0, 0.0], [0.0, 2.0], [2.0, 0.0], [0.0, 0.0]];
        let PolygonEvent::Updated(updated) = bridge
            .handle(DrawEvent::Updated {
                id: polygon.id.clone(),
                ring: bigger,
            })
            .unwrap()
        else {
            panic!("expected update");
        };
        assert_eq!(updated.id, polygon.id);
        assert!(updated.area_km2 > polygon.area_km2);
        assert_eq!(updated.created_at, polygon.created_at);
    }

    #[test]
    fn delete_relays_ids_only() {
        let mut bridge = DrawBridge::new();
        let PolygonEvent::Created(polygon) = bridge
            .handle(DrawEvent::Created {
                ring: TRIANGLE.to_vec(),
                name: None,
                metadata: None,
            })
            .unwrap()
        else {
            panic!("expected create");
        };

        let event = bridge
            .handle(DrawEvent::Deleted {
                ids: vec![polygon.id.clone()],
            })
            .unwrap();
        assert_eq!(event, PolygonEvent::Deleted(vec![polygon.id]));
        assert!(bridge.is_empty());
    }

    #[test]
    fn degenerate_rings_are_rejected_without_an_event() {
        let mut bridge = DrawBridge::new();
        assert!(
            bridge
                .handle(DrawEvent::Created {
                    ring: vec![[0.0, 0.0], [1.0, 1.0]],
                    name: None,
                    metadata: None,
                })
                .is_none()
        );
        assert!(
            bridge
                .handle(DrawEvent::Created {
                    ring: vec![[0.0, 0.0], [f64::NAN, 1.0], [1.0, 0.0]],
                    name: None,
                    metadata: None,
                })
                .is_none()
        );
        assert!(bridge.is_empty());
    }
}
