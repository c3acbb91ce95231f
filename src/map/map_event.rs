use serde::{Deserialize, Serialize};

use super::geometry::Geometry;

/// Commands sent to the map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapEvent {
  /// Recenter the view on the geometry at the given tile zoom level.
  GoTo { target: Geometry, zoom: u8 },
}
