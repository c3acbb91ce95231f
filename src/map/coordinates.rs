use serde::{Deserialize, Serialize};

/// The standard WGS84 coordinate system.
#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct WGS84Coordinate {
  #[serde(alias = "latitude")]
  pub lat: f32,
  #[serde(alias = "longitude")]
  pub lon: f32,
}

impl WGS84Coordinate {
  #[must_use]
  pub fn new(lat: f32, lon: f32) -> Self {
    Self { lat, lon }
  }

  /// Builds a coordinate from an `x`/`y` pair as used by GeoJSON and Esri JSON, i.e. `lon, lat`.
  #[must_use]
  pub fn from_xy(x: f64, y: f64) -> Self {
    #[allow(clippy::cast_possible_truncation)]
    Self::new(y as f32, x as f32)
  }
}

/// Axis aligned box in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
  max_lat: f32,
  min_lat: f32,
  max_lon: f32,
  min_lon: f32,
}

impl BoundingBox {
  /// A box containing nothing. Adding a coordinate makes it valid.
  fn empty() -> Self {
    Self {
      max_lat: f32::MIN,
      min_lat: f32::MAX,
      max_lon: f32::MIN,
      min_lon: f32::MAX,
    }
  }

  pub fn from_iterator<I: IntoIterator<Item = WGS84Coordinate>>(positions: I) -> Self {
    let mut bb = Self::empty();
    positions
      .into_iter()
      .for_each(|pos| bb.add_coordinate(pos));
    bb
  }

  #[must_use]
  pub fn center(&self) -> WGS84Coordinate {
    WGS84Coordinate {
      lat: f32::midpoint(self.max_lat, self.min_lat),
      lon: f32::midpoint(self.max_lon, self.min_lon),
    }
  }

  #[must_use]
  pub fn is_valid(&self) -> bool {
    self.min_lat <= self.max_lat && self.min_lon <= self.max_lon
  }

  fn add_coordinate(&mut self, coord: WGS84Coordinate) {
    self.min_lat = self.min_lat.min(coord.lat);
    self.min_lon = self.min_lon.min(coord.lon);
    self.max_lat = self.max_lat.max(coord.lat);
    self.max_lon = self.max_lon.max(coord.lon);
  }
}

#[cfg(test)]
mod tests {
  use assert_approx_eq::assert_approx_eq;

  use super::*;

  #[test]
  fn empty_box_is_invalid() {
    assert!(!BoundingBox::from_iterator(Vec::new()).is_valid());
  }

  #[test]
  fn box_center() {
    let bb = BoundingBox::from_iterator([
      WGS84Coordinate::new(52.0, 13.0),
      WGS84Coordinate::new(53.0, 14.0),
      WGS84Coordinate::new(52.5, 13.2),
    ]);
    assert!(bb.is_valid());
    assert_approx_eq!(bb.center().lat, 52.5);
    assert_approx_eq!(bb.center().lon, 13.5);
  }

  #[test]
  fn from_xy_swaps_axis_order() {
    let coord = WGS84Coordinate::from_xy(13.4, 52.5);
    assert_approx_eq!(coord.lat, 52.5);
    assert_approx_eq!(coord.lon, 13.4);
  }
}
