use itertools::Either;
use serde::{Deserialize, Serialize};

use super::coordinates::{BoundingBox, WGS84Coordinate};

/// The geometry of a feature as returned by a query endpoint.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum Geometry {
  Point(WGS84Coordinate),
  MultiPoint(Vec<WGS84Coordinate>),
  /// One or more paths.
  LineString(Vec<Vec<WGS84Coordinate>>),
  /// Outer and inner rings.
  Polygon(Vec<Vec<WGS84Coordinate>>),
}

impl Geometry {
  pub fn coordinates(&self) -> impl Iterator<Item = WGS84Coordinate> + '_ {
    match self {
      Geometry::Point(coord) => Either::Left(std::iter::once(*coord)),
      Geometry::MultiPoint(coords) => Either::Right(Either::Left(coords.iter().copied())),
      Geometry::LineString(parts) | Geometry::Polygon(parts) => {
        Either::Right(Either::Right(parts.iter().flatten().copied()))
      }
    }
  }

  #[must_use]
  pub fn bounding_box(&self) -> BoundingBox {
    BoundingBox::from_iterator(self.coordinates())
  }

  /// The point a map view centers on when it goes to this geometry.
  #[must_use]
  pub fn center(&self) -> Option<WGS84Coordinate> {
    match self {
      Geometry::Point(coord) => Some(*coord),
      _ => {
        let bb = self.bounding_box();
        bb.is_valid().then_some(bb.center())
      }
    }
  }

  #[must_use]
  pub fn type_name(&self) -> &'static str {
    match self {
      Geometry::Point(_) => "Point",
      Geometry::MultiPoint(_) => "MultiPoint",
      Geometry::LineString(_) => "LineString",
      Geometry::Polygon(_) => "Polygon",
    }
  }
}

#[cfg(test)]
mod tests {
  use assert_approx_eq::assert_approx_eq;

  use super::*;

  #[test]
  fn point_center_is_the_point() {
    let point = Geometry::Point(WGS84Coordinate::new(52.5, 13.4));
    assert_eq!(point.center(), Some(WGS84Coordinate::new(52.5, 13.4)));
  }

  #[test]
  fn polygon_center_is_box_center() {
    let polygon = Geometry::Polygon(vec![vec![
      WGS84Coordinate::new(0.0, 0.0),
      WGS84Coordinate::new(0.0, 2.0),
      WGS84Coordinate::new(4.0, 2.0),
      WGS84Coordinate::new(4.0, 0.0),
      WGS84Coordinate::new(0.0, 0.0),
    ]]);
    let center = polygon.center().expect("polygon has coordinates");
    assert_approx_eq!(center.lat, 2.0);
    assert_approx_eq!(center.lon, 1.0);
  }

  #[test]
  fn empty_geometry_has_no_center() {
    assert_eq!(Geometry::MultiPoint(vec![]).center(), None);
    assert_eq!(Geometry::LineString(vec![vec![]]).center(), None);
  }

  #[test]
  fn line_center_spans_all_paths() {
    let line = Geometry::LineString(vec![
      vec![WGS84Coordinate::new(1.0, 2.0), WGS84Coordinate::new(3.0, 4.0)],
      vec![WGS84Coordinate::new(5.0, 6.0)],
    ]);
    assert_eq!(line.coordinates().count(), 3);
    let center = line.center().expect("line has coordinates");
    assert_approx_eq!(center.lat, 3.0);
    assert_approx_eq!(center.lon, 4.0);
  }
}
