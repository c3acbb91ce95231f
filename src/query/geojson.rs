use std::path::Path;

use serde_json::Value;

use super::{Feature, QueryError, parse_parts, parse_position, parse_positions};
use crate::map::geometry::Geometry;

/// Reads a GeoJSON `FeatureCollection` or single `Feature` file into features. Properties become
/// attributes.
pub fn read_features(path: &Path) -> Result<Vec<Feature>, QueryError> {
  let text = std::fs::read_to_string(path)
    .map_err(|e| QueryError::Decode(format!("cannot read {}: {e}", path.display())))?;
  parse_features(&text)
}

pub fn parse_features(text: &str) -> Result<Vec<Feature>, QueryError> {
  let json: Value =
    serde_json::from_str(text).map_err(|e| QueryError::Decode(format!("invalid GeoJSON: {e}")))?;

  match json["type"].as_str() {
    Some("FeatureCollection") => json["features"]
      .as_array()
      .ok_or_else(|| QueryError::Decode("FeatureCollection without features".to_string()))?
      .iter()
      .map(parse_feature)
      .collect(),
    Some("Feature") => Ok(vec![parse_feature(&json)?]),
    other => Err(QueryError::Decode(format!(
      "expected a Feature or FeatureCollection, got {other:?}"
    ))),
  }
}

fn parse_feature(feature: &Value) -> Result<Feature, QueryError> {
  let attributes = feature["properties"]
    .as_object()
    .cloned()
    .unwrap_or_default();
  let geometry = match feature.get("geometry") {
    None | Some(Value::Null) => None,
    Some(geometry) => Some(parse_geometry(geometry)?),
  };
  Ok(Feature {
    attributes,
    geometry,
  })
}

fn parse_geometry(geometry: &Value) -> Result<Geometry, QueryError> {
  let coordinates = &geometry["coordinates"];
  let parsed = match geometry["type"].as_str() {
    Some("Point") => parse_position(coordinates).map(Geometry::Point),
    Some("MultiPoint") => parse_positions(coordinates).map(Geometry::MultiPoint),
    Some("LineString") => parse_positions(coordinates).map(|path| Geometry::LineString(vec![path])),
    Some("MultiLineString") => parse_parts(coordinates).map(Geometry::LineString),
    Some("Polygon") => parse_parts(coordinates).map(Geometry::Polygon),
    Some("MultiPolygon") => coordinates
      .as_array()
      .and_then(|polygons| {
        polygons
          .iter()
          .map(parse_parts)
          .collect::<Option<Vec<_>>>()
      })
      .map(|polygons| Geometry::Polygon(polygons.into_iter().flatten().collect())),
    _ => None,
  };
  parsed.ok_or_else(|| QueryError::Decode(format!("unsupported GeoJSON geometry: {geometry}")))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::map::coordinates::WGS84Coordinate;

  #[test]
  fn feature_collection() {
    let text = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "properties": {"OBJECTID": 1, "NAME": "Hydrant A"},
         "geometry": {"type": "Point", "coordinates": [13.4, 52.5]}},
        {"type": "Feature", "properties": {"OBJECTID": 2, "NAME": "Main Street"},
         "geometry": {"type": "LineString", "coordinates": [[13.4, 52.5], [13.5, 52.6]]}},
        {"type": "Feature", "properties": null, "geometry": null}
      ]
    }"#;

    let features = parse_features(text).expect("valid GeoJSON");

    assert_eq!(features.len(), 3);
    assert_eq!(features[0].attribute("NAME"), Some(&json!("Hydrant A")));
    assert_eq!(
      features[0].geometry,
      Some(Geometry::Point(WGS84Coordinate::new(52.5, 13.4)))
    );
    assert_eq!(
      features[1].geometry.as_ref().map(Geometry::type_name),
      Some("LineString")
    );
    assert!(features[2].attributes.is_empty());
    assert_eq!(features[2].geometry, None);
  }

  #[test]
  fn multi_polygon_is_flattened_into_rings() {
    let text = r#"{"type": "Feature", "properties": {},
      "geometry": {"type": "MultiPolygon", "coordinates": [
        [[[0, 0], [1, 0], [1, 1], [0, 0]]],
        [[[5, 5], [6, 5], [6, 6], [5, 5]]]
      ]}}"#;

    let features = parse_features(text).expect("valid GeoJSON");

    match &features[0].geometry {
      Some(Geometry::Polygon(rings)) => assert_eq!(rings.len(), 2),
      other => panic!("expected polygon, got {other:?}"),
    }
  }

  #[test]
  fn rejects_unknown_documents() {
    assert!(parse_features(r#"{"type": "Point", "coordinates": [1, 2]}"#).is_err());
    assert!(parse_features("not json").is_err());
    assert!(
      parse_features(r#"{"type": "Feature", "geometry": {"type": "Circle", "coordinates": [1, 2]}}"#)
        .is_err()
    );
  }
}
