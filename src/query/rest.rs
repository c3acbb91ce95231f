use itertools::Itertools;
use serde_json::Value;

use super::{Feature, FeatureSet, Query, QueryError, QueryTask, parse_parts, parse_positions};
use crate::map::{coordinates::WGS84Coordinate, geometry::Geometry};

const USER_AGENT: &str = "layer-locator/0.1";

/// Queries an ArcGIS style feature layer (`<layer url>/query`) over HTTP.
pub struct RestQueryTask {
  url: String,
  client: surf::Client,
}

impl RestQueryTask {
  #[must_use]
  pub fn new(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      client: surf::Client::new(),
    }
  }

  /// The full request url. Geometries are requested in WGS84.
  #[must_use]
  pub fn request_url(&self, query: &Query) -> String {
    let out_fields = query
      .out_fields
      .as_ref()
      .map_or_else(|| "*".to_string(), |fields| fields.iter().join(","));
    format!(
      "{}/query?f=json&where={}&outFields={}&returnGeometry={}&outSR=4326",
      self.url.trim_end_matches('/'),
      urlencoding::encode(&query.predicate.to_where_clause()),
      urlencoding::encode(&out_fields),
      query.return_geometry
    )
  }
}

#[async_trait::async_trait]
impl QueryTask for RestQueryTask {
  fn url(&self) -> &str {
    &self.url
  }

  async fn execute(&self, query: &Query) -> Result<FeatureSet, QueryError> {
    let url = self.request_url(query);
    log::debug!("Querying {url}");

    let request_error = |e: surf::Error| QueryError::Request {
      url: self.url.clone(),
      message: e.to_string(),
    };

    let mut response = self
      .client
      .get(&url)
      .header("User-Agent", USER_AGENT)
      .await
      .map_err(request_error)?;

    if !response.status().is_success() {
      return Err(QueryError::Status {
        url: self.url.clone(),
        status: response.status().into(),
      });
    }

    let body = response.body_json::<Value>().await.map_err(request_error)?;
    parse_feature_set(&body)
  }
}

/// Reads an Esri JSON feature set. A top level `error` object is reported as a service error.
pub fn parse_feature_set(body: &Value) -> Result<FeatureSet, QueryError> {
  if let Some(error) = body.get("error").filter(|e| e.is_object()) {
    return Err(QueryError::Service {
      code: error["code"].as_i64().unwrap_or_default(),
      message: error["message"]
        .as_str()
        .unwrap_or("unknown error")
        .to_string(),
    });
  }

  let features = body["features"]
    .as_array()
    .ok_or_else(|| QueryError::Decode("response has no features array".to_string()))?;

  let features = features
    .iter()
    .map(|feature| {
      let attributes = feature["attributes"]
        .as_object()
        .cloned()
        .unwrap_or_default();
      let geometry = match feature.get("geometry") {
        None | Some(Value::Null) => None,
        Some(geometry) => Some(parse_esri_geometry(geometry)?),
      };
      Ok(Feature {
        attributes,
        geometry,
      })
    })
    .collect::<Result<Vec<_>, QueryError>>()?;

  Ok(FeatureSet { features })
}

fn parse_esri_geometry(geometry: &Value) -> Result<Geometry, QueryError> {
  let invalid = || QueryError::Decode(format!("unsupported geometry: {geometry}"));

  if let (Some(x), Some(y)) = (geometry["x"].as_f64(), geometry["y"].as_f64()) {
    return Ok(Geometry::Point(WGS84Coordinate::from_xy(x, y)));
  }
  if let Some(points) = geometry.get("points") {
    return parse_positions(points)
      .map(Geometry::MultiPoint)
      .ok_or_else(invalid);
  }
  if let Some(paths) = geometry.get("paths") {
    return parse_parts(paths)
      .map(Geometry::LineString)
      .ok_or_else(invalid);
  }
  if let Some(rings) = geometry.get("rings") {
    return parse_parts(rings).map(Geometry::Polygon).ok_or_else(invalid);
  }
  Err(invalid())
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::query::{FeatureId, FieldName, Predicate};

  #[test]
  fn list_request_url() {
    let task = RestQueryTask::new("https://example.com/arcgis/rest/services/Hydrants/FeatureServer/0/");
    let query = Query::all().with_out_fields(vec![
      FieldName::new("OBJECTID").expect("valid"),
      FieldName::new("NAME").expect("valid"),
    ]);
    assert_eq!(
      task.request_url(&query),
      "https://example.com/arcgis/rest/services/Hydrants/FeatureServer/0/query?f=json&where=1%3D1&outFields=OBJECTID%2CNAME&returnGeometry=false&outSR=4326"
    );
  }

  #[test]
  fn locate_request_url_is_encoded() {
    let task = RestQueryTask::new("https://example.com/layer/0");
    let predicate = Predicate::equals(
      FieldName::new("NAME").expect("valid"),
      FeatureId::from("Tom's & Co"),
    )
    .expect("valid predicate");
    let url = task.request_url(&Query::new(predicate).with_geometry(true));
    assert_eq!(
      url,
      "https://example.com/layer/0/query?f=json&where=NAME%20%3D%20%27Tom%27%27s%20%26%20Co%27&outFields=%2A&returnGeometry=true&outSR=4326"
    );
  }

  #[test]
  fn parses_features_in_order() {
    let body = json!({
      "features": [
        {"attributes": {"OBJECTID": 1, "NAME": "Hydrant A"}},
        {"attributes": {"OBJECTID": 2, "NAME": "Hydrant B"}, "geometry": {"x": 13.4, "y": 52.5}},
      ]
    });
    let set = parse_feature_set(&body).expect("valid feature set");
    assert_eq!(set.features.len(), 2);
    assert_eq!(set.features[0].attribute("NAME"), Some(&json!("Hydrant A")));
    assert_eq!(set.features[0].geometry, None);
    assert_eq!(
      set.features[1].geometry,
      Some(Geometry::Point(WGS84Coordinate::new(52.5, 13.4)))
    );
  }

  #[test]
  fn parses_esri_geometries() {
    let body = json!({
      "features": [
        {"attributes": {}, "geometry": {"points": [[1.0, 2.0], [3.0, 4.0]]}},
        {"attributes": {}, "geometry": {"paths": [[[1.0, 2.0], [3.0, 4.0]]]}},
        {"attributes": {}, "geometry": {"rings": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}},
      ]
    });
    let set = parse_feature_set(&body).expect("valid feature set");
    let types = set
      .features
      .iter()
      .map(|f| f.geometry.as_ref().map(Geometry::type_name))
      .collect::<Vec<_>>();
    assert_eq!(
      types,
      vec![Some("MultiPoint"), Some("LineString"), Some("Polygon")]
    );
  }

  #[test]
  fn service_error() {
    let body = json!({"error": {"code": 400, "message": "Unable to complete operation."}});
    match parse_feature_set(&body) {
      Err(QueryError::Service { code, message }) => {
        assert_eq!(code, 400);
        assert_eq!(message, "Unable to complete operation.");
      }
      other => panic!("expected service error, got {other:?}"),
    }
  }

  #[test]
  fn malformed_responses() {
    assert!(matches!(
      parse_feature_set(&json!({"count": 3})),
      Err(QueryError::Decode(_))
    ));
    assert!(matches!(
      parse_feature_set(&json!({"features": [{"attributes": {}, "geometry": {"curve": 1}}]})),
      Err(QueryError::Decode(_))
    ));
  }
}
