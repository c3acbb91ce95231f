pub mod geojson;
pub mod memory;
pub mod predicate;
pub mod rest;

use std::{path::Path, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::map::{coordinates::WGS84Coordinate, geometry::Geometry};
pub use memory::MemoryQueryTask;
pub use predicate::{FeatureId, FieldName, Predicate, PredicateError};
pub use rest::RestQueryTask;

/// A request against a feature layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
  pub predicate: Predicate,
  /// Attributes to return. `None` returns all of them.
  pub out_fields: Option<Vec<FieldName>>,
  pub return_geometry: bool,
}

impl Query {
  /// Selects every feature of the layer, all attributes and no geometry.
  #[must_use]
  pub fn all() -> Self {
    Self::new(Predicate::All)
  }

  #[must_use]
  pub fn new(predicate: Predicate) -> Self {
    Self {
      predicate,
      out_fields: None,
      return_geometry: false,
    }
  }

  #[must_use]
  pub fn with_out_fields(mut self, fields: Vec<FieldName>) -> Self {
    self.out_fields = Some(fields);
    self
  }

  #[must_use]
  pub fn with_geometry(mut self, return_geometry: bool) -> Self {
    self.return_geometry = return_geometry;
    self
  }
}

/// A single row of a layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
  pub attributes: Map<String, Value>,
  pub geometry: Option<Geometry>,
}

impl Feature {
  #[must_use]
  pub fn attribute(&self, field: &str) -> Option<&Value> {
    self.attributes.get(field)
  }

  #[must_use]
  pub fn with_attribute(mut self, field: &str, value: impl Into<Value>) -> Self {
    self.attributes.insert(field.to_string(), value.into());
    self
  }

  #[must_use]
  pub fn with_geometry(mut self, geometry: Geometry) -> Self {
    self.geometry = Some(geometry);
    self
  }
}

/// The ordered result of a query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureSet {
  pub features: Vec<Feature>,
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
  #[error("request to {url} failed: {message}")]
  Request { url: String, message: String },
  #[error("{url} answered with status {status}")]
  Status { url: String, status: u16 },
  #[error("service error {code}: {message}")]
  Service { code: i64, message: String },
  #[error("invalid response: {0}")]
  Decode(String),
  #[error(transparent)]
  Predicate(#[from] PredicateError),
  #[error("query timed out after {0:?}")]
  Timeout(Duration),
}

/// A feature layer endpoint that can answer queries.
#[async_trait::async_trait]
pub trait QueryTask: Send + Sync {
  /// Where the queries go, used for diagnostics.
  fn url(&self) -> &str;

  async fn execute(&self, query: &Query) -> Result<FeatureSet, QueryError>;
}

/// Opens the endpoint behind `url`. `file://` URLs are read as GeoJSON and queried in memory,
/// everything else is treated as a feature layer REST endpoint.
pub fn open(url: &str) -> Result<Arc<dyn QueryTask>, QueryError> {
  if let Some(path) = url.strip_prefix("file://") {
    let features = geojson::read_features(Path::new(path))?;
    log::info!("Loaded {} features from {path}", features.len());
    return Ok(Arc::new(MemoryQueryTask::new(url, features)));
  }
  Ok(Arc::new(RestQueryTask::new(url)))
}

/// Parses a `[x, y, ...]` position. Additional z/m values are ignored.
pub(crate) fn parse_position(value: &Value) -> Option<WGS84Coordinate> {
  match value.as_array()?.as_slice() {
    [x, y, ..] => Some(WGS84Coordinate::from_xy(x.as_f64()?, y.as_f64()?)),
    _ => None,
  }
}

pub(crate) fn parse_positions(value: &Value) -> Option<Vec<WGS84Coordinate>> {
  value.as_array()?.iter().map(parse_position).collect()
}

pub(crate) fn parse_parts(value: &Value) -> Option<Vec<Vec<WGS84Coordinate>>> {
  value.as_array()?.iter().map(parse_positions).collect()
}
