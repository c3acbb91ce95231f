use serde_json::Value;

use crate::{
  map::geometry::Geometry,
  query::{Feature, FeatureId, FieldName},
};

/// A feature as the locator sees it. List records carry no geometry, locate results do.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
  /// `None` when the id attribute is missing or not a scalar.
  pub id: Option<FeatureId>,
  /// `None` when the label attribute is missing or null.
  pub label: Option<String>,
  pub geometry: Option<Geometry>,
}

impl FeatureRecord {
  #[must_use]
  pub fn from_feature(feature: Feature, id_field: &FieldName, label_field: &FieldName) -> Self {
    let id = feature
      .attribute(id_field.as_str())
      .and_then(FeatureId::from_value);
    let label = feature.attribute(label_field.as_str()).and_then(label_text);
    Self {
      id,
      label,
      geometry: feature.geometry,
    }
  }
}

fn label_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Null | Value::Array(_) | Value::Object(_) => None,
  }
}
