use std::fmt::Display;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static FIELD_NAME_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("valid field name regex"));

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredicateError {
  #[error("'{0}' is not a valid field name")]
  InvalidFieldName(String),
  #[error("identifier contains a control character: {0:?}")]
  ControlCharacter(String),
  #[error("identifier is not a finite number: {0}")]
  NonFiniteNumber(f64),
}

/// The name of a layer attribute. Only plain identifiers are accepted since the name ends up in
/// the where clause verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldName(String);

impl FieldName {
  pub fn new(name: &str) -> Result<Self, PredicateError> {
    if FIELD_NAME_REGEX.is_match(name) {
      Ok(Self(name.to_string()))
    } else {
      Err(PredicateError::InvalidFieldName(name.to_string()))
    }
  }

  #[must_use]
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl Display for FieldName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// The scalar identifying a feature within its layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
  Integer(i64),
  /// Integers above `i64::MAX`, kept exact instead of rounding through a float.
  Unsigned(u64),
  Float(f64),
  Text(String),
}

impl FeatureId {
  /// Reads an identifier from an attribute value. Null, booleans and compound values are not
  /// identifiers.
  #[must_use]
  pub fn from_value(value: &Value) -> Option<Self> {
    match value {
      Value::Number(n) => n
        .as_i64()
        .map(FeatureId::Integer)
        .or_else(|| n.as_u64().map(FeatureId::Unsigned))
        .or_else(|| n.as_f64().map(FeatureId::Float)),
      Value::String(s) => Some(FeatureId::Text(s.clone())),
      _ => None,
    }
  }

  /// Equality against a stored attribute value.
  #[must_use]
  pub fn matches(&self, value: &Value) -> bool {
    match (self, value) {
      (FeatureId::Integer(id), Value::Number(n)) => {
        n.as_i64() == Some(*id) || n.as_f64().is_some_and(|f| is_same_number(f, *id))
      }
      (FeatureId::Unsigned(id), Value::Number(n)) => n.as_u64() == Some(*id),
      (FeatureId::Float(id), Value::Number(n)) => n.as_f64() == Some(*id),
      (FeatureId::Text(id), Value::String(s)) => id == s,
      _ => false,
    }
  }

  fn validate(&self) -> Result<(), PredicateError> {
    match self {
      FeatureId::Integer(_) | FeatureId::Unsigned(_) => Ok(()),
      FeatureId::Float(f) if f.is_finite() => Ok(()),
      FeatureId::Float(f) => Err(PredicateError::NonFiniteNumber(*f)),
      FeatureId::Text(s) if s.chars().any(char::is_control) => {
        Err(PredicateError::ControlCharacter(s.clone()))
      }
      FeatureId::Text(_) => Ok(()),
    }
  }

  /// The identifier as a where clause literal: numbers bare, text single quoted with embedded
  /// quotes doubled.
  fn to_literal(&self) -> String {
    match self {
      FeatureId::Integer(i) => i.to_string(),
      FeatureId::Unsigned(u) => u.to_string(),
      FeatureId::Float(f) => f.to_string(),
      FeatureId::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
  }
}

#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
fn is_same_number(f: f64, i: i64) -> bool {
  f == i as f64
}

impl Display for FeatureId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      FeatureId::Integer(i) => write!(f, "{i}"),
      FeatureId::Unsigned(u) => write!(f, "{u}"),
      FeatureId::Float(x) => write!(f, "{x}"),
      FeatureId::Text(s) => write!(f, "{s}"),
    }
  }
}

impl From<i64> for FeatureId {
  fn from(value: i64) -> Self {
    FeatureId::Integer(value)
  }
}

impl From<u64> for FeatureId {
  fn from(value: u64) -> Self {
    i64::try_from(value).map_or(FeatureId::Unsigned(value), FeatureId::Integer)
  }
}

impl From<&str> for FeatureId {
  fn from(value: &str) -> Self {
    FeatureId::Text(value.to_string())
  }
}

impl From<String> for FeatureId {
  fn from(value: String) -> Self {
    FeatureId::Text(value)
  }
}

/// Which features a query selects. Values are validated on construction so rendering the where
/// clause cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
  All,
  Equals { field: FieldName, value: FeatureId },
}

impl Predicate {
  pub fn equals(field: FieldName, value: FeatureId) -> Result<Self, PredicateError> {
    value.validate()?;
    Ok(Predicate::Equals { field, value })
  }

  #[must_use]
  pub fn to_where_clause(&self) -> String {
    match self {
      Predicate::All => "1=1".to_string(),
      Predicate::Equals { field, value } => format!("{field} = {}", value.to_literal()),
    }
  }

  #[must_use]
  pub fn matches(&self, attributes: &Map<String, Value>) -> bool {
    match self {
      Predicate::All => true,
      Predicate::Equals { field, value } => attributes
        .get(field.as_str())
        .is_some_and(|attribute| value.matches(attribute)),
    }
  }
}

impl Display for Predicate {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.to_where_clause())
  }
}
