use std::sync::{Mutex, PoisonError};

use super::{Feature, FeatureSet, Query, QueryError, QueryTask};

/// A layer held in memory. Evaluates predicates itself and remembers every query it answered.
pub struct MemoryQueryTask {
  url: String,
  features: Vec<Feature>,
  queries: Mutex<Vec<Query>>,
  failure: Mutex<Option<String>>,
}

impl MemoryQueryTask {
  #[must_use]
  pub fn new(url: impl Into<String>, features: Vec<Feature>) -> Self {
    Self {
      url: url.into(),
      features,
      queries: Mutex::new(Vec::new()),
      failure: Mutex::new(None),
    }
  }

  /// All queries received so far, in order.
  #[must_use]
  pub fn queries(&self) -> Vec<Query> {
    self
      .queries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  #[must_use]
  pub fn query_count(&self) -> usize {
    self
      .queries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .len()
  }

  /// Makes every following query fail with a service error until `recover` is called.
  pub fn fail_with(&self, message: impl Into<String>) {
    *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
  }

  pub fn recover(&self) {
    *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
  }

  fn project(query: &Query, feature: &Feature) -> Feature {
    let attributes = match &query.out_fields {
      Some(fields) => feature
        .attributes
        .iter()
        .filter(|(name, _)| fields.iter().any(|f| f.as_str() == name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect(),
      None => feature.attributes.clone(),
    };
    Feature {
      attributes,
      geometry: if query.return_geometry {
        feature.geometry.clone()
      } else {
        None
      },
    }
  }
}

#[async_trait::async_trait]
impl QueryTask for MemoryQueryTask {
  fn url(&self) -> &str {
    &self.url
  }

  async fn execute(&self, query: &Query) -> Result<FeatureSet, QueryError> {
    self
      .queries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(query.clone());

    if let Some(message) = self
      .failure
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
    {
      return Err(QueryError::Service { code: 500, message });
    }

    let features = self
      .features
      .iter()
      .filter(|feature| query.predicate.matches(&feature.attributes))
      .map(|feature| Self::project(query, feature))
      .collect();
    Ok(FeatureSet { features })
  }
}
