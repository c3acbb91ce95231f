use std::sync::Arc;

use super::record::FeatureRecord;
use crate::{
  config::LocatorConfig,
  query::{FeatureId, FieldName, Predicate, PredicateError, Query, QueryError, QueryTask},
};

/// Issues the two queries a locator needs against its layer.
pub struct FeatureLoader {
  task: Arc<dyn QueryTask>,
  id_field: FieldName,
  label_field: FieldName,
}

impl FeatureLoader {
  /// Fails if a configured field name could not be used in a where clause.
  pub fn new(task: Arc<dyn QueryTask>, config: &LocatorConfig) -> Result<Self, PredicateError> {
    Ok(Self {
      task,
      id_field: FieldName::new(&config.id_field)?,
      label_field: FieldName::new(&config.label_field)?,
    })
  }

  #[must_use]
  pub fn url(&self) -> &str {
    self.task.url()
  }

  /// All rows, only id and label, no geometry.
  #[must_use]
  pub fn list_query(&self) -> Query {
    Query::all()
      .with_out_fields(vec![self.id_field.clone(), self.label_field.clone()])
      .with_geometry(false)
  }

  /// The row(s) with the given id, all attributes and geometry.
  pub fn locate_query(&self, id: &FeatureId) -> Result<Query, PredicateError> {
    let predicate = Predicate::equals(self.id_field.clone(), id.clone())?;
    Ok(Query::new(predicate).with_geometry(true))
  }

  pub async fn load_feature_list(&self) -> Result<Vec<FeatureRecord>, QueryError> {
    let result = self.task.execute(&self.list_query()).await?;
    log::debug!(
      "{} returned {} features",
      self.task.url(),
      result.features.len()
    );
    Ok(
      result
        .features
        .into_iter()
        .map(|feature| FeatureRecord::from_feature(feature, &self.id_field, &self.label_field))
        .collect(),
    )
  }

  /// The first feature the endpoint returns for `id`, if any. Further matches are ignored.
  pub async fn locate_feature(&self, id: &FeatureId) -> Result<Option<FeatureRecord>, QueryError> {
    let query = self.locate_query(id)?;
    let result = self.task.execute(&query).await?;
    if result.features.len() > 1 {
      log::debug!(
        "{} features share {} = {id}, using the first",
        result.features.len(),
        self.id_field
      );
    }
    Ok(
      result
        .features
        .into_iter()
        .next()
        .map(|feature| FeatureRecord::from_feature(feature, &self.id_field, &self.label_field)),
    )
  }
}
