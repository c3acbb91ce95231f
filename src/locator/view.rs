//! Pure projection of a locator's state into the tree the UI draws.

use super::{
  Action,
  state::{ListLoad, LocatorState},
};
use crate::{config::LocatorConfig, query::FeatureId};

pub const LOADING_TEXT: &str = "Loading features...";
pub const EMPTY_TEXT: &str = "No features found on layer";
pub const RETRY_TEXT: &str = "Retry";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleIcon {
  Closed,
  Opened,
}

impl ToggleIcon {
  #[must_use]
  pub fn glyph(self) -> &'static str {
    match self {
      ToggleIcon::Closed => "▶",
      ToggleIcon::Opened => "▼",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
  pub expanded: bool,
  pub icon: ToggleIcon,
}

/// One feature in the list. `action` is `None` when the feature has no usable id.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
  pub key: Option<FeatureId>,
  pub label: String,
  pub action: Option<Action>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListContent {
  Loading,
  Failed { message: String, retry: Action },
  Empty,
  Rows(Vec<Row>),
}

impl ListContent {
  /// The placeholder shown instead of rows.
  #[must_use]
  pub fn placeholder(&self) -> Option<String> {
    match self {
      ListContent::Loading => Some(LOADING_TEXT.to_string()),
      ListContent::Failed { message, .. } => Some(format!("Failed to load features: {message}")),
      ListContent::Empty => Some(EMPTY_TEXT.to_string()),
      ListContent::Rows(_) => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListRegion {
  /// Hidden while collapsed. Loaded rows are kept either way.
  pub hidden: bool,
  pub content: ListContent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayTree {
  pub toggle: Toggle,
  pub label: String,
  pub list: ListRegion,
}

impl DisplayTree {
  #[must_use]
  pub fn rows(&self) -> &[Row] {
    match &self.list.content {
      ListContent::Rows(rows) => rows,
      _ => &[],
    }
  }

  /// Every text of the tree in display order, including the hidden list region.
  #[must_use]
  pub fn texts(&self) -> Vec<String> {
    let mut texts = vec![self.label.clone()];
    match &self.list.content {
      ListContent::Rows(rows) => texts.extend(rows.iter().map(|row| row.label.clone())),
      content => texts.extend(content.placeholder()),
    }
    texts
  }
}

#[must_use]
pub fn project(state: &LocatorState, config: &LocatorConfig) -> DisplayTree {
  let expanded = state.expanded();
  let content = match state.list() {
    ListLoad::NotRequested | ListLoad::InFlight => ListContent::Loading,
    ListLoad::Failed(message) => ListContent::Failed {
      message: message.clone(),
      retry: Action::Retry,
    },
    ListLoad::Loaded(records) if records.is_empty() => ListContent::Empty,
    ListLoad::Loaded(records) => ListContent::Rows(
      records
        .iter()
        .map(|record| Row {
          key: record.id.clone(),
          label: record
            .label
            .clone()
            .unwrap_or_else(|| format!("<missing {}>", config.label_field)),
          action: record.id.clone().map(Action::Locate),
        })
        .collect(),
    ),
  };

  DisplayTree {
    toggle: Toggle {
      expanded,
      icon: if expanded {
        ToggleIcon::Opened
      } else {
        ToggleIcon::Closed
      },
    },
    label: config.label.clone(),
    list: ListRegion {
      hidden: !expanded,
      content,
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::locator::record::FeatureRecord;

  fn config() -> LocatorConfig {
    LocatorConfig {
      query_url: "memory://hydrants".to_string(),
      label: "Hydrants".to_string(),
      id_field: "OBJECTID".to_string(),
      label_field: "NAME".to_string(),
    }
  }

  fn record(id: Option<i64>, label: Option<&str>) -> FeatureRecord {
    FeatureRecord {
      id: id.map(FeatureId::Integer),
      label: label.map(str::to_string),
      geometry: None,
    }
  }

  fn loaded(records: Vec<FeatureRecord>, expanded: bool) -> LocatorState {
    let mut state = LocatorState::new();
    state.toggle_expansion();
    state.record_list_loaded(records);
    if !expanded {
      state.toggle_expansion();
    }
    state
  }

  #[test]
  fn initial_projection_is_collapsed_and_loading() {
    let tree = project(&LocatorState::new(), &config());

    assert_eq!(tree.label, "Hydrants");
    assert_eq!(
      tree.toggle,
      Toggle {
        expanded: false,
        icon: ToggleIcon::Closed
      }
    );
    assert!(tree.list.hidden);
    assert_eq!(tree.list.content, ListContent::Loading);
    assert_eq!(tree.texts(), vec!["Hydrants", LOADING_TEXT]);
  }

  #[test]
  fn in_flight_is_expanded_and_loading() {
    let mut state = LocatorState::new();
    state.toggle_expansion();

    let tree = project(&state, &config());

    assert_eq!(tree.toggle.icon, ToggleIcon::Opened);
    assert!(!tree.list.hidden);
    assert_eq!(tree.list.content, ListContent::Loading);
  }

  #[test]
  fn empty_layer() {
    let tree = project(&loaded(vec![], true), &config());
    assert_eq!(tree.list.content, ListContent::Empty);
    assert_eq!(tree.list.content.placeholder().as_deref(), Some(EMPTY_TEXT));
  }

  #[test]
  fn rows_keep_order_and_carry_their_action() {
    let tree = project(
      &loaded(
        vec![record(Some(2), Some("B")), record(Some(1), Some("A"))],
        true,
      ),
      &config(),
    );

    let rows = tree.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].label, "B");
    assert_eq!(rows[0].key, Some(FeatureId::Integer(2)));
    assert_eq!(rows[0].action, Some(Action::Locate(FeatureId::Integer(2))));
    assert_eq!(rows[1].label, "A");
  }

  #[test]
  fn collapsing_hides_but_keeps_rows() {
    let tree = project(&loaded(vec![record(Some(1), Some("A"))], false), &config());
    assert!(tree.list.hidden);
    assert_eq!(tree.toggle.icon, ToggleIcon::Closed);
    assert_eq!(tree.rows().len(), 1);
  }

  #[test]
  fn missing_attributes() {
    let tree = project(&loaded(vec![record(None, None)], true), &config());
    assert_eq!(tree.rows()[0].label, "<missing NAME>");
    assert_eq!(tree.rows()[0].action, None);
  }

  #[test]
  fn failed_list_offers_retry() {
    let mut state = LocatorState::new();
    state.toggle_expansion();
    state.record_list_failed("service error 500: down".to_string());

    let tree = project(&state, &config());

    assert_eq!(
      tree.list.content,
      ListContent::Failed {
        message: "service error 500: down".to_string(),
        retry: Action::Retry
      }
    );
    assert_eq!(
      tree.texts(),
      vec!["Hydrants", "Failed to load features: service error 500: down"]
    );
  }
}
