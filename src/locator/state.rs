use super::record::FeatureRecord;

/// Progress of the one list fetch a locator makes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ListLoad {
  #[default]
  NotRequested,
  InFlight,
  /// Permanent once reached.
  Loaded(Vec<FeatureRecord>),
  Failed(String),
}

/// The mutable UI state of a locator. The projector reads it, only the operations below change
/// it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocatorState {
  expanded: bool,
  list: ListLoad,
}

impl LocatorState {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn expanded(&self) -> bool {
    self.expanded
  }

  #[must_use]
  pub fn list(&self) -> &ListLoad {
    &self.list
  }

  #[must_use]
  pub fn is_loaded(&self) -> bool {
    matches!(self.list, ListLoad::Loaded(_))
  }

  /// The loaded snapshot, empty before the list arrived.
  #[must_use]
  pub fn features(&self) -> &[FeatureRecord] {
    match &self.list {
      ListLoad::Loaded(records) => records,
      _ => &[],
    }
  }

  /// Flips `expanded`. Returns `true` if the list has never been requested; it is then marked in
  /// flight and the caller has to start the fetch.
  pub fn toggle_expansion(&mut self) -> bool {
    let request = self.list == ListLoad::NotRequested;
    if request {
      self.list = ListLoad::InFlight;
    }
    self.expanded = !self.expanded;
    request
  }

  /// Stores the fetched records. Returns `false` and leaves the state alone if no fetch was in
  /// flight.
  pub fn record_list_loaded(&mut self, records: Vec<FeatureRecord>) -> bool {
    if self.list != ListLoad::InFlight {
      log::warn!("Dropping feature list that arrived while {}", self.list_name());
      return false;
    }
    self.list = ListLoad::Loaded(records);
    true
  }

  pub fn record_list_failed(&mut self, message: String) -> bool {
    if self.list != ListLoad::InFlight {
      log::warn!("Dropping list failure that arrived while {}", self.list_name());
      return false;
    }
    self.list = ListLoad::Failed(message);
    true
  }

  /// Puts a failed list back in flight. Returns whether the caller has to start a new fetch.
  pub fn retry_list(&mut self) -> bool {
    if matches!(self.list, ListLoad::Failed(_)) {
      self.list = ListLoad::InFlight;
      true
    } else {
      false
    }
  }

  fn list_name(&self) -> &'static str {
    match self.list {
      ListLoad::NotRequested => "not requested",
      ListLoad::InFlight => "in flight",
      ListLoad::Loaded(_) => "loaded",
      ListLoad::Failed(_) => "failed",
    }
  }
}
