pub mod loader;
pub mod record;
pub mod state;
pub mod ui;
pub mod view;

use std::{future::Future, sync::Arc, sync::mpsc::Sender, time::Duration};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::{
  config::LocatorConfig,
  map::map_event::MapEvent,
  query::{FeatureId, PredicateError, QueryError, QueryTask},
  task_tracker::{TaskCategory, TaskGuard},
};
use loader::FeatureLoader;
use record::FeatureRecord;
use state::LocatorState;
use view::DisplayTree;

/// Tile zoom level the map view goes to when a feature is located.
pub const LOCATE_ZOOM: u8 = 14;
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that redraws when asked to. Finished queries call it from the tokio runtime.
pub trait Repaint: Send + Sync {
  fn request_repaint(&self);
}

impl Repaint for egui::Context {
  fn request_repaint(&self) {
    egui::Context::request_repaint(self);
  }
}

/// User interactions with a locator.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
  /// Expand or collapse the list. Loads the list on first use.
  Toggle,
  /// Go to the feature with this id.
  Locate(FeatureId),
  /// Load the list again after it failed.
  Retry,
}

/// What applying a finished query did.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
  ListLoaded(usize),
  ListFailed(String),
  Located { id: FeatureId, zoom: u8 },
  NotFound(FeatureId),
  MissingGeometry(FeatureId),
  LocateFailed { id: FeatureId, message: String },
  /// The result arrived in a state that no longer expects it.
  Ignored,
}

enum Message {
  List(Result<Vec<FeatureRecord>, QueryError>),
  Locate(FeatureId, Result<Option<FeatureRecord>, QueryError>),
}

/// Lists the features of one layer and moves the map to the one clicked.
///
/// All state changes happen on the thread owning the locator: queries run as tokio tasks and
/// their results are applied by [`LayerFeatureLocator::poll`], which the UI calls every frame.
/// A finished query requests a repaint so that frame happens.
pub struct LayerFeatureLocator {
  config: LocatorConfig,
  state: LocatorState,
  loader: Arc<FeatureLoader>,
  map: Sender<MapEvent>,
  repaint: Arc<dyn Repaint>,
  sender: UnboundedSender<Message>,
  receiver: UnboundedReceiver<Message>,
  timeout: Duration,
}

impl LayerFeatureLocator {
  /// Fails if the configured field names cannot be used in a query.
  pub fn new(
    config: LocatorConfig,
    task: Arc<dyn QueryTask>,
    map: Sender<MapEvent>,
    repaint: impl Repaint + 'static,
  ) -> Result<Self, PredicateError> {
    let loader = FeatureLoader::new(task, &config)?;
    let (sender, receiver) = unbounded_channel();
    Ok(Self {
      config,
      state: LocatorState::new(),
      loader: Arc::new(loader),
      map,
      repaint: Arc::new(repaint),
      sender,
      receiver,
      timeout: DEFAULT_QUERY_TIMEOUT,
    })
  }

  #[must_use]
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  #[must_use]
  pub fn config(&self) -> &LocatorConfig {
    &self.config
  }

  #[must_use]
  pub fn state(&self) -> &LocatorState {
    &self.state
  }

  #[must_use]
  pub fn display(&self) -> DisplayTree {
    view::project(&self.state, &self.config)
  }

  /// Applies a user action. Must be called within a tokio runtime since it may spawn queries.
  pub fn dispatch(&mut self, action: Action) {
    match action {
      Action::Toggle => {
        if self.state.toggle_expansion() {
          self.spawn_list_fetch();
        }
        log::debug!(
          "'{}' {}",
          self.config.label,
          if self.state.expanded() {
            "expanded"
          } else {
            "collapsed"
          }
        );
        self.repaint.request_repaint();
      }
      Action::Retry => {
        if self.state.retry_list() {
          self.spawn_list_fetch();
          self.repaint.request_repaint();
        }
      }
      Action::Locate(id) => self.spawn_locate(id),
    }
  }

  /// Applies all finished queries without waiting.
  pub fn poll(&mut self) -> Vec<Completion> {
    let mut completions = Vec::new();
    while let Ok(message) = self.receiver.try_recv() {
      completions.push(self.apply(message));
    }
    completions
  }

  /// Waits for the next query to finish and applies it. Only returns once a query was dispatched
  /// and finished.
  pub async fn process_next(&mut self) -> Completion {
    match self.receiver.recv().await {
      Some(message) => self.apply(message),
      // The locator holds a sender itself, so the channel never closes.
      None => Completion::Ignored,
    }
  }

  /// Draws the locator and handles what the user clicked.
  pub fn ui(&mut self, ui: &mut egui::Ui) {
    self.poll();
    let id_salt = (&self.config.query_url, &self.config.label);
    if let Some(action) = ui::show(ui, id_salt, &self.display()) {
      self.dispatch(action);
    }
  }

  fn spawn_list_fetch(&self) {
    log::debug!(
      "Requesting feature list of '{}' from {}",
      self.config.label,
      self.loader.url()
    );
    let loader = Arc::clone(&self.loader);
    let sender = self.sender.clone();
    let repaint = Arc::clone(&self.repaint);
    let timeout = self.timeout;
    let name = format!("List {}", self.config.label);
    tokio::spawn(async move {
      let _guard = TaskGuard::new(name, TaskCategory::ListFetch);
      let result = with_timeout(timeout, loader.load_feature_list()).await;
      if sender.send(Message::List(result)).is_ok() {
        repaint.request_repaint();
      }
    });
  }

  fn spawn_locate(&self, id: FeatureId) {
    log::debug!("Locating {} = {id} on {}", self.config.id_field, self.loader.url());
    let loader = Arc::clone(&self.loader);
    let sender = self.sender.clone();
    let repaint = Arc::clone(&self.repaint);
    let timeout = self.timeout;
    let name = format!("Locate {id}");
    tokio::spawn(async move {
      let _guard = TaskGuard::new(name, TaskCategory::Locate);
      let result = with_timeout(timeout, loader.locate_feature(&id)).await;
      if sender.send(Message::Locate(id, result)).is_ok() {
        repaint.request_repaint();
      }
    });
  }

  /// Runs within the frame the finished query asked for, so it does not repaint itself.
  fn apply(&mut self, message: Message) -> Completion {
    match message {
      Message::List(Ok(records)) => {
        let count = records.len();
        if !self.state.record_list_loaded(records) {
          return Completion::Ignored;
        }
        log::info!("Loaded {count} features for '{}'", self.config.label);
        Completion::ListLoaded(count)
      }
      Message::List(Err(e)) => {
        log::error!("Failed to load features of '{}': {e}", self.config.label);
        let message = e.to_string();
        if !self.state.record_list_failed(message.clone()) {
          return Completion::Ignored;
        }
        Completion::ListFailed(message)
      }
      Message::Locate(id, Ok(None)) => {
        log::warn!(
          "No features returned from query for {} = {id}",
          self.config.id_field
        );
        Completion::NotFound(id)
      }
      Message::Locate(id, Ok(Some(FeatureRecord { geometry: None, .. }))) => {
        log::warn!("Feature {} = {id} has no geometry", self.config.id_field);
        Completion::MissingGeometry(id)
      }
      Message::Locate(id, Ok(Some(FeatureRecord {
        geometry: Some(target),
        ..
      }))) => {
        if let Err(e) = self.map.send(MapEvent::GoTo {
          target,
          zoom: LOCATE_ZOOM,
        }) {
          log::error!("Failed to send GoTo event: {e}");
          return Completion::LocateFailed {
            id,
            message: "map view is gone".to_string(),
          };
        }
        log::info!(
          "Going to {} = {id} at zoom {LOCATE_ZOOM}",
          self.config.id_field
        );
        Completion::Located {
          id,
          zoom: LOCATE_ZOOM,
        }
      }
      Message::Locate(id, Err(e)) => {
        log::error!("Failed to locate {} = {id}: {e}", self.config.id_field);
        Completion::LocateFailed {
          id,
          message: e.to_string(),
        }
      }
    }
  }
}

async fn with_timeout<T>(
  timeout: Duration,
  query: impl Future<Output = Result<T, QueryError>>,
) -> Result<T, QueryError> {
  tokio::time::timeout(timeout, query)
    .await
    .unwrap_or(Err(QueryError::Timeout(timeout)))
}
