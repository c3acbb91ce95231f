use std::sync::mpsc::Sender;

use crate::{
  config::Config,
  locator::{LayerFeatureLocator, Repaint},
  map::{map_event::MapEvent, view::MapView},
  query,
  task_tracker::{TaskCategory, TaskTracker, task_tracker},
};

/// Holds the UI data of the locator app: one map view and the locators steering it.
pub struct LocatorApp {
  map: MapView,
  locators: Vec<LayerFeatureLocator>,
}

impl LocatorApp {
  #[must_use]
  pub fn new(map: MapView, locators: Vec<LayerFeatureLocator>) -> Self {
    Self { map, locators }
  }

  #[must_use]
  pub fn map(&self) -> &MapView {
    &self.map
  }

  #[must_use]
  pub fn locators(&self) -> &[LayerFeatureLocator] {
    &self.locators
  }

  pub fn show(&mut self, ui: &mut egui::Ui) {
    egui::Panel::left("layers")
      .resizable(true)
      .default_size(280.0)
      .show_inside(ui, |ui| {
        ui.heading("Layers");
        ui.separator();
        if self.locators.is_empty() {
          ui.weak("No layers configured");
        }
        egui::ScrollArea::vertical().show(ui, |ui| {
          for (index, locator) in self.locators.iter_mut().enumerate() {
            ui.push_id(index, |ui| locator.ui(ui));
          }
        });

        let lines = running_queries(&task_tracker());
        if !lines.is_empty() {
          ui.separator();
          for line in lines {
            ui.weak(line);
          }
        }
      });

    egui::CentralPanel::default().show_inside(ui, |ui| self.map.ui(ui));
  }
}

impl eframe::App for LocatorApp {
  fn ui(&mut self, ui: &mut egui::Ui, _frame: &mut eframe::Frame) {
    self.show(ui);
  }
}

/// Summary line and one line per running query, oldest first. Empty when nothing runs.
fn running_queries(tracker: &TaskTracker) -> Vec<String> {
  let running = tracker.snapshot();
  if running.is_empty() {
    return Vec::new();
  }
  let mut lines = vec![format!(
    "Running: {} list, {} locate",
    tracker.count_by_category(&TaskCategory::ListFetch),
    tracker.count_by_category(&TaskCategory::Locate)
  )];
  lines.extend(
    running
      .iter()
      .map(|(_, task)| format!("{} ({}s)", task.name, task.elapsed().as_secs())),
  );
  lines
}

/// Creates a locator per configured layer. Layers that cannot be opened are logged and skipped.
pub fn build_locators<R>(
  config: &Config,
  map: &Sender<MapEvent>,
  repaint: &R,
) -> Vec<LayerFeatureLocator>
where
  R: Repaint + Clone + 'static,
{
  config
    .locators
    .iter()
    .filter_map(|layer| {
      let task = query::open(&layer.query_url)
        .map_err(|e| log::error!("Cannot open layer '{}': {e}", layer.label))
        .ok()?;
      LayerFeatureLocator::new(layer.clone(), task, map.clone(), repaint.clone())
        .map_err(|e| log::error!("Invalid layer '{}': {e}", layer.label))
        .ok()
        .map(|locator| locator.with_timeout(config.query_timeout()))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;
  use crate::config::LocatorConfig;

  #[derive(Clone)]
  struct NoRepaint;

  impl Repaint for NoRepaint {
    fn request_repaint(&self) {}
  }

  fn layer(label: &str, url: &str, id_field: &str) -> LocatorConfig {
    LocatorConfig {
      query_url: url.to_string(),
      label: label.to_string(),
      id_field: id_field.to_string(),
      label_field: "NAME".to_string(),
    }
  }

  #[test]
  fn running_queries_are_listed_oldest_first() {
    let tracker = TaskTracker::default();
    assert!(running_queries(&tracker).is_empty());

    tracker.register("List Hydrants".to_string(), TaskCategory::ListFetch);
    let locate = tracker.register("Locate 7".to_string(), TaskCategory::Locate);
    assert_eq!(
      running_queries(&tracker),
      vec!["Running: 1 list, 1 locate", "List Hydrants (0s)", "Locate 7 (0s)"]
    );

    tracker.unregister(locate);
    assert_eq!(
      running_queries(&tracker),
      vec!["Running: 1 list, 0 locate", "List Hydrants (0s)"]
    );
  }

  #[test]
  fn invalid_layers_are_skipped() {
    let data = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/hydrants.geojson");
    let config = Config {
      locators: vec![
        layer("Hydrants", &format!("file://{}", data.display()), "OBJECTID"),
        layer("Broken", "file:///no/such/file.geojson", "OBJECTID"),
        layer("Injected", "https://example.com/layer/0", "ID OR 1=1"),
        layer("Remote", "https://example.com/layer/0", "ID"),
      ],
      ..Config::default()
    };
    let (_view, map) = MapView::new();

    let locators = build_locators(&config, &map, &NoRepaint);

    assert_eq!(
      locators
        .iter()
        .map(|l| l.config().label.as_str())
        .collect::<Vec<_>>(),
      vec!["Hydrants", "Remote"]
    );
  }
}
