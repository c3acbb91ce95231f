pub mod app;
pub mod config;
pub mod locator;
pub mod map;
pub mod query;
pub mod task_tracker;

pub use locator::{Action, Completion, LayerFeatureLocator, Repaint};
pub use map::map_event::MapEvent;
