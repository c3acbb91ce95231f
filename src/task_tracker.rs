//! Task tracking for displaying running queries

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Information about a tracked task
#[derive(Clone, Debug)]
pub struct TaskInfo {
  pub name: String,
  pub started_at: Instant,
  pub category: TaskCategory,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TaskCategory {
  ListFetch,
  Locate,
}

impl TaskInfo {
  #[must_use]
  pub fn elapsed(&self) -> std::time::Duration {
    self.started_at.elapsed()
  }
}

#[derive(Default)]
struct Tasks {
  running: HashMap<u64, TaskInfo>,
  next_id: u64,
}

/// Registry of running tasks. The app uses the global one from [`task_tracker`].
#[derive(Default)]
pub struct TaskTracker {
  tasks: Mutex<Tasks>,
}

impl TaskTracker {

  fn lock(&self) -> MutexGuard<'_, Tasks> {
    self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Register a new task and return its ID
  pub fn register(&self, name: String, category: TaskCategory) -> u64 {
    let mut tasks = self.lock();
    let id = tasks.next_id;
    tasks.next_id += 1;
    tasks.running.insert(
      id,
      TaskInfo {
        name,
        started_at: Instant::now(),
        category,
      },
    );
    id
  }

  /// Unregister a task when it completes
  pub fn unregister(&self, id: u64) {
    self.lock().running.remove(&id);
  }

  /// Get a snapshot of all active tasks, oldest first
  #[must_use]
  pub fn snapshot(&self) -> Vec<(u64, TaskInfo)> {
    let mut tasks = self
      .lock()
      .running
      .iter()
      .map(|(id, info)| (*id, info.clone()))
      .collect::<Vec<_>>();
    tasks.sort_by_key(|(id, _)| *id);
    tasks
  }

  /// Get count of tasks by category
  #[must_use]
  pub fn count_by_category(&self, category: &TaskCategory) -> usize {
    self
      .lock()
      .running
      .values()
      .filter(|info| &info.category == category)
      .count()
  }
}

/// Global task tracker instance
static TASK_TRACKER: std::sync::OnceLock<Arc<TaskTracker>> = std::sync::OnceLock::new();

/// Get the global task tracker
#[must_use]
pub fn task_tracker() -> Arc<TaskTracker> {
  TASK_TRACKER
    .get_or_init(|| Arc::new(TaskTracker::default()))
    .clone()
}

/// RAII guard that automatically unregisters a task when dropped
pub struct TaskGuard {
  id: u64,
  tracker: Arc<TaskTracker>,
}

impl TaskGuard {
  #[must_use]
  pub fn new(name: String, category: TaskCategory) -> Self {
    let tracker = task_tracker();
    let id = tracker.register(name, category);
    Self { id, tracker }
  }

  #[must_use]
  pub fn id(&self) -> u64 {
    self.id
  }
}

impl Drop for TaskGuard {
  fn drop(&mut self) {
    self.tracker.unregister(self.id);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn guard_unregisters_on_drop() {
    let tracker = TaskTracker::default();
    let first = tracker.register("list Hydrants".to_string(), TaskCategory::ListFetch);
    let second = tracker.register("locate 2".to_string(), TaskCategory::Locate);

    assert_eq!(tracker.count_by_category(&TaskCategory::ListFetch), 1);
    assert_eq!(
      tracker
        .snapshot()
        .iter()
        .map(|(id, _)| *id)
        .collect::<Vec<_>>(),
      vec![first, second]
    );

    tracker.unregister(first);
    assert_eq!(tracker.count_by_category(&TaskCategory::ListFetch), 0);
    assert_eq!(tracker.snapshot().len(), 1);
  }

  #[test]
  fn global_guard() {
    let running = |id: u64| task_tracker().snapshot().iter().any(|(t, _)| *t == id);
    let guard = TaskGuard::new("locate 7".to_string(), TaskCategory::Locate);
    let id = guard.id();
    assert!(running(id));
    drop(guard);
    assert!(!running(id));
  }
}
