//! Tracks background side effects that outlive a dispatch.
use futures::future::join_all;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A shared registry of spawned background tasks.
///
/// Channels that report success on launch (sound playback) keep watching
/// their side effect here. Before the process exits, `shutdown` gives those
/// tasks a bounded amount of time to finish.
#[derive(Clone, Debug, Default)]
pub struct TaskManager {
    handles: Arc<Mutex<Vec<(&'static str, JoinHandle<()>)>>>,
}

impl TaskManager {
    /// Creates a new `TaskManager`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a new task and adds its handle to the manager.
    pub fn spawn<F>(&self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        debug!(task_name = name, "Spawning task");
        let handle = tokio::spawn(future);
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name, handle));
    }

    /// Number of tasks spawned and not yet awaited.
    pub fn pending(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Waits up to `grace` for all managed tasks to complete.
    ///
    /// Returns `true` if every task finished in time. Tasks still running at
    /// the deadline are left detached.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let handles = self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect::<Vec<_>>();
        if handles.is_empty() {
            return true;
        }
        info!(
            "Waiting up to {}ms for {} background task(s)...",
            grace.as_millis(),
            handles.len()
        );

        let task_names: Vec<&'static str> = handles.iter().map(|(name, _)| *name).collect();
        let joined = join_all(handles.into_iter().map(|(_, handle)| handle));

        let results = match tokio::time::timeout(grace, joined).await {
            Ok(results) => results,
            Err(_) => {
                warn!(tasks = ?task_names, "Background tasks still running at exit");
                return false;
            }
        };

        for (task_name, result) in task_names.into_iter().zip(results) {
            match result {
                Ok(()) => debug!(task_name, "Task finished."),
                Err(e) => error!(task_name, error = %e, "Task panicked."),
            }
        }
        true
    }
}
