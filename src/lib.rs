/// task-notify - tell the user a long-running task has finished
///
/// This library fans a single "task finished" notification out to several
/// independent channels (a Feishu chat webhook, a local sound cue), isolates
/// their failures, and summarizes what was delivered.
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatcher;
pub mod notification;
pub mod project;
pub mod report;
pub mod task_manager;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export core types for convenience
pub use crate::core::*;
