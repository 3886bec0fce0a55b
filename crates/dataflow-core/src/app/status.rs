//! Status - タスク一覧のステータスビュー

use serde::{Deserialize, Serialize};

use crate::domain::{TaskId, TaskState};
use crate::engine::Engine;

/// Per-state task counts (observability hook).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub idle: usize,
    pub queued: usize,
    pub active: usize,
    pub paused: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl Engine {
    /// Counts by state over a single store snapshot.
    pub fn counts_by_state(&self) -> TaskCounts {
        let mut counts = TaskCounts::default();
        for task in self.store().snapshot().values() {
            match task.state {
                TaskState::Idle => counts.idle += 1,
                TaskState::Queued => counts.queued += 1,
                TaskState::Preparing
                | TaskState::Validating
                | TaskState::Processing
                | TaskState::Resuming => counts.active += 1,
                TaskState::Paused => counts.paused += 1,
                TaskState::Completed => counts.completed += 1,
                TaskState::Failed => counts.failed += 1,
                TaskState::Cancelled => counts.cancelled += 1,
            }
        }
        counts
    }

    /// Ids of tasks waiting for an executor.
    pub fn queued_tasks(&self) -> Vec<TaskId> {
        self.tasks_in(|s| s == TaskState::Queued)
    }

    /// Ids of tasks currently being worked on.
    pub fn active_tasks(&self) -> Vec<TaskId> {
        self.tasks_in(|s| s.is_active())
    }

    /// Ids of terminal tasks (completed, failed, or cancelled).
    pub fn completed_tasks(&self) -> Vec<TaskId> {
        self.tasks_in(|s| s.is_terminal())
    }

    fn tasks_in(&self, pred: impl Fn(TaskState) -> bool) -> Vec<TaskId> {
        let snapshot = self.store().snapshot();
        let mut ids: Vec<TaskId> = snapshot
            .values()
            .filter(|t| pred(t.state))
            .map(|t| t.id)
            .collect();
        // ULID ids sort by creation time.
        ids.sort();
        ids
    }
}
