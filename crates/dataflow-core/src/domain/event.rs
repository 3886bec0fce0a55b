//! Task update events, published on every mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::TaskId;

/// What aspect of the task changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    State,
    Progress,
    Checkpoint,
    Error,
}

/// A single task-update notification.
///
/// Ephemeral: events are fanned out to current subscribers and never
/// persisted. Events for one task are published in mutation order; there
/// is no ordering guarantee across tasks.
///
/// The payload stays flexible as JSON (state name, progress snapshot,
/// checkpoint, error record) so subscribers decode only what they need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdateEvent {
    pub task_id: TaskId,
    pub kind: EventKind,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl TaskUpdateEvent {
    pub fn new(
        task_id: TaskId,
        kind: EventKind,
        payload: serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            kind,
            payload,
            timestamp,
        }
    }
}
