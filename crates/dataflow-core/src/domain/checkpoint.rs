//! Checkpoint: a durable marker of progress within a task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::TaskId;

/// Durable progress marker, sufficient to resume work without redoing
/// completed batches.
///
/// Ownership: a checkpoint belongs to exactly one task and is stored in
/// `task.checkpoints` (plus its own durable-store record). It is never
/// shared between tasks.
///
/// Resumption contract: an executor handed `(task, checkpoint)` must resume
/// at `batch_index + 1`; everything up to and including `batch_index` is
/// already durable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub task_id: TaskId,

    /// Index of the last fully-processed batch. Strictly increasing within
    /// a task; the engine rejects out-of-order appends.
    pub batch_index: u32,

    /// Absolute row offset of the first unprocessed row.
    pub cursor: u64,

    /// Whatever the executor needs to pick up where it left off
    /// (accumulated stats, partial lookup tables, ...). Kept flexible as
    /// JSON so executors can evolve without breaking the engine.
    #[serde(default)]
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(
        task_id: TaskId,
        batch_index: u32,
        cursor: u64,
        payload: serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            batch_index,
            cursor,
            payload,
            timestamp,
        }
    }
}
