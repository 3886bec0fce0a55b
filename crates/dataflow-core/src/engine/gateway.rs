//! Persistence gateway: write-coalescing front of the durable store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::domain::{Checkpoint, Task, TaskId};
use crate::engine::store::TaskStore;
use crate::ports::{DurableStore, PersistenceError};

/// Outcome of one flush tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Dirty tasks written in the batched `save_tasks` call.
    pub tasks: usize,

    /// Checkpoints drained to the durable store.
    pub checkpoints: usize,
}

/// Coalesces task writes so N rapid updates inside one flush interval
/// produce exactly one durable write.
///
/// Design:
/// - Mutations only mark a task id dirty (and queue new checkpoints);
///   no I/O happens on the mutation path.
/// - `flush` drains both pending sets, resolves the dirty ids against the
///   current store snapshot (last-write-wins per flush cycle), and does
///   one batched `save_tasks`. On failure everything is put back so the
///   next tick retries; in-memory state stays authoritative either way.
/// - The pending sets are the only state mutated outside the store's
///   copy-on-write discipline, and only `flush` ever drains them.
pub struct PersistenceGateway {
    durable: Arc<dyn DurableStore>,
    dirty: Mutex<HashSet<TaskId>>,
    pending_checkpoints: Mutex<Vec<Checkpoint>>,
}

impl PersistenceGateway {
    pub fn new(durable: Arc<dyn DurableStore>) -> Self {
        Self {
            durable,
            dirty: Mutex::new(HashSet::new()),
            pending_checkpoints: Mutex::new(Vec::new()),
        }
    }

    pub async fn init(&self) -> Result<(), PersistenceError> {
        self.durable.init().await
    }

    pub async fn load_all_tasks(&self) -> Result<Vec<Task>, PersistenceError> {
        self.durable.load_all_tasks().await
    }

    /// Schedule a durable write for this task on the next flush tick.
    pub fn mark_dirty(&self, task_id: TaskId) {
        self.dirty.lock().unwrap().insert(task_id);
    }

    /// Queue a checkpoint for its own durable record on the next flush.
    pub fn queue_checkpoint(&self, checkpoint: Checkpoint) {
        self.pending_checkpoints.lock().unwrap().push(checkpoint);
    }

    /// Drop pending work for a task that no longer exists.
    pub fn forget(&self, task_id: TaskId) {
        self.dirty.lock().unwrap().remove(&task_id);
        self.pending_checkpoints
            .lock()
            .unwrap()
            .retain(|cp| cp.task_id != task_id);
    }

    pub fn pending_count(&self) -> usize {
        self.dirty.lock().unwrap().len()
    }

    /// One flush tick: batch-write all dirty tasks, then drain checkpoints.
    ///
    /// On error the drained work is restored for the next tick. Dirty ids
    /// whose task has been deleted in the meantime are silently dropped.
    pub async fn flush(&self, store: &TaskStore) -> Result<FlushStats, PersistenceError> {
        let drained_ids: Vec<TaskId> = {
            let mut dirty = self.dirty.lock().unwrap();
            dirty.drain().collect()
        };
        let drained_checkpoints: Vec<Checkpoint> = {
            let mut pending = self.pending_checkpoints.lock().unwrap();
            std::mem::take(&mut *pending)
        };

        if drained_ids.is_empty() && drained_checkpoints.is_empty() {
            return Ok(FlushStats::default());
        }

        let snapshot = store.snapshot();
        let tasks: Vec<Task> = drained_ids
            .iter()
            .filter_map(|id| snapshot.get(id).map(|t| (**t).clone()))
            .collect();

        if !tasks.is_empty()
            && let Err(e) = self.durable.save_tasks(&tasks).await
        {
            self.restore(&drained_ids, drained_checkpoints);
            return Err(e);
        }

        let mut written = 0;
        for (i, checkpoint) in drained_checkpoints.iter().enumerate() {
            if let Err(e) = self.durable.save_checkpoint(checkpoint).await {
                // The task batch already went through; only requeue the
                // checkpoints that have not been written yet.
                self.restore(&[], drained_checkpoints[i..].to_vec());
                return Err(e);
            }
            written += 1;
        }

        Ok(FlushStats {
            tasks: tasks.len(),
            checkpoints: written,
        })
    }

    fn restore(&self, ids: &[TaskId], checkpoints: Vec<Checkpoint>) {
        if !ids.is_empty() {
            let mut dirty = self.dirty.lock().unwrap();
            dirty.extend(ids.iter().copied());
        }
        if !checkpoints.is_empty() {
            let mut pending = self.pending_checkpoints.lock().unwrap();
            // Put them back at the front to keep per-task write order.
            let mut restored = checkpoints;
            restored.extend(pending.drain(..));
            *pending = restored;
        }
    }

    pub async fn delete_task(&self, task_id: TaskId) -> Result<(), PersistenceError> {
        self.forget(task_id);
        self.durable.delete_task(task_id).await
    }

    pub async fn cleanup(&self, before: DateTime<Utc>) -> Result<usize, PersistenceError> {
        self.durable.cleanup(before).await
    }
}
