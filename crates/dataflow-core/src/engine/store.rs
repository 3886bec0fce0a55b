//! In-memory task store (copy-on-write map).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::{EngineError, Task, TaskId};

/// Authoritative in-memory map of task-id -> task.
///
/// Design:
/// - This is the single source of truth; the durable store is a crash-
///   recovery copy that may lag by one flush interval.
/// - All mutation is copy-on-write: the whole map is cloned (cheap —
///   values are `Arc<Task>`), adjusted, and swapped in one motion.
///   Readers hold an immutable snapshot and never observe a partially
///   updated task.
/// - A failed update closure leaves the map untouched.
pub struct TaskStore {
    tasks: RwLock<Arc<HashMap<TaskId, Arc<Task>>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Immutable snapshot of the whole map.
    pub fn snapshot(&self) -> Arc<HashMap<TaskId, Arc<Task>>> {
        Arc::clone(&self.tasks.read().unwrap())
    }

    pub fn get(&self, task_id: TaskId) -> Option<Arc<Task>> {
        self.tasks.read().unwrap().get(&task_id).cloned()
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.tasks.read().unwrap().contains_key(&task_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().unwrap().is_empty()
    }

    /// Insert a freshly-created task.
    pub fn insert(&self, task: Task) {
        let mut guard = self.tasks.write().unwrap();
        let mut next = (**guard).clone();
        next.insert(task.id, Arc::new(task));
        *guard = Arc::new(next);
    }

    /// Read-modify-write one task under the write lock.
    ///
    /// `f` receives the current value and returns the replacement. On
    /// `Err` nothing is swapped; the caller sees the map byte-for-byte
    /// unchanged.
    pub fn update<R>(
        &self,
        task_id: TaskId,
        f: impl FnOnce(&Task) -> Result<(Task, R), EngineError>,
    ) -> Result<R, EngineError> {
        let mut guard = self.tasks.write().unwrap();
        let current = guard
            .get(&task_id)
            .ok_or(EngineError::TaskNotFound(task_id))?;

        let (updated, out) = f(current)?;

        let mut next = (**guard).clone();
        next.insert(task_id, Arc::new(updated));
        *guard = Arc::new(next);
        Ok(out)
    }

    /// Remove one task. Returns the removed record, if it existed.
    pub fn remove(&self, task_id: TaskId) -> Option<Arc<Task>> {
        let mut guard = self.tasks.write().unwrap();
        if !guard.contains_key(&task_id) {
            return None;
        }
        let mut next = (**guard).clone();
        let removed = next.remove(&task_id);
        *guard = Arc::new(next);
        removed
    }

    /// Remove every task matched by the predicate (retention sweep).
    pub fn remove_where(&self, pred: impl Fn(&Task) -> bool) -> Vec<Arc<Task>> {
        let mut guard = self.tasks.write().unwrap();
        let doomed: Vec<TaskId> = guard
            .values()
            .filter(|t| pred(t))
            .map(|t| t.id)
            .collect();
        if doomed.is_empty() {
            return Vec::new();
        }

        let mut next = (**guard).clone();
        let removed = doomed.iter().filter_map(|id| next.remove(id)).collect();
        *guard = Arc::new(next);
        removed
    }

    /// Bulk-load persisted tasks at startup.
    pub fn hydrate(&self, tasks: Vec<Task>) {
        let mut guard = self.tasks.write().unwrap();
        let mut next = (**guard).clone();
        for task in tasks {
            next.insert(task.id, Arc::new(task));
        }
        *guard = Arc::new(next);
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskContext, TaskKind, TaskState};
    use chrono::{TimeZone, Utc};
    use ulid::Ulid;

    fn make_task() -> Task {
        Task::new(
            TaskId::from_ulid(Ulid::new()),
            TaskKind::GradeImport,
            10,
            TaskContext::default(),
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn snapshot_is_isolated_from_later_writes() {
        let store = TaskStore::new();
        let task = make_task();
        let id = task.id;
        store.insert(task);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);

        store.remove(id);

        // Old snapshot still sees the task; the store does not.
        assert_eq!(snapshot.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn failed_update_leaves_map_unchanged() {
        let store = TaskStore::new();
        let task = make_task();
        let id = task.id;
        store.insert(task);

        let before = store.get(id).unwrap();
        let result: Result<(), EngineError> = store.update(id, |t| {
            Err(EngineError::TerminalTask {
                task_id: t.id,
                state: TaskState::Completed,
            })
        });
        assert!(result.is_err());

        let after = store.get(id).unwrap();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn update_unknown_task_is_not_found() {
        let store = TaskStore::new();
        let id = TaskId::from_ulid(Ulid::new());
        let err = store.update(id, |t| Ok((t.clone(), ()))).unwrap_err();
        assert_eq!(err, EngineError::TaskNotFound(id));
    }
}
