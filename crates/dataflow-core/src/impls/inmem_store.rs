//! InMemoryDurableStore - 開発・テスト用の永続化ストア
//!
//! # 実装詳細
//! - HashMap をそのまま「耐久」領域として使う（プロセス内限定）
//! - `save_tasks` の呼び出し回数カウンタを持ち、write-coalescing の
//!   テスト（N 回の更新 = 1 回の書き込み）を可能にする
//! - `fail_writes` フラグで書き込み障害を注入できる（リトライのテスト用）

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Checkpoint, Task, TaskId};
use crate::ports::{DurableStore, PersistenceError};

/// Process-local durable store for development and tests.
///
/// # 使用例
/// ```ignore
/// let store = Arc::new(InMemoryDurableStore::new());
/// let engine = EngineBuilder::new(store).build();
/// engine.init().await?;
/// ```
pub struct InMemoryDurableStore {
    tasks: Mutex<HashMap<TaskId, Task>>,
    checkpoints: Mutex<Vec<Checkpoint>>,
    initialized: AtomicBool,
    save_tasks_calls: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryDurableStore {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            checkpoints: Mutex::new(Vec::new()),
            initialized: AtomicBool::new(false),
            save_tasks_calls: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Pre-seed tasks before `init` (simulates a previous run's data).
    pub fn seed(&self, tasks: Vec<Task>) {
        let mut guard = self.tasks.lock().unwrap();
        for task in tasks {
            guard.insert(task.id, task);
        }
    }

    /// Toggle write-failure injection.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// How many `save_tasks` batches have been written.
    pub fn save_tasks_calls(&self) -> usize {
        self.save_tasks_calls.load(Ordering::SeqCst)
    }

    pub fn stored_task(&self, task_id: TaskId) -> Option<Task> {
        self.tasks.lock().unwrap().get(&task_id).cloned()
    }

    pub fn stored_task_count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn stored_checkpoint_count(&self) -> usize {
        self.checkpoints.lock().unwrap().len()
    }

    fn check_ready(&self) -> Result<(), PersistenceError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(PersistenceError::NotInitialized);
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::OperationFailed(
                "injected write failure".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for InMemoryDurableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DurableStore for InMemoryDurableStore {
    async fn init(&self) -> Result<(), PersistenceError> {
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn load_all_tasks(&self) -> Result<Vec<Task>, PersistenceError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(PersistenceError::NotInitialized);
        }
        Ok(self.tasks.lock().unwrap().values().cloned().collect())
    }

    async fn save_tasks(&self, tasks: &[Task]) -> Result<(), PersistenceError> {
        self.check_ready()?;
        self.save_tasks_calls.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.tasks.lock().unwrap();
        for task in tasks {
            guard.insert(task.id, task.clone());
        }
        Ok(())
    }

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), PersistenceError> {
        self.check_ready()?;
        self.checkpoints.lock().unwrap().push(checkpoint.clone());
        Ok(())
    }

    async fn delete_task(&self, task_id: TaskId) -> Result<(), PersistenceError> {
        self.check_ready()?;
        self.tasks.lock().unwrap().remove(&task_id);
        self.checkpoints
            .lock()
            .unwrap()
            .retain(|cp| cp.task_id != task_id);
        Ok(())
    }

    async fn cleanup(&self, before: DateTime<Utc>) -> Result<usize, PersistenceError> {
        self.check_ready()?;
        let mut tasks = self.tasks.lock().unwrap();
        let doomed: Vec<TaskId> = tasks
            .values()
            .filter(|t| {
                t.state.is_terminal() && t.completed_at.map(|at| at < before).unwrap_or(false)
            })
            .map(|t| t.id)
            .collect();

        for id in &doomed {
            tasks.remove(id);
        }
        self.checkpoints
            .lock()
            .unwrap()
            .retain(|cp| !doomed.contains(&cp.task_id));

        Ok(doomed.len())
    }
}
