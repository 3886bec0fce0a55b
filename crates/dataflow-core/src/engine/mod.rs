//! Engine - タスクライフサイクルの本体
//!
//! エンジンは純粋な state/data マネージャです:
//! - ミューテーション経路に suspension point はない（同期 API）
//! - I/O は PersistenceGateway 経由のみ、flush/sweep の tick で実行
//! - 通知チャネルは EventBus ただ一つ（UI/レンダリングへの依存なし)
//!
//! # 主要コンポーネント
//! - **TaskStore**: copy-on-write のタスクマップ（正本）
//! - **EventBus**: 変更イベントの fan-out
//! - **PersistenceGateway**: dirty set + バッチ書き込み
//!
//! バッチ処理そのもの（Executor）はエンジンの外。`ports::Executor` 参照。

pub mod bus;
pub mod gateway;
pub mod store;

pub use self::bus::EventBus;
pub use self::gateway::{FlushStats, PersistenceGateway};
pub use self::store::TaskStore;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Duration;

use crate::domain::{
    Checkpoint, DetailedError, EngineError, EventKind, ProgressUpdate, Task, TaskCreationConfig,
    TaskId, TaskProgress, TaskState, TaskUpdateEvent,
};
use crate::ports::{Clock, DurableStore, IdGenerator, PersistenceError};

/// Outcome of one retention-sweep tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Terminal tasks removed from the in-memory store.
    pub removed: usize,

    /// Stale records the durable store reported deleting.
    pub durable_cleaned: usize,
}

/// A live event subscription. Call `unsubscribe` to stop delivery; the
/// subscription does not auto-cancel on drop (subscribers usually outlive
/// the handle).
pub struct Subscription {
    id: crate::domain::SubscriptionId,
    bus: Arc<EventBus>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        self.bus.unsubscribe(self.id);
    }
}

/// The task-orchestration engine.
///
/// One logical owner per engine: callers may share it freely (`&self`
/// everywhere), but there is no cross-node coordination. Resumability is
/// from the last durable checkpoint, not exactly-once execution.
pub struct Engine {
    store: TaskStore,
    bus: Arc<EventBus>,
    gateway: PersistenceGateway,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    retention_window: Duration,
    hydrated: AtomicBool,
}

impl Engine {
    pub fn new(
        durable: Arc<dyn DurableStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        retention_window: Duration,
    ) -> Self {
        Self {
            store: TaskStore::new(),
            bus: Arc::new(EventBus::new()),
            gateway: PersistenceGateway::new(durable),
            clock,
            ids,
            retention_window,
            hydrated: AtomicBool::new(false),
        }
    }

    /// Initialize the durable store and hydrate the task map from it.
    ///
    /// Must complete before any task can be created. Returns the number of
    /// tasks loaded.
    pub async fn init(&self) -> Result<usize, PersistenceError> {
        self.gateway.init().await?;
        let tasks = self.gateway.load_all_tasks().await?;
        let count = tasks.len();
        self.store.hydrate(tasks);
        self.hydrated.store(true, Ordering::SeqCst);
        tracing::info!(count, "hydrated tasks from durable store");
        Ok(count)
    }

    // ========================================
    // ライフサイクル操作
    // ========================================

    /// Create a new task in Idle state and schedule its first durable
    /// write. With `auto_start`, immediately requests Idle -> Queued.
    pub fn create_task(&self, config: TaskCreationConfig) -> Result<TaskId, EngineError> {
        if !self.hydrated.load(Ordering::SeqCst) {
            return Err(EngineError::NotHydrated);
        }

        let now = self.clock.now();
        let task_id = self.ids.generate_task_id();
        let task = Task::new(
            task_id,
            config.kind,
            config.data.len() as u64,
            config.context,
            now,
        );

        self.store.insert(task);
        self.gateway.mark_dirty(task_id);
        self.publish(
            task_id,
            EventKind::State,
            serde_json::json!({ "state": TaskState::Idle }),
        );

        if config.auto_start {
            // Cannot fail: a fresh task is Idle and Idle -> Queued is legal.
            self.request_transition(task_id, TaskState::Queued)?;
        }

        Ok(task_id)
    }

    /// Validate and apply one state transition.
    ///
    /// On success the returned task carries the stamped timestamps
    /// (`started_at` on first Processing, `paused_at` on Paused,
    /// `completed_at` on any terminal state) and a `state` event has been
    /// published. On rejection the stored task is unchanged.
    pub fn request_transition(
        &self,
        task_id: TaskId,
        target: TaskState,
    ) -> Result<Task, EngineError> {
        let now = self.clock.now();
        let updated = self.store.update(task_id, |task| {
            if !task.state.can_transition_to(target) {
                return Err(EngineError::illegal_transition(task.state, target));
            }

            let mut next = task.clone();
            next.state = target;
            next.updated_at = now;
            if target == TaskState::Processing && task.started_at.is_none() {
                next.started_at = Some(now);
            }
            if target == TaskState::Paused {
                next.paused_at = Some(now);
            }
            if target.is_terminal() {
                next.completed_at = Some(now);
            }
            Ok((next.clone(), next))
        })?;

        self.gateway.mark_dirty(task_id);
        self.publish(
            task_id,
            EventKind::State,
            serde_json::json!({ "state": target }),
        );

        Ok(updated)
    }

    /// Start a task. Only valid from Idle; anything else means it is
    /// already running or finished.
    pub fn start_task(&self, task_id: TaskId) -> Result<Task, EngineError> {
        self.request_transition(task_id, TaskState::Queued)
    }

    /// Pause a Processing task.
    pub fn pause_task(&self, task_id: TaskId) -> Result<Task, EngineError> {
        self.request_transition(task_id, TaskState::Paused)
    }

    /// Resume a Paused task. The caller is responsible for handing the
    /// task (plus its latest checkpoint) back to an executor; see
    /// `app::dispatcher`.
    pub fn resume_task(&self, task_id: TaskId) -> Result<Task, EngineError> {
        self.request_transition(task_id, TaskState::Resuming)
    }

    /// Cancel any non-terminal task. Cooperative: the executor must poll
    /// the state and stop at its next safe boundary.
    pub fn cancel_task(&self, task_id: TaskId) -> Result<Task, EngineError> {
        self.request_transition(task_id, TaskState::Cancelled)
    }

    /// Remove a task from memory and the durable store, terminal or not.
    ///
    /// Idempotent. A durable-store failure is logged, not surfaced: the
    /// periodic `cleanup` will catch the orphan record.
    pub async fn delete_task(&self, task_id: TaskId) {
        if let Some(task) = self.store.remove(task_id)
            && !task.state.is_terminal()
        {
            tracing::warn!(task = %task_id, state = ?task.state, "deleting a non-terminal task");
        }

        if let Err(e) = self.gateway.delete_task(task_id).await {
            tracing::warn!(task = %task_id, error = %e, "durable delete failed; cleanup will retry");
        }
    }

    // ========================================
    // 進捗・チェックポイント・エラー
    // ========================================

    /// Merge a partial progress update and publish a `progress` event.
    ///
    /// Rejected on terminal tasks (their progress is immutable). Callers
    /// emitting very frequent updates are expected to throttle upstream;
    /// the durable write is coalesced here regardless.
    pub fn update_task_progress(
        &self,
        task_id: TaskId,
        update: ProgressUpdate,
    ) -> Result<TaskProgress, EngineError> {
        let now = self.clock.now();
        let progress = self.store.update(task_id, |task| {
            Self::reject_terminal(task)?;
            let mut next = task.clone();
            next.progress = task.progress.apply(&update, task.started_at, now);
            next.updated_at = now;
            let progress = next.progress.clone();
            Ok((next, progress))
        })?;

        self.gateway.mark_dirty(task_id);
        self.publish(
            task_id,
            EventKind::Progress,
            serde_json::to_value(&progress).unwrap_or_default(),
        );

        Ok(progress)
    }

    /// Append a checkpoint and schedule its durable write.
    ///
    /// `batch_index` must exceed the current maximum; out-of-order saves
    /// are rejected without touching the task.
    pub fn save_checkpoint(&self, checkpoint: Checkpoint) -> Result<(), EngineError> {
        let task_id = checkpoint.task_id;
        let now = self.clock.now();
        let saved = self.store.update(task_id, |task| {
            Self::reject_terminal(task)?;
            if let Some(latest) = task.latest_checkpoint()
                && checkpoint.batch_index <= latest.batch_index
            {
                return Err(EngineError::StaleCheckpoint {
                    task_id,
                    batch_index: checkpoint.batch_index,
                    latest: latest.batch_index,
                });
            }

            let mut next = task.clone();
            next.checkpoints.push(checkpoint.clone());
            next.updated_at = now;
            Ok((next, checkpoint.clone()))
        })?;

        self.gateway.queue_checkpoint(saved.clone());
        self.gateway.mark_dirty(task_id);
        self.publish(
            task_id,
            EventKind::Checkpoint,
            serde_json::to_value(&saved).unwrap_or_default(),
        );

        Ok(())
    }

    /// Latest checkpoint for a task, or None.
    pub fn latest_checkpoint(&self, task_id: TaskId) -> Option<Checkpoint> {
        self.store
            .get(task_id)
            .and_then(|task| task.latest_checkpoint().cloned())
    }

    /// Record a task-level error (advisory; does not change state) and
    /// publish an `error` event.
    pub fn add_error(&self, task_id: TaskId, error: DetailedError) -> Result<(), EngineError> {
        let now = self.clock.now();
        let recorded = self.store.update(task_id, |task| {
            Self::reject_terminal(task)?;
            let mut next = task.clone();
            next.errors.push(error.clone());
            next.updated_at = now;
            Ok((next, error.clone()))
        })?;

        self.gateway.mark_dirty(task_id);
        self.publish(
            task_id,
            EventKind::Error,
            serde_json::to_value(&recorded).unwrap_or_default(),
        );

        Ok(())
    }

    /// Record a warning. Always advisory; no event is published.
    pub fn add_warning(
        &self,
        task_id: TaskId,
        warning: impl Into<String>,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        let warning = warning.into();
        self.store.update(task_id, |task| {
            Self::reject_terminal(task)?;
            let mut next = task.clone();
            next.warnings.push(warning.clone());
            next.updated_at = now;
            Ok((next, ()))
        })?;

        self.gateway.mark_dirty(task_id);
        Ok(())
    }

    // ========================================
    // 参照系
    // ========================================

    pub fn get_task(&self, task_id: TaskId) -> Option<Task> {
        self.store.get(task_id).map(|t| (*t).clone())
    }

    pub fn task_state(&self, task_id: TaskId) -> Option<TaskState> {
        self.store.get(task_id).map(|t| t.state)
    }

    pub fn task_progress(&self, task_id: TaskId) -> Option<TaskProgress> {
        self.store.get(task_id).map(|t| t.progress.clone())
    }

    pub fn task_count(&self) -> usize {
        self.store.len()
    }

    /// Engine time. Executors use this to stamp checkpoints and errors so
    /// test clocks stay in control of every timestamp.
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    pub(crate) fn store(&self) -> &TaskStore {
        &self.store
    }

    // ========================================
    // イベント購読
    // ========================================

    /// Subscribe to task-update events. Keep the returned handle to
    /// unsubscribe later.
    pub fn subscribe(
        &self,
        callback: impl Fn(&TaskUpdateEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.ids.generate_subscription_id();
        self.bus.subscribe(id, callback);
        Subscription {
            id,
            bus: Arc::clone(&self.bus),
        }
    }

    fn publish(&self, task_id: TaskId, kind: EventKind, payload: serde_json::Value) {
        self.bus
            .publish(&TaskUpdateEvent::new(task_id, kind, payload, self.clock.now()));
    }

    // ========================================
    // flush / sweep（スケジューラから駆動される tick）
    // ========================================

    /// One write-coalescing flush tick. Drains the dirty set into a single
    /// batched durable write. Loops call this on a timer; tests call it
    /// directly.
    pub async fn flush_now(&self) -> Result<FlushStats, PersistenceError> {
        self.gateway.flush(&self.store).await
    }

    /// One retention-sweep tick. Reclaims terminal tasks whose
    /// `completed_at` is older than the retention window; non-terminal
    /// tasks are never touched regardless of age.
    pub async fn sweep_now(&self) -> SweepStats {
        let cutoff = self.clock.now() - self.retention_window;

        let removed = self.store.remove_where(|task| {
            task.state.is_terminal()
                && task.completed_at.map(|t| t < cutoff).unwrap_or(false)
        });

        for task in &removed {
            if let Err(e) = self.gateway.delete_task(task.id).await {
                tracing::warn!(task = %task.id, error = %e, "sweep: durable delete failed");
            }
        }

        let durable_cleaned = match self.gateway.cleanup(cutoff).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "sweep: durable cleanup failed; will retry next cycle");
                0
            }
        };

        if !removed.is_empty() || durable_cleaned > 0 {
            tracing::info!(
                removed = removed.len(),
                durable_cleaned,
                "retention sweep reclaimed old tasks"
            );
        }

        SweepStats {
            removed: removed.len(),
            durable_cleaned,
        }
    }

    fn reject_terminal(task: &Task) -> Result<(), EngineError> {
        if task.state.is_terminal() {
            return Err(EngineError::TerminalTask {
                task_id: task.id,
                state: task.state,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::EngineBuilder;
    use crate::domain::{TaskContext, TaskCreationConfig, TaskKind};
    use crate::impls::InMemoryDurableStore;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    /// Engine wired to an in-memory durable store and a manual clock.
    async fn test_engine() -> (Engine, Arc<InMemoryDurableStore>, Arc<FixedClock>) {
        let durable = Arc::new(InMemoryDurableStore::new());
        let clock = Arc::new(FixedClock::new(t0()));
        let engine = EngineBuilder::new(durable.clone())
            .clock(clock.clone())
            .retention_window(Duration::days(7))
            .build();
        engine.init().await.unwrap();
        (engine, durable, clock)
    }

    fn config(rows: usize, auto_start: bool) -> TaskCreationConfig {
        TaskCreationConfig {
            kind: TaskKind::GradeImport,
            data: vec![serde_json::json!({"score": 90}); rows],
            context: TaskContext::default(),
            auto_start,
        }
    }

    /// Drive a fresh task to Processing through the legal ramp.
    fn ramp_to_processing(engine: &Engine, task_id: TaskId) {
        engine.request_transition(task_id, TaskState::Preparing).unwrap();
        engine.request_transition(task_id, TaskState::Validating).unwrap();
        engine.request_transition(task_id, TaskState::Processing).unwrap();
    }

    #[tokio::test]
    async fn create_requires_hydration() {
        let durable = Arc::new(InMemoryDurableStore::new());
        let engine = EngineBuilder::new(durable).build();

        let err = engine.create_task(config(10, false)).unwrap_err();
        assert_eq!(err, EngineError::NotHydrated);
    }

    #[tokio::test]
    async fn create_task_initializes_idle_with_row_count() {
        let (engine, _, _) = test_engine().await;

        let id = engine.create_task(config(100, false)).unwrap();
        let task = engine.get_task(id).unwrap();
        assert_eq!(task.state, TaskState::Idle);
        assert_eq!(task.progress.total, 100);
        assert_eq!(task.progress.percentage, 0);
        assert!(task.resumable);
        assert_eq!(task.created_at, t0());
    }

    #[tokio::test]
    async fn auto_start_goes_straight_to_queued() {
        let (engine, _, _) = test_engine().await;

        let id = engine.create_task(config(100, true)).unwrap();
        assert_eq!(engine.task_state(id), Some(TaskState::Queued));
    }

    #[tokio::test]
    async fn start_is_rejected_unless_idle() {
        let (engine, _, _) = test_engine().await;
        let id = engine.create_task(config(10, true)).unwrap();

        // Already Queued: "already running or finished".
        let err = engine.start_task(id).unwrap_err();
        assert_eq!(
            err,
            EngineError::illegal_transition(TaskState::Queued, TaskState::Queued)
        );
    }

    #[tokio::test]
    async fn pause_on_queued_is_rejected_and_task_unchanged() {
        let (engine, _, _) = test_engine().await;
        let id = engine.create_task(config(10, true)).unwrap();

        let before = engine.get_task(id).unwrap();
        let err = engine.pause_task(id).unwrap_err();
        assert_eq!(
            err,
            EngineError::illegal_transition(TaskState::Queued, TaskState::Paused)
        );
        assert_eq!(engine.get_task(id).unwrap(), before);
    }

    #[tokio::test]
    async fn processing_stamps_started_at_once() {
        let (engine, _, clock) = test_engine().await;
        let id = engine.create_task(config(10, true)).unwrap();

        clock.advance(Duration::seconds(5));
        ramp_to_processing(&engine, id);

        let started = t0() + Duration::seconds(5);
        assert_eq!(engine.get_task(id).unwrap().started_at, Some(started));

        // Pause/resume later must not move started_at.
        clock.advance(Duration::seconds(30));
        engine.pause_task(id).unwrap();
        engine.resume_task(id).unwrap();
        engine.request_transition(id, TaskState::Processing).unwrap();

        let task = engine.get_task(id).unwrap();
        assert_eq!(task.started_at, Some(started));
        assert_eq!(task.paused_at, Some(t0() + Duration::seconds(35)));
    }

    #[tokio::test]
    async fn progress_update_hits_forty_percent() {
        let (engine, _, clock) = test_engine().await;
        let id = engine.create_task(config(100, true)).unwrap();
        ramp_to_processing(&engine, id);

        clock.advance(Duration::seconds(10));
        let progress = engine
            .update_task_progress(id, ProgressUpdate::processed(40))
            .unwrap();
        assert_eq!(progress.percentage, 40);
        assert_eq!(progress.processing_rate, Some(4.0));
        assert_eq!(progress.estimated_time_remaining, Some(15));
    }

    #[tokio::test]
    async fn terminal_tasks_are_immutable() {
        let (engine, _, clock) = test_engine().await;
        let id = engine.create_task(config(10, true)).unwrap();
        ramp_to_processing(&engine, id);
        engine.request_transition(id, TaskState::Completed).unwrap();

        let terminal = EngineError::TerminalTask {
            task_id: id,
            state: TaskState::Completed,
        };

        assert_eq!(
            engine
                .update_task_progress(id, ProgressUpdate::processed(5))
                .unwrap_err(),
            terminal
        );
        assert_eq!(
            engine
                .save_checkpoint(Checkpoint::new(id, 0, 0, serde_json::json!({}), clock.now()))
                .unwrap_err(),
            terminal
        );
        assert_eq!(engine.add_warning(id, "late").unwrap_err(), terminal);
        assert_eq!(
            engine.cancel_task(id).unwrap_err(),
            EngineError::illegal_transition(TaskState::Completed, TaskState::Cancelled)
        );
    }

    #[tokio::test]
    async fn checkpoints_must_strictly_increase() {
        let (engine, _, clock) = test_engine().await;
        let id = engine.create_task(config(100, true)).unwrap();
        ramp_to_processing(&engine, id);

        let cp = |batch: u32, cursor: u64| {
            Checkpoint::new(id, batch, cursor, serde_json::json!({}), clock.now())
        };

        engine.save_checkpoint(cp(0, 20)).unwrap();
        engine.save_checkpoint(cp(1, 40)).unwrap();

        let err = engine.save_checkpoint(cp(1, 40)).unwrap_err();
        assert_eq!(
            err,
            EngineError::StaleCheckpoint {
                task_id: id,
                batch_index: 1,
                latest: 1
            }
        );

        // Latest is always the maximum batch_index.
        assert_eq!(engine.latest_checkpoint(id).unwrap().batch_index, 1);
        assert_eq!(engine.get_task(id).unwrap().checkpoints.len(), 2);
    }

    #[tokio::test]
    async fn events_arrive_in_mutation_order() {
        let (engine, _, _) = test_engine().await;

        let seen: Arc<Mutex<Vec<EventKind>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = engine.subscribe(move |event| {
            sink.lock().unwrap().push(event.kind);
        });

        let id = engine.create_task(config(10, true)).unwrap();
        ramp_to_processing(&engine, id);
        engine
            .update_task_progress(id, ProgressUpdate::processed(5))
            .unwrap();

        let kinds = seen.lock().unwrap().clone();
        assert_eq!(
            kinds,
            vec![
                EventKind::State, // Idle
                EventKind::State, // Queued
                EventKind::State, // Preparing
                EventKind::State, // Validating
                EventKind::State, // Processing
                EventKind::Progress,
            ]
        );

        subscription.unsubscribe();
        engine
            .update_task_progress(id, ProgressUpdate::processed(6))
            .unwrap();
        assert_eq!(seen.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn rapid_updates_coalesce_into_one_durable_write() {
        let (engine, durable, _) = test_engine().await;
        let id = engine.create_task(config(100, true)).unwrap();
        ramp_to_processing(&engine, id);
        engine.flush_now().await.unwrap();
        let baseline = durable.save_tasks_calls();

        // N rapid updates inside one flush interval...
        for processed in 1..=20 {
            engine
                .update_task_progress(id, ProgressUpdate::processed(processed))
                .unwrap();
        }

        // ...produce exactly one batched write containing the final state.
        let stats = engine.flush_now().await.unwrap();
        assert_eq!(stats.tasks, 1);
        assert_eq!(durable.save_tasks_calls(), baseline + 1);
        assert_eq!(durable.stored_task(id).unwrap().progress.processed, 20);

        // Nothing dirty: the next tick writes nothing.
        let stats = engine.flush_now().await.unwrap();
        assert_eq!(stats, FlushStats::default());
    }

    #[tokio::test]
    async fn failed_flush_is_retried_next_tick() {
        let (engine, durable, _) = test_engine().await;
        let id = engine.create_task(config(100, true)).unwrap();

        durable.set_fail_writes(true);
        engine.flush_now().await.unwrap_err();

        // In-memory state stayed authoritative and the dirty mark survived.
        assert_eq!(engine.task_state(id), Some(TaskState::Queued));

        durable.set_fail_writes(false);
        let stats = engine.flush_now().await.unwrap();
        assert_eq!(stats.tasks, 1);
        assert_eq!(
            durable.stored_task(id).unwrap().state,
            TaskState::Queued
        );
    }

    #[tokio::test]
    async fn flush_persists_checkpoints() {
        let (engine, durable, clock) = test_engine().await;
        let id = engine.create_task(config(100, true)).unwrap();
        ramp_to_processing(&engine, id);

        engine
            .save_checkpoint(Checkpoint::new(id, 0, 50, serde_json::json!({}), clock.now()))
            .unwrap();
        let stats = engine.flush_now().await.unwrap();
        assert_eq!(stats.checkpoints, 1);
        assert_eq!(durable.stored_checkpoint_count(), 1);
    }

    #[tokio::test]
    async fn sweep_honors_the_retention_window() {
        let (engine, durable, clock) = test_engine().await;

        let done = engine.create_task(config(10, true)).unwrap();
        ramp_to_processing(&engine, done);
        engine.request_transition(done, TaskState::Completed).unwrap();

        let paused = engine.create_task(config(10, true)).unwrap();
        ramp_to_processing(&engine, paused);
        engine.pause_task(paused).unwrap();

        engine.flush_now().await.unwrap();

        // 6 days later: inside the window, nothing happens.
        clock.advance(Duration::days(6));
        let stats = engine.sweep_now().await;
        assert_eq!(stats.removed, 0);
        assert!(engine.get_task(done).is_some());

        // 8 days after completion: the terminal task is reclaimed, the
        // paused one survives regardless of age.
        clock.advance(Duration::days(2));
        let stats = engine.sweep_now().await;
        assert_eq!(stats.removed, 1);
        assert!(engine.get_task(done).is_none());
        assert!(engine.get_task(paused).is_some());
        assert!(durable.stored_task(done).is_none());
        assert!(durable.stored_task(paused).is_some());
    }

    #[tokio::test]
    async fn delete_removes_memory_and_durable_copies() {
        let (engine, durable, _) = test_engine().await;
        let id = engine.create_task(config(10, false)).unwrap();
        engine.flush_now().await.unwrap();
        assert!(durable.stored_task(id).is_some());

        engine.delete_task(id).await;
        assert!(engine.get_task(id).is_none());
        assert!(durable.stored_task(id).is_none());

        // Idempotent.
        engine.delete_task(id).await;
    }

    #[tokio::test]
    async fn init_hydrates_previous_tasks() {
        let durable = Arc::new(InMemoryDurableStore::new());
        let clock = Arc::new(FixedClock::new(t0()));

        // First run: create a paused task and flush it out.
        let survivor = {
            let engine = EngineBuilder::new(durable.clone())
                .clock(clock.clone())
                .build();
            engine.init().await.unwrap();
            let id = engine.create_task(config(100, true)).unwrap();
            ramp_to_processing(&engine, id);
            engine
                .update_task_progress(id, ProgressUpdate::processed(40))
                .unwrap();
            engine.pause_task(id).unwrap();
            engine.flush_now().await.unwrap();
            id
        };

        // Second run (after a "crash"): hydration restores the task.
        let engine = EngineBuilder::new(durable.clone())
            .clock(clock.clone())
            .build();
        let loaded = engine.init().await.unwrap();
        assert_eq!(loaded, 1);

        let task = engine.get_task(survivor).unwrap();
        assert_eq!(task.state, TaskState::Paused);
        assert_eq!(task.progress.processed, 40);
    }

    #[tokio::test]
    async fn status_views_track_states() {
        let (engine, _, _) = test_engine().await;

        let queued = engine.create_task(config(10, true)).unwrap();
        let processing = engine.create_task(config(10, true)).unwrap();
        ramp_to_processing(&engine, processing);
        let done = engine.create_task(config(10, true)).unwrap();
        ramp_to_processing(&engine, done);
        engine.request_transition(done, TaskState::Completed).unwrap();

        let counts = engine.counts_by_state();
        assert_eq!(counts.queued, 1);
        assert_eq!(counts.active, 1);
        assert_eq!(counts.completed, 1);

        assert_eq!(engine.queued_tasks(), vec![queued]);
        assert_eq!(engine.active_tasks(), vec![processing]);
        assert_eq!(engine.completed_tasks(), vec![done]);
    }
}
