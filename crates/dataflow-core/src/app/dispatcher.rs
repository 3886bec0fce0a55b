//! Dispatcher - エンジンと Executor をつなぐ接着剤
//!
//! エンジン自身はバッチ処理をスケジュールしない。この関数群が
//! ライフサイクルのランプ（QUEUED → PREPARING → VALIDATING →
//! PROCESSING）を実行し、`(task, latest_checkpoint)` を Executor に
//! 渡す。複数タスクを並行に走らせたい場合は、呼び出し側が
//! `run_task` を tokio::spawn すればよい。

use crate::domain::{DetailedError, EngineError, Task, TaskState};
use crate::engine::Engine;
use crate::ports::Executor;

/// Drive one Queued task through the preparation ramp and hand it to the
/// executor. Fresh start: the latest checkpoint (if the task was hydrated
/// from a previous run) still travels along, honoring the resumption
/// contract.
pub async fn run_task(
    engine: &Engine,
    executor: &dyn Executor,
    task_id: crate::domain::TaskId,
) -> Result<(), EngineError> {
    engine.request_transition(task_id, TaskState::Preparing)?;
    engine.request_transition(task_id, TaskState::Validating)?;
    let task = engine.request_transition(task_id, TaskState::Processing)?;
    dispatch(engine, executor, task).await
}

/// Resume a Paused task: PAUSED → RESUMING → PROCESSING, then hand the
/// executor the latest checkpoint to continue from `batch_index + 1`.
pub async fn resume_task(
    engine: &Engine,
    executor: &dyn Executor,
    task_id: crate::domain::TaskId,
) -> Result<(), EngineError> {
    engine.resume_task(task_id)?;
    let task = engine.request_transition(task_id, TaskState::Processing)?;
    dispatch(engine, executor, task).await
}

async fn dispatch(engine: &Engine, executor: &dyn Executor, task: Task) -> Result<(), EngineError> {
    let task_id = task.id;
    let checkpoint = task.latest_checkpoint().cloned();

    if let Err(message) = executor.execute(engine, task, checkpoint).await {
        // Infrastructure failure the executor could not record itself.
        // Domain failures are expected to arrive via add_error + FAILED.
        let _ = engine.add_error(
            task_id,
            DetailedError {
                code: "executor".to_string(),
                message,
                batch_index: None,
                timestamp: engine.now(),
            },
        );

        // The executor may already have cancelled/paused the task; only
        // force FAILED while it is still Processing.
        if engine.task_state(task_id) == Some(TaskState::Processing) {
            engine.request_transition(task_id, TaskState::Failed)?;
        }
    }

    Ok(())
}
