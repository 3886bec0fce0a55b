//! Engine error taxonomy.
//!
//! # 伝播ポリシー
//! - **EngineError**: 公開 API の呼び出し側に返す（タスク未変更のまま）
//! - **PersistenceError**: flush/sweep のループ内でログ + リトライ。
//!   公開 API を横断して throw しない（メモリ上の状態が正本）
//! - タスクドメインのエラーは `task.errors` に記録されるデータであり、
//!   FAILED に遷移したときに初めてユーザー可視の失敗になる

use thiserror::Error;

use super::ids::TaskId;
use super::state::TaskState;

/// Errors surfaced by the engine's public operations.
///
/// All of these leave the task (and the store) untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("task store not hydrated yet; call Engine::init first")]
    NotHydrated,

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("illegal state transition: {from:?} -> {to:?}")]
    IllegalTransition { from: TaskState, to: TaskState },

    #[error("task {task_id} is terminal ({state:?}) and immutable")]
    TerminalTask { task_id: TaskId, state: TaskState },

    #[error(
        "checkpoint out of order for task {task_id}: batch {batch_index} <= latest {latest}"
    )]
    StaleCheckpoint {
        task_id: TaskId,
        batch_index: u32,
        latest: u32,
    },
}

impl EngineError {
    pub fn illegal_transition(from: TaskState, to: TaskState) -> Self {
        Self::IllegalTransition { from, to }
    }
}
