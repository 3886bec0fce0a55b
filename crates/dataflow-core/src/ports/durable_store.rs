//! DurableStore port - 永続化ストアの抽象化
//!
//! DurableStore はタスクとチェックポイントの永続化先（埋め込み KV、
//! ファイル、リモートストアなど）へのインターフェースです。
//!
//! # 設計原則
//! - エンジン内で I/O を行うのは PersistenceGateway 経由のここだけ
//! - メモリ上の TaskStore が正本。DurableStore はクラッシュ復旧用の写し
//! - 書き込み失敗は致命的ではない（次の flush tick でリトライ）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{Checkpoint, Task, TaskId};

/// DurableStore の操作エラー
///
/// エンジンレベルでは非致命的: ログして次の flush/sweep サイクルで
/// リトライされ、公開 API を横断して伝播することはない。
#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    #[error("store not initialized")]
    NotInitialized,

    #[error("store operation failed: {0}")]
    OperationFailed(String),
}

/// DurableStore はタスク・チェックポイントの永続化先
///
/// # 呼び出し契約
/// - `init` は他のどの操作よりも先に一度だけ呼ばれる
/// - `load_all_tasks` は起動時の hydration 用（新規タスク作成より前）
/// - `save_tasks` はバッチ書き込み（flush tick ごとに dirty 分を一括）
/// - `cleanup` は `before` より古い終端タスクの掃除、削除件数を返す
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn init(&self) -> Result<(), PersistenceError>;

    async fn load_all_tasks(&self) -> Result<Vec<Task>, PersistenceError>;

    async fn save_tasks(&self, tasks: &[Task]) -> Result<(), PersistenceError>;

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), PersistenceError>;

    async fn delete_task(&self, task_id: TaskId) -> Result<(), PersistenceError>;

    async fn cleanup(&self, before: DateTime<Utc>) -> Result<usize, PersistenceError>;
}
