//! Executor port - バッチ処理本体の外部契約
//!
//! エンジンはバッチ処理そのものを実装しません。Executor は外部の
//! コラボレーターで、エンジンはライフサイクルの受け渡しだけを行います。
//!
//! # 契約
//! 1. エンジンが `(task, latest_checkpoint)` を渡す
//! 2. checkpoint がある場合、`batch_index + 1` から再開する
//! 3. 実行中は engine に対して以下をコールバックする:
//!    - `update_task_progress` / `save_checkpoint`
//!    - `add_error` / `add_warning`
//! 4. 最後に `request_transition(COMPLETED | FAILED)` で終了を報告する
//! 5. キャンセルは協調的: Executor は task の state をポーリングし、
//!    CANCELLED / PAUSED を見たら次の安全な境界（バッチ終端）で停止する

use async_trait::async_trait;

use crate::domain::{Checkpoint, Task};
use crate::engine::Engine;

/// Executor はタスクのバッチ処理を実行
///
/// エンジンはスレッドやタスク間の並行度をスケジュールしない。複数
/// タスクを並行に走らせるかどうかは Executor 層の責務。
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run (or resume) the batch work for one task.
    ///
    /// `resume_from` is the latest durable checkpoint, or `None` for a
    /// fresh start. Returning `Err` is for infrastructure failures the
    /// executor could not record itself; domain failures should go through
    /// `engine.add_error` + a FAILED transition instead.
    async fn execute(
        &self,
        engine: &Engine,
        task: Task,
        resume_from: Option<Checkpoint>,
    ) -> Result<(), String>;
}
