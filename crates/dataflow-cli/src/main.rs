use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio::time::{Duration, sleep};

use dataflow_core::app::{self, DEFAULT_SWEEP_INTERVAL, EngineBuilder, FlushLoop, SweepLoop};
use dataflow_core::domain::{
    Checkpoint, ProgressUpdate, TaskContext, TaskCreationConfig, TaskKind, TaskState,
};
use dataflow_core::engine::Engine;
use dataflow_core::impls::InMemoryDurableStore;
use dataflow_core::ports::Executor;

#[derive(Debug, Deserialize)]
struct GradeRow {
    student: String,
    score: u32,
}

/// デモ用 Executor：成績行をバッチで取り込み、バッチ境界ごとに
/// 進捗とチェックポイントを報告する。行データはエンジンの外を
/// 通って Executor に渡る（タスクレコードには行数だけが残る）。
struct GradeImportExecutor {
    rows: Vec<serde_json::Value>,
    batch_size: u64,
}

#[async_trait]
impl Executor for GradeImportExecutor {
    async fn execute(
        &self,
        engine: &Engine,
        task: dataflow_core::domain::Task,
        resume_from: Option<Checkpoint>,
    ) -> Result<(), String> {
        // 再開契約：チェックポイントの次のバッチから続行する
        let first_batch = resume_from.map(|cp| cp.batch_index as u64 + 1).unwrap_or(0);
        let total = task.progress.total;
        let batches = total.div_ceil(self.batch_size);

        for batch in first_batch..batches {
            // バッチ境界で状態を確認（協調的キャンセル/一時停止）
            if engine.task_state(task.id) != Some(TaskState::Processing) {
                return Ok(());
            }

            let from = (batch * self.batch_size) as usize;
            let to = ((batch + 1) * self.batch_size).min(total) as usize;
            for row in &self.rows[from..to] {
                let row: GradeRow =
                    serde_json::from_value(row.clone()).map_err(|e| format!("row decode: {e}"))?;
                tracing::debug!(student = %row.student, score = row.score, "imported");
            }

            // I/O のふりをして少し待つ
            sleep(Duration::from_millis(30)).await;

            let processed = to as u64;
            engine
                .update_task_progress(
                    task.id,
                    ProgressUpdate {
                        processed: Some(processed),
                        successful: Some(processed),
                        ..ProgressUpdate::default()
                    },
                )
                .map_err(|e| e.to_string())?;
            engine
                .save_checkpoint(Checkpoint::new(
                    task.id,
                    batch as u32,
                    processed,
                    serde_json::json!({ "imported": processed }),
                    engine.now(),
                ))
                .map_err(|e| e.to_string())?;
        }

        engine
            .request_transition(task.id, TaskState::Completed)
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // (A) エンジンを組み立てて復元する（今回はインメモリ永続化）
    let durable = Arc::new(InMemoryDurableStore::new());
    let engine = Arc::new(EngineBuilder::new(durable).build());
    let restored = engine.init().await.expect("durable store init");
    println!("restored tasks: {restored}");

    // (B) 変更イベントを購読して流れを観察する
    let subscription = engine.subscribe(|event| {
        println!(
            "event: task={} kind={:?} payload={}",
            event.task_id, event.kind, event.payload
        );
    });

    // (C) 書き込みコアレッシングと保持期間掃除のループを起動
    let flusher = FlushLoop::spawn(Arc::clone(&engine), app::DEFAULT_FLUSH_INTERVAL);
    let sweeper = SweepLoop::spawn(Arc::clone(&engine), DEFAULT_SWEEP_INTERVAL);

    // (D) 成績インポートタスクを投入
    let rows: Vec<serde_json::Value> = (0..100)
        .map(|i| serde_json::json!({ "student": format!("s{i:03}"), "score": 60 + i % 41 }))
        .collect();
    let task_id = engine
        .create_task(TaskCreationConfig {
            kind: TaskKind::GradeImport,
            data: rows.clone(),
            context: TaskContext::default(),
            auto_start: true,
        })
        .expect("create task");
    println!("created task: {task_id}");

    // (E) Executor で駆動し、完了を待つ
    let executor = GradeImportExecutor {
        rows,
        batch_size: 20,
    };
    app::run_task(&engine, &executor, task_id)
        .await
        .expect("run task");

    let task = engine.get_task(task_id).expect("task exists");
    println!(
        "final status: state={:?} processed={}/{} checkpoints={}",
        task.state,
        task.progress.processed,
        task.progress.total,
        task.checkpoints.len()
    );
    println!("counts: {:?}", engine.counts_by_state());

    // (F) 終了：最後のフラッシュを済ませてからループを畳む
    subscription.unsubscribe();
    flusher.shutdown_and_join().await;
    sweeper.shutdown_and_join().await;
}
