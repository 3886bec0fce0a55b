//! FlushLoop - 永続化フラッシュの定期実行
//!
//! # フロー
//! 1. 固定間隔（デフォルト 1 秒）で `Engine::flush_now` を tick
//! 2. dirty なタスクを 1 回のバッチ書き込みにまとめる
//! 3. 失敗はログのみ（pending は engine 側が復元し、次の tick でリトライ）
//!
//! タスクのミューテーション呼び出し側とは完全に独立したタイマーで動く
//! （fire-and-forget、ミューテーションが flush を待つことはない）。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::engine::Engine;

/// Default flush cadence.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Handle for the background flush loop.
/// - `request_shutdown()` で停止を要求
/// - `shutdown_and_join()` で最後の flush を待って終了
pub struct FlushLoop {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl FlushLoop {
    /// Spawn the flush timer.
    pub fn spawn(engine: Arc<Engine>, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = engine.flush_now().await {
                            tracing::warn!(error = %e, "flush failed; retrying next tick");
                        }
                    }
                }
            }

            // Final flush on the way out so a clean shutdown loses nothing.
            if let Err(e) = engine.flush_now().await {
                tracing::warn!(error = %e, "final flush on shutdown failed");
            }
        });

        Self { shutdown_tx, join }
    }

    /// Request shutdown. Does not wait.
    pub fn request_shutdown(&self) {
        // ignore send error: receiver may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for the final flush.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}
