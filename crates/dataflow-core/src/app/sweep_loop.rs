//! SweepLoop - リテンション掃除の定期実行
//!
//! # フロー
//! 1. 固定間隔（デフォルト 1 時間）で `Engine::sweep_now` を tick
//! 2. 終端状態かつ retention window を超えたタスクをメモリと
//!    DurableStore の両方から回収する
//! 3. 非終端タスクは経過時間に関係なく回収しない

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::engine::Engine;

/// Default sweep cadence.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Handle for the background retention sweeper.
pub struct SweepLoop {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SweepLoop {
    /// Spawn the sweep timer.
    pub fn spawn(engine: Arc<Engine>, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            // interval fires immediately; skip that first tick so a fresh
            // start does not sweep before anything can have aged out.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        engine.sweep_now().await;
                    }
                }
            }
        });

        Self { shutdown_tx, join }
    }

    /// Request shutdown. Does not wait.
    pub fn request_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for the loop to exit.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}
