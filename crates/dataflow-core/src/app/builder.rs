//! EngineBuilder - エンジンの構築とワイヤリング

use std::sync::Arc;

use chrono::Duration;

use crate::engine::Engine;
use crate::ports::{Clock, DurableStore, IdGenerator, SystemClock, UlidGenerator};

/// Default retention window for terminal tasks (7 days).
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// EngineBuilder はエンジンを構築
///
/// # 使用例
/// ```ignore
/// let engine = EngineBuilder::new(Arc::new(InMemoryDurableStore::new()))
///     .retention_window(Duration::days(7))
///     .build();
/// engine.init().await?;
/// ```
///
/// DurableStore だけが必須。Clock / IdGenerator は本番用の実装が
/// デフォルトで、テストでは FixedClock などに差し替える。
pub struct EngineBuilder {
    durable: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
    ids: Option<Arc<dyn IdGenerator>>,
    retention_window: Duration,
}

impl EngineBuilder {
    pub fn new(durable: Arc<dyn DurableStore>) -> Self {
        Self {
            durable,
            clock: Arc::new(SystemClock),
            ids: None,
            retention_window: Duration::days(DEFAULT_RETENTION_DAYS),
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn retention_window(mut self, window: Duration) -> Self {
        self.retention_window = window;
        self
    }

    pub fn build(self) -> Engine {
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));
        Engine::new(self.durable, self.clock, ids, self.retention_window)
    }
}
