//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部コラボレーター（永続化ストア、時計、ID 生成、
//! バッチ実行本体）へのインターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - メモリ上の TaskStore が source of truth（正本）
//! - DurableStore はクラッシュ復旧用の写し（flush 間隔分だけ遅れてよい）
//! - Executor はエンジンの外（ここでは契約のみを定義する）

pub mod clock;
pub mod durable_store;
pub mod executor;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::durable_store::{DurableStore, PersistenceError};
pub use self::executor::Executor;
pub use self::id_generator::{IdGenerator, UlidGenerator};
