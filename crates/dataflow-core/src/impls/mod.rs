//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryDurableStore**: 開発・テスト用の永続化ストア
//!
//! # 本番用実装
//! 本番用の DurableStore（ファイル KV、組み込み DB、リモートストア）は
//! 別クレートに配置します。エンジンは trait 契約のみに依存します。

pub mod inmem_store;

pub use self::inmem_store::InMemoryDurableStore;
