//! App - アプリケーション層
//!
//! このモジュールは、engine と ports を組み合わせて配線します。
//!
//! # 主要コンポーネント
//! - **EngineBuilder**: エンジンの構築とワイヤリング
//! - **FlushLoop**: 永続化フラッシュの定期実行（デフォルト 1 秒）
//! - **SweepLoop**: リテンション掃除の定期実行（デフォルト 1 時間）
//! - **dispatcher**: ライフサイクルのランプ実行と Executor への受け渡し
//! - **status**: 状態別カウント・タスク一覧ビュー
//!
//! FlushLoop / SweepLoop は独立に spawn できるタイマーで、テストでは
//! ループを起動せず `Engine::flush_now` / `Engine::sweep_now` を直接
//! tick する（wall-clock 非依存）。

pub mod builder;
pub mod dispatcher;
pub mod flush_loop;
pub mod status;
pub mod sweep_loop;

// 主要な型を再エクスポート
pub use self::builder::EngineBuilder;
pub use self::dispatcher::{resume_task, run_task};
pub use self::flush_loop::{DEFAULT_FLUSH_INTERVAL, FlushLoop};
pub use self::status::TaskCounts;
pub use self::sweep_loop::{DEFAULT_SWEEP_INTERVAL, SweepLoop};
