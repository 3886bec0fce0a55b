//! dataflow-core
//!
//! Resumable batch-task orchestration engine for the grade-analysis app:
//! strict task state machine, progress/ETA tracking, crash-recovery
//! checkpoints, write-coalesced persistence, event fan-out, and retention
//! sweeping.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, state, progress, checkpoint, event, errors）
//! - **ports**: 抽象化レイヤー（DurableStore, Clock, IdGenerator, Executor）
//! - **engine**: エンジン本体（TaskStore, EventBus, PersistenceGateway, Engine）
//! - **app**: アプリケーションロジック（builder, flush_loop, sweep_loop, dispatcher, status）
//! - **impls**: 実装（InMemoryDurableStore など開発用）

pub mod app;
pub mod domain;
pub mod engine;
pub mod impls;
pub mod ports;
