//! Task record and creation config.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::checkpoint::Checkpoint;
use super::ids::TaskId;
use super::progress::TaskProgress;
use super::state::TaskState;

/// What kind of batch work this task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Import of exam grade rows.
    GradeImport,

    /// Import of student roster rows.
    StudentImport,

    /// Recomputation of derived exam statistics.
    ExamRecalculation,
}

/// Per-task import configuration, carried in the task context and handed
/// to the executor. Defaults mirror the common single-file import case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub batch_size: usize,
    pub create_missing_records: bool,
    pub update_existing_data: bool,
    pub skip_duplicates: bool,
    pub enable_backup: bool,
    pub enable_rollback: bool,
    pub parallel_import: bool,
    pub strict_mode: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            create_missing_records: true,
            update_existing_data: true,
            skip_duplicates: true,
            enable_backup: true,
            enable_rollback: true,
            parallel_import: false,
            strict_mode: false,
        }
    }
}

/// Execution context attached to a task.
///
/// `extra` is intentionally open-ended JSON (exam id, file name, column
/// mapping, ...) so callers can evolve it without breaking changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskContext {
    #[serde(default)]
    pub config: ImportConfig,

    #[serde(default)]
    pub extra: serde_json::Value,
}

/// Input for `Engine::create_task`.
///
/// `data` is the full set of rows to process. The engine only reads its
/// length (for `progress.total`); the rows themselves travel to the
/// executor outside the engine.
#[derive(Debug, Clone)]
pub struct TaskCreationConfig {
    pub kind: TaskKind,
    pub data: Vec<serde_json::Value>,
    pub context: TaskContext,
    pub auto_start: bool,
}

/// A recorded task-level error. Append-only; advisory unless the executor
/// drives the task to FAILED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedError {
    pub code: String,
    pub message: String,

    /// Batch the error occurred in, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_index: Option<u32>,

    pub timestamp: DateTime<Utc>,
}

/// The task record: single source of truth for one unit of resumable
/// batch work.
///
/// Design: Following the same pattern as the copy-on-write store — this
/// struct is a value. Mutation happens by cloning, adjusting, and swapping
/// the whole record into the store; no shared aliasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub kind: TaskKind,
    pub state: TaskState,
    pub progress: TaskProgress,
    pub context: TaskContext,

    /// Strictly increasing by `batch_index`.
    pub checkpoints: Vec<Checkpoint>,

    pub errors: Vec<DetailedError>,
    pub warnings: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// First entry into Processing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Last entry into Paused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<DateTime<Utc>>,

    /// Entry into any terminal state (Completed/Failed/Cancelled).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    pub resumable: bool,
    pub can_retry: bool,
}

impl Task {
    /// Fresh Idle task. `total` comes from the creation config's row count.
    pub fn new(
        id: TaskId,
        kind: TaskKind,
        total: u64,
        context: TaskContext,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            state: TaskState::Idle,
            progress: TaskProgress::new(total),
            context,
            checkpoints: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            created_at: now,
            updated_at: now,
            started_at: None,
            paused_at: None,
            completed_at: None,
            resumable: true,
            can_retry: true,
        }
    }

    /// Highest-index checkpoint, if any. Appends are monotonic, so this is
    /// simply the last element.
    pub fn latest_checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoints.last()
    }
}
