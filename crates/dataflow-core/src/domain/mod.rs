//! Domain model (IDs, task record, state machine, progress, events).

pub mod checkpoint;
pub mod errors;
pub mod event;
pub mod ids;
pub mod progress;
pub mod state;
pub mod task;

pub use checkpoint::Checkpoint;
pub use errors::EngineError;
pub use event::{EventKind, TaskUpdateEvent};
pub use ids::{SubscriptionId, TaskId};
pub use progress::{ProgressUpdate, TaskProgress};
pub use state::TaskState;
pub use task::{DetailedError, ImportConfig, Task, TaskContext, TaskCreationConfig, TaskKind};
