//! Task state machine.

use serde::{Deserialize, Serialize};

/// Task state.
///
/// State transitions:
/// - Idle -> Queued -> Preparing -> Validating -> Processing
/// - Processing -> Paused -> Resuming -> Processing
/// - Processing -> Completed | Failed
/// - any non-terminal state -> Cancelled
///
/// Design note: Using an enum ensures exhaustive matching and prevents
/// invalid states. The transition table lives in `can_transition_to` so it
/// can be validated without touching any task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Created but not yet started.
    Idle,

    /// Waiting for an executor to pick it up.
    Queued,

    /// Executor is loading/allocating what it needs.
    Preparing,

    /// Input rows are being validated before processing.
    Validating,

    /// Batch work in progress.
    Processing,

    /// Suspended by the caller; resumable from the latest checkpoint.
    Paused,

    /// Transitioning back from Paused to Processing.
    Resuming,

    /// All batches done.
    Completed,

    /// Executor reported a fatal condition.
    Failed,

    /// Cancelled by the caller (cooperative; executor stops at its next
    /// safe boundary).
    Cancelled,
}

impl TaskState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }

    /// Is this task actively being worked on?
    pub fn is_active(self) -> bool {
        matches!(
            self,
            TaskState::Preparing
                | TaskState::Validating
                | TaskState::Processing
                | TaskState::Resuming
        )
    }

    /// Legal-transition table. Pure: never looks at task data.
    pub fn can_transition_to(self, target: TaskState) -> bool {
        use TaskState::*;

        // Cancellation is allowed from any non-terminal state.
        if target == Cancelled {
            return !self.is_terminal();
        }

        matches!(
            (self, target),
            (Idle, Queued)
                | (Queued, Preparing)
                | (Preparing, Validating)
                | (Validating, Processing)
                | (Processing, Paused)
                | (Paused, Resuming)
                | (Resuming, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::TaskState::{self, *};
    use rstest::rstest;

    #[rstest]
    #[case(Idle, Queued)]
    #[case(Queued, Preparing)]
    #[case(Preparing, Validating)]
    #[case(Validating, Processing)]
    #[case(Processing, Paused)]
    #[case(Paused, Resuming)]
    #[case(Resuming, Processing)]
    #[case(Processing, Completed)]
    #[case(Processing, Failed)]
    #[case(Idle, Cancelled)]
    #[case(Queued, Cancelled)]
    #[case(Processing, Cancelled)]
    #[case(Paused, Cancelled)]
    #[case(Resuming, Cancelled)]
    fn legal_transitions(#[case] from: TaskState, #[case] to: TaskState) {
        assert!(from.can_transition_to(to), "{from:?} -> {to:?}");
    }

    #[rstest]
    #[case(Idle, Processing)] // must go through Queued/Preparing/Validating
    #[case(Queued, Paused)] // only Processing can pause
    #[case(Paused, Processing)] // must pass through Resuming
    #[case(Queued, Completed)]
    #[case(Idle, Failed)]
    #[case(Completed, Queued)] // terminal states never leave
    #[case(Completed, Cancelled)]
    #[case(Failed, Cancelled)]
    #[case(Cancelled, Cancelled)]
    #[case(Processing, Processing)] // self-transitions are not legal
    fn illegal_transitions(#[case] from: TaskState, #[case] to: TaskState) {
        assert!(!from.can_transition_to(to), "{from:?} -> {to:?}");
    }

    #[test]
    fn exactly_three_terminal_states() {
        let all = [
            Idle, Queued, Preparing, Validating, Processing, Paused, Resuming, Completed, Failed,
            Cancelled,
        ];
        let terminal: Vec<_> = all.iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![&Completed, &Failed, &Cancelled]);
    }

    #[test]
    fn serializes_screaming_snake_case() {
        // Persisted records use the wire names the UI layer expects.
        assert_eq!(serde_json::to_string(&Processing).unwrap(), "\"PROCESSING\"");
        assert_eq!(serde_json::to_string(&Cancelled).unwrap(), "\"CANCELLED\"");
    }
}
