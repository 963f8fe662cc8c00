//! Error taxonomy for the scheduling engine.
//!
//! Validation variants reject bad input and leave the caller's state
//! untouched. `InvariantViolation` and `ComputationFailed` indicate a defect
//! in the engine itself and propagate as hard failures.

use thiserror::Error;

/// Errors produced by graph construction, validation, the CPM passes, and
/// the auto-scheduler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A dependency names the same task as predecessor and successor.
    #[error("dependency {dependency_id:?} makes task {task_id:?} depend on itself")]
    SelfDependency {
        dependency_id: String,
        task_id: String,
    },

    /// A dependency references a task id that does not exist.
    #[error("dependency {dependency_id:?} references unknown task {task_id:?}")]
    UnknownTask {
        dependency_id: String,
        task_id: String,
    },

    /// Two tasks share the same id.
    #[error("duplicate task id {task_id:?}")]
    DuplicateTask { task_id: String },

    /// A task has a negative duration.
    #[error("task {task_id:?} has a negative duration")]
    NegativeDuration { task_id: String },

    /// Accepting a candidate dependency would close a cycle. `path` is the
    /// task-id chain from the candidate's successor to its predecessor; the
    /// candidate edge would close it back to the successor.
    #[error("dependency would create a cycle through {path:?}")]
    CircularDependency { path: Vec<String> },

    /// The active dependency set already contains a cycle. `task_ids` are the
    /// tasks trapped on cycles, sorted by id.
    #[error("dependency graph contains a cycle involving tasks {task_ids:?}")]
    CycleDetected { task_ids: Vec<String> },

    /// A computed value broke an internal invariant (e.g. negative float).
    /// This is an engine defect, not bad input.
    #[error("invariant violation on task {task_id:?}: {detail}")]
    InvariantViolation { task_id: String, detail: String },

    /// The working-calendar fix-up did not stabilize within the sweep bound.
    #[error("schedule did not converge after {sweeps} fix-up sweeps")]
    NotConverged { sweeps: usize },

    /// The computation was cancelled via its `CancellationToken`.
    #[error("computation cancelled")]
    Cancelled,

    /// A worker thread terminated without reporting a result.
    #[error("computation worker terminated without a result")]
    ComputationFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_offending_ids() {
        let err = EngineError::UnknownTask {
            dependency_id: "d1".to_string(),
            task_id: "ghost".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("d1"));
        assert!(msg.contains("ghost"));
    }

    #[test]
    fn test_cycle_errors_carry_paths() {
        let err = EngineError::CircularDependency {
            path: vec!["b".to_string(), "c".to_string(), "a".to_string()],
        };
        assert!(err.to_string().contains('b'));

        let err = EngineError::CycleDetected {
            task_ids: vec!["a".to_string(), "b".to_string()],
        };
        assert!(err.to_string().contains("cycle"));
    }
}
