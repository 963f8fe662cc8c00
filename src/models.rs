//! Core data types for the scheduling engine.
//!
//! All elapsed-time arithmetic uses integer ticks relative to the project
//! start; one tick is one minute at the calendar boundary. Integer ticks keep
//! the pass arithmetic exact, so float comparisons need no epsilon.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Elapsed time in ticks (minutes) relative to the project start.
pub type Ticks = i64;

/// The four CPM dependency constraint types.
///
/// Each variant carries its constraint formulas as pure functions keyed by
/// the tag, so the passes stay branch-free and each formula is testable in
/// isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    /// Successor may start once the predecessor has finished.
    FinishToStart,
    /// Successor may start once the predecessor has started.
    StartToStart,
    /// Successor may finish once the predecessor has finished.
    FinishToFinish,
    /// Successor may finish once the predecessor has started.
    StartToFinish,
}

impl DependencyKind {
    /// Lower bound this edge places on the successor's earliest start.
    ///
    /// The finish-side variants constrain the successor's EF; subtracting the
    /// successor's duration converts them to an ES bound.
    pub fn earliest_start_bound(
        self,
        pred_es: Ticks,
        pred_ef: Ticks,
        lag: Ticks,
        succ_duration: Ticks,
    ) -> Ticks {
        match self {
            DependencyKind::FinishToStart => pred_ef + lag,
            DependencyKind::StartToStart => pred_es + lag,
            DependencyKind::FinishToFinish => pred_ef + lag - succ_duration,
            DependencyKind::StartToFinish => pred_es + lag - succ_duration,
        }
    }

    /// Upper bound this edge places on the predecessor's latest finish,
    /// given the successor's latest times (the same four constraints solved
    /// for the predecessor side).
    pub fn latest_finish_bound(
        self,
        succ_ls: Ticks,
        succ_lf: Ticks,
        lag: Ticks,
        pred_duration: Ticks,
    ) -> Ticks {
        match self {
            DependencyKind::FinishToStart => succ_ls - lag,
            DependencyKind::StartToStart => succ_ls - lag + pred_duration,
            DependencyKind::FinishToFinish => succ_lf - lag,
            DependencyKind::StartToFinish => succ_lf - lag + pred_duration,
        }
    }

    /// Slack the predecessor can absorb before this edge pushes the
    /// successor's own earliest times, evaluated at the successor's ES/EF
    /// (not its latest times).
    pub fn free_slack(
        self,
        pred_es: Ticks,
        pred_ef: Ticks,
        succ_es: Ticks,
        succ_ef: Ticks,
        lag: Ticks,
    ) -> Ticks {
        match self {
            DependencyKind::FinishToStart => succ_es - (pred_ef + lag),
            DependencyKind::StartToStart => succ_es - (pred_es + lag),
            DependencyKind::FinishToFinish => succ_ef - (pred_ef + lag),
            DependencyKind::StartToFinish => succ_ef - (pred_es + lag),
        }
    }
}

/// A task to be scheduled.
///
/// Only the scheduling-relevant subset: id, duration, and optional
/// caller-supplied date anchors. A zero-duration task is a milestone and
/// participates in the passes like any other node. The `start` anchor is
/// honored by the auto-scheduler for root tasks; `end` is carried for the
/// caller's re-validation and never read by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub duration: Ticks,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl Task {
    pub fn new(id: impl Into<String>, duration: Ticks) -> Self {
        Self {
            id: id.into(),
            duration,
            start: None,
            end: None,
        }
    }

    pub fn with_start(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: NaiveDateTime) -> Self {
        self.end = Some(end);
        self
    }

    /// Whether this task is a milestone (zero duration).
    pub fn is_milestone(&self) -> bool {
        self.duration == 0
    }
}

/// A directed dependency between two tasks.
///
/// Inactive dependencies are excluded from graph construction and every
/// computation. `priority` is a tie-break hint for chain assembly only; it
/// never affects computed CPM values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    pub predecessor_id: String,
    pub successor_id: String,
    pub kind: DependencyKind,
    /// Signed offset applied to the constraint; negative lag models lead
    /// time (overlap).
    pub lag: Ticks,
    pub active: bool,
    pub priority: i32,
}

impl Dependency {
    pub fn new(
        id: impl Into<String>,
        predecessor_id: impl Into<String>,
        successor_id: impl Into<String>,
        kind: DependencyKind,
    ) -> Self {
        Self {
            id: id.into(),
            predecessor_id: predecessor_id.into(),
            successor_id: successor_id.into(),
            kind,
            lag: 0,
            active: true,
            priority: 0,
        }
    }

    pub fn with_lag(mut self, lag: Ticks) -> Self {
        self.lag = lag;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Computed CPM timing for one task. Ephemeral: rebuilt from scratch on
/// every computation, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskTiming {
    pub earliest_start: Ticks,
    pub earliest_finish: Ticks,
    pub latest_start: Ticks,
    pub latest_finish: Ticks,
    /// Slack before the task delays the project finish.
    pub total_float: Ticks,
    /// Slack before the task delays any immediate successor's earliest times.
    pub free_float: Ticks,
}

impl TaskTiming {
    /// Ticks are integers, so criticality is an exact zero-float test.
    pub fn is_critical(&self) -> bool {
        self.total_float == 0
    }
}

/// A task with concrete calendar dates assigned by the auto-scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder() {
        let anchor = NaiveDateTime::parse_from_str("2025-03-03 08:00", "%Y-%m-%d %H:%M").unwrap();
        let task = Task::new("a", 120).with_start(anchor);

        assert_eq!(task.id, "a");
        assert_eq!(task.duration, 120);
        assert_eq!(task.start, Some(anchor));
        assert_eq!(task.end, None);
        assert!(!task.is_milestone());
        assert!(Task::new("m", 0).is_milestone());
    }

    #[test]
    fn test_dependency_builder() {
        let dep = Dependency::new("d1", "a", "b", DependencyKind::StartToStart)
            .with_lag(-30)
            .with_priority(5);

        assert_eq!(dep.predecessor_id, "a");
        assert_eq!(dep.successor_id, "b");
        assert_eq!(dep.lag, -30);
        assert_eq!(dep.priority, 5);
        assert!(dep.active);
        assert!(!dep.inactive().active);
    }

    #[test]
    fn test_earliest_start_bounds() {
        // Predecessor: ES=10, EF=40. Successor duration 20, lag 5.
        let (es, ef, lag, dur) = (10, 40, 5, 20);
        assert_eq!(
            DependencyKind::FinishToStart.earliest_start_bound(es, ef, lag, dur),
            45
        );
        assert_eq!(
            DependencyKind::StartToStart.earliest_start_bound(es, ef, lag, dur),
            15
        );
        assert_eq!(
            DependencyKind::FinishToFinish.earliest_start_bound(es, ef, lag, dur),
            25
        );
        assert_eq!(
            DependencyKind::StartToFinish.earliest_start_bound(es, ef, lag, dur),
            -5
        );
    }

    #[test]
    fn test_latest_finish_bounds() {
        // Successor: LS=50, LF=80. Predecessor duration 30, lag 5.
        let (ls, lf, lag, dur) = (50, 80, 5, 30);
        assert_eq!(
            DependencyKind::FinishToStart.latest_finish_bound(ls, lf, lag, dur),
            45
        );
        assert_eq!(
            DependencyKind::StartToStart.latest_finish_bound(ls, lf, lag, dur),
            75
        );
        assert_eq!(
            DependencyKind::FinishToFinish.latest_finish_bound(ls, lf, lag, dur),
            75
        );
        assert_eq!(
            DependencyKind::StartToFinish.latest_finish_bound(ls, lf, lag, dur),
            105
        );
    }

    #[test]
    fn test_free_slack_zero_when_tight() {
        // A tight FinishToStart edge: successor starts exactly at pred EF + lag.
        let slack = DependencyKind::FinishToStart.free_slack(0, 40, 45, 65, 5);
        assert_eq!(slack, 0);

        // Successor starts 10 later than required.
        let slack = DependencyKind::FinishToStart.free_slack(0, 40, 55, 75, 5);
        assert_eq!(slack, 10);
    }

    #[test]
    fn test_negative_lag_is_lead_time() {
        // StartToStart with lag -2: successor may start 2 ticks before the
        // predecessor does.
        let bound = DependencyKind::StartToStart.earliest_start_bound(0, 5, -2, 3);
        assert_eq!(bound, -2);
    }

    #[test]
    fn test_timing_criticality_exact() {
        let timing = TaskTiming {
            earliest_start: 0,
            earliest_finish: 5,
            latest_start: 0,
            latest_finish: 5,
            total_float: 0,
            free_float: 0,
        };
        assert!(timing.is_critical());

        let slack = TaskTiming {
            total_float: 1,
            ..timing
        };
        assert!(!slack.is_critical());
    }

    #[test]
    fn test_models_serialize() {
        let dep = Dependency::new("d1", "a", "b", DependencyKind::FinishToFinish).with_lag(15);
        let json = serde_json::to_string(&dep).unwrap();
        let back: Dependency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dep);

        let timing = TaskTiming::default();
        let json = serde_json::to_string(&timing).unwrap();
        let back: TaskTiming = serde_json::from_str(&json).unwrap();
        assert_eq!(back, timing);
    }
}
