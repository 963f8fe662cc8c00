//! Critical-path (CPM) scheduling engine for task dependency graphs.
//!
//! Given tasks and typed, lagged dependencies, the engine validates the
//! graph (no cycles, no dangling references), runs the forward and backward
//! CPM passes, derives total/free float, extracts the critical chain(s), and
//! assigns concrete calendar dates from a project start — optionally against
//! a working calendar. It is a stateless function library over immutable
//! snapshots: there is no engine-held "current project", so independent
//! computations can run concurrently, and [`compute::spawn`] moves any of
//! them off the calling thread with cooperative cancellation.
//!
//! The computed timing map and critical chains are everything a Gantt
//! rendering layer needs; the engine knows nothing of pixels, persistence,
//! or transport.

pub mod backward_pass;
pub mod calendar;
pub mod compute;
pub mod critical_path;
pub mod error;
pub mod float;
pub mod forward_pass;
pub mod graph;
pub mod logging;
pub mod models;
pub mod schedule;

use rustc_hash::FxHashMap;

pub use backward_pass::{backward_pass, BackwardPass};
pub use calendar::{BlockedPeriods, WeekdayCalendar, WorkingCalendar};
pub use compute::{spawn, CancellationToken, Computation};
pub use error::EngineError;
pub use float::compute_timings;
pub use forward_pass::{forward_pass, ForwardPass};
pub use graph::DependencyGraph;
pub use models::{Dependency, DependencyKind, ScheduledTask, Task, TaskTiming, Ticks};
pub use schedule::{auto_schedule, auto_schedule_with_config, ScheduleConfig};

/// Check a candidate dependency against the current task and active
/// dependency sets without committing anything.
///
/// Rejects self-loops, references to unknown tasks, and edges that would
/// close a cycle (reported with the path the edge would close). On rejection
/// the caller's state is untouched by construction — this is a pure function
/// over the snapshot. Note the check-then-commit sequence is a critical
/// section: callers must serialize concurrent mutations themselves.
pub fn validate_dependency(
    tasks: &[Task],
    dependencies: &[Dependency],
    candidate: &Dependency,
) -> Result<(), EngineError> {
    let graph = DependencyGraph::build(tasks, dependencies)?;
    graph.validate_candidate(candidate)
}

/// Whole-graph validation: is the active dependency set acyclic?
///
/// Defense in depth alongside [`validate_dependency`]; reports every task
/// trapped on a cycle.
pub fn validate_graph(tasks: &[Task], dependencies: &[Dependency]) -> Result<(), EngineError> {
    DependencyGraph::build(tasks, dependencies)?.validate_acyclic()
}

/// Run both CPM passes and derive floats for every task.
///
/// The result is a fresh map keyed by task id — never a mutated view, so
/// concurrent readers of a previous result are unaffected.
pub fn compute_floats(
    tasks: &[Task],
    dependencies: &[Dependency],
) -> Result<FxHashMap<String, TaskTiming>, EngineError> {
    compute_floats_cancellable(tasks, dependencies, &CancellationToken::new())
}

/// [`compute_floats`] with a cancellation token, for use under
/// [`compute::spawn`]. The token is checked at every topological step.
pub fn compute_floats_cancellable(
    tasks: &[Task],
    dependencies: &[Dependency],
    cancel: &CancellationToken,
) -> Result<FxHashMap<String, TaskTiming>, EngineError> {
    let graph = DependencyGraph::build(tasks, dependencies)?;
    let order = graph.topological_order(cancel)?;
    let forward = forward_pass(&graph, &order, cancel)?;
    let backward = backward_pass(&graph, &order, &forward, cancel)?;
    let timings = compute_timings(&graph, &forward, &backward)?;

    Ok(timings
        .into_iter()
        .enumerate()
        .map(|(idx, timing)| {
            (
                graph.index().resolve(idx as crate::graph::TaskId).to_string(),
                timing,
            )
        })
        .collect())
}

/// Extract the ordered critical chain(s): every maximal path of zero-float
/// tasks connected by schedule-driving edges.
pub fn compute_critical_path(
    tasks: &[Task],
    dependencies: &[Dependency],
) -> Result<Vec<Vec<String>>, EngineError> {
    compute_critical_path_cancellable(tasks, dependencies, &CancellationToken::new())
}

/// [`compute_critical_path`] with a cancellation token.
pub fn compute_critical_path_cancellable(
    tasks: &[Task],
    dependencies: &[Dependency],
    cancel: &CancellationToken,
) -> Result<Vec<Vec<String>>, EngineError> {
    let graph = DependencyGraph::build(tasks, dependencies)?;
    let order = graph.topological_order(cancel)?;
    let forward = forward_pass(&graph, &order, cancel)?;
    let backward = backward_pass(&graph, &order, &forward, cancel)?;
    let timings = compute_timings(&graph, &forward, &backward)?;

    Ok(critical_path::extract_chains(&graph, &forward, &timings))
}
