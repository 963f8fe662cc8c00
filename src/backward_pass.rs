//! Backward CPM pass: latest start / latest finish per task.

use crate::compute::CancellationToken;
use crate::error::EngineError;
use crate::forward_pass::ForwardPass;
use crate::graph::DependencyGraph;
use crate::models::Ticks;

/// Latest times from the backward pass, indexed by graph task id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackwardPass {
    pub latest_start: Vec<Ticks>,
    pub latest_finish: Vec<Ticks>,
}

/// Compute latest start/finish for every task, in reverse topological order.
///
/// Every task's LF starts at the project finish and is lowered by the
/// minimum over its outgoing edges of the per-kind bound (the forward
/// constraints solved for the predecessor side). Seeding ALL tasks at the
/// project finish — not just sinks — matters when a non-sink task's own EF
/// defines the makespan (possible with StartToStart or negative-lag edges);
/// sinks still get LF = project finish exactly. LS = LF − duration.
pub fn backward_pass(
    graph: &DependencyGraph,
    order: &[crate::graph::TaskId],
    forward: &ForwardPass,
    cancel: &CancellationToken,
) -> Result<BackwardPass, EngineError> {
    let n = graph.len();
    let mut latest_start: Vec<Ticks> = vec![0; n];
    let mut latest_finish: Vec<Ticks> = vec![forward.project_finish; n];

    for &id in order.iter().rev() {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let duration = graph.duration(id);
        let mut lf = forward.project_finish;

        for edge in graph.successors(id) {
            let bound = edge.kind.latest_finish_bound(
                latest_start[edge.target as usize],
                latest_finish[edge.target as usize],
                edge.lag,
                duration,
            );
            if bound < lf {
                lf = bound;
            }
        }

        latest_finish[id as usize] = lf;
        latest_start[id as usize] = lf - duration;
    }

    Ok(BackwardPass {
        latest_start,
        latest_finish,
    })
}
