//! Forward CPM pass: earliest start / earliest finish per task.

use crate::compute::CancellationToken;
use crate::error::EngineError;
use crate::graph::DependencyGraph;
use crate::models::Ticks;

/// Earliest times from the forward pass, indexed by graph task id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardPass {
    pub earliest_start: Vec<Ticks>,
    pub earliest_finish: Vec<Ticks>,
    /// max(EF) over all tasks — the project makespan in ticks.
    pub project_finish: Ticks,
}

/// Compute earliest start/finish for every task.
///
/// `order` must be a topological order of `graph`. A task with no active
/// predecessors is a root and gets ES = 0 (the project start baseline)
/// exactly. Any other task takes the maximum over its incoming edges of the
/// per-kind bound; negative lag can pull that maximum below zero and is NOT
/// clamped — only true roots are pinned to the baseline.
pub fn forward_pass(
    graph: &DependencyGraph,
    order: &[crate::graph::TaskId],
    cancel: &CancellationToken,
) -> Result<ForwardPass, EngineError> {
    let n = graph.len();
    let mut earliest_start: Vec<Ticks> = vec![0; n];
    let mut earliest_finish: Vec<Ticks> = vec![0; n];
    let mut project_finish: Ticks = 0;

    for &id in order {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let duration = graph.duration(id);
        let preds = graph.predecessors(id);

        let es = if preds.is_empty() {
            0
        } else {
            // Predecessors are already finalized: `order` is topological.
            preds
                .iter()
                .map(|edge| {
                    edge.kind.earliest_start_bound(
                        earliest_start[edge.target as usize],
                        earliest_finish[edge.target as usize],
                        edge.lag,
                        duration,
                    )
                })
                .max()
                .unwrap()
        };

        let ef = es + duration;
        earliest_start[id as usize] = es;
        earliest_finish[id as usize] = ef;
        if ef > project_finish {
            project_finish = ef;
        }
    }

    Ok(ForwardPass {
        earliest_start,
        earliest_finish,
        project_finish,
    })
}
