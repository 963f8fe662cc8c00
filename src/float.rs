//! Float (slack) derivation from the two CPM passes.

use crate::backward_pass::BackwardPass;
use crate::error::EngineError;
use crate::forward_pass::ForwardPass;
use crate::graph::{DependencyGraph, TaskId};
use crate::models::TaskTiming;

/// Assemble per-task timings and derive total/free float.
///
/// Total float = LS − ES (identical to LF − EF with integer ticks). A
/// feasible schedule can never produce a negative float; seeing one means
/// the passes disagree, which is an engine defect — it fails loudly instead
/// of being clamped away. Free float is the minimum per-edge slack before
/// any immediate successor's own earliest times move; sinks fall back to
/// their total float.
pub fn compute_timings(
    graph: &DependencyGraph,
    forward: &ForwardPass,
    backward: &BackwardPass,
) -> Result<Vec<TaskTiming>, EngineError> {
    let n = graph.len();
    let mut timings = Vec::with_capacity(n);

    for idx in 0..n {
        let id = idx as TaskId;
        let es = forward.earliest_start[idx];
        let ef = forward.earliest_finish[idx];
        let ls = backward.latest_start[idx];
        let lf = backward.latest_finish[idx];

        let total_float = ls - es;
        if total_float < 0 {
            return Err(EngineError::InvariantViolation {
                task_id: graph.index().resolve(id).to_string(),
                detail: format!("negative total float {total_float}"),
            });
        }

        let successors = graph.successors(id);
        let free_float = if successors.is_empty() {
            total_float
        } else {
            let min_slack = successors
                .iter()
                .map(|edge| {
                    edge.kind.free_slack(
                        es,
                        ef,
                        forward.earliest_start[edge.target as usize],
                        forward.earliest_finish[edge.target as usize],
                        edge.lag,
                    )
                })
                .min()
                .unwrap();
            if min_slack < 0 {
                return Err(EngineError::InvariantViolation {
                    task_id: graph.index().resolve(id).to_string(),
                    detail: format!("negative free float {min_slack}"),
                });
            }
            min_slack
        };

        timings.push(TaskTiming {
            earliest_start: es,
            earliest_finish: ef,
            latest_start: ls,
            latest_finish: lf,
            total_float,
            free_float,
        });
    }

    Ok(timings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backward_pass::backward_pass;
    use crate::compute::CancellationToken;
    use crate::forward_pass::forward_pass;
    use crate::models::{Dependency, DependencyKind, Task, Ticks};

    fn run(tasks: &[Task], deps: &[Dependency]) -> (DependencyGraph, Vec<TaskTiming>) {
        let graph = DependencyGraph::build(tasks, deps).unwrap();
        let never = CancellationToken::new();
        let order = graph.topological_order(&never).unwrap();
        let fwd = forward_pass(&graph, &order, &never).unwrap();
        let bwd = backward_pass(&graph, &order, &fwd, &never).unwrap();
        let timings = compute_timings(&graph, &fwd, &bwd).unwrap();
        (graph, timings)
    }

    fn timing(graph: &DependencyGraph, timings: &[TaskTiming], id: &str) -> TaskTiming {
        timings[graph.index().get(id).unwrap() as usize]
    }

    #[test]
    fn test_chain_all_critical() {
        // Spec scenario A: every task on the single chain has zero float.
        let tasks = vec![Task::new("a", 2), Task::new("b", 3), Task::new("c", 1)];
        let deps = vec![
            Dependency::new("d1", "a", "b", DependencyKind::FinishToStart),
            Dependency::new("d2", "b", "c", DependencyKind::FinishToStart),
        ];
        let (graph, timings) = run(&tasks, &deps);

        for id in ["a", "b", "c"] {
            let t = timing(&graph, &timings, id);
            assert_eq!(t.total_float, 0);
            assert_eq!(t.free_float, 0);
            assert!(t.is_critical());
        }
    }

    #[test]
    fn test_parallel_branch_floats() {
        // Spec scenario B: C floats by 1, total and free alike.
        let tasks = vec![
            Task::new("a", 2),
            Task::new("b", 3),
            Task::new("c", 1),
            Task::new("d", 2),
        ];
        let deps = vec![
            Dependency::new("d1", "a", "b", DependencyKind::FinishToStart),
            Dependency::new("d2", "a", "c", DependencyKind::FinishToStart).with_lag(1),
            Dependency::new("d3", "b", "d", DependencyKind::FinishToStart),
            Dependency::new("d4", "c", "d", DependencyKind::FinishToStart),
        ];
        let (graph, timings) = run(&tasks, &deps);

        let c = timing(&graph, &timings, "c");
        assert_eq!(c.total_float, 1);
        assert_eq!(c.free_float, 1);
        assert!(!c.is_critical());

        for id in ["a", "b", "d"] {
            assert!(timing(&graph, &timings, id).is_critical());
        }
    }

    #[test]
    fn test_ef_es_and_lf_ls_identities() {
        let tasks = vec![Task::new("a", 5), Task::new("b", 3), Task::new("c", 4)];
        let deps = vec![
            Dependency::new("d1", "a", "b", DependencyKind::StartToStart).with_lag(-2),
            Dependency::new("d2", "a", "c", DependencyKind::FinishToFinish).with_lag(2),
        ];
        let (graph, timings) = run(&tasks, &deps);

        for id in ["a", "b", "c"] {
            let idx = graph.index().get(id).unwrap();
            let t = timings[idx as usize];
            let dur: Ticks = graph.duration(idx);
            assert_eq!(t.earliest_finish, t.earliest_start + dur);
            assert_eq!(t.latest_finish, t.latest_start + dur);
            // The two total-float formulations agree exactly.
            assert_eq!(t.latest_start - t.earliest_start, t.latest_finish - t.earliest_finish);
        }
    }

    #[test]
    fn test_free_float_never_exceeds_total() {
        let tasks = vec![
            Task::new("a", 2),
            Task::new("b", 6),
            Task::new("c", 1),
            Task::new("d", 3),
        ];
        let deps = vec![
            Dependency::new("d1", "a", "b", DependencyKind::FinishToStart),
            Dependency::new("d2", "a", "c", DependencyKind::FinishToStart),
            Dependency::new("d3", "c", "d", DependencyKind::FinishToStart),
            Dependency::new("d4", "b", "d", DependencyKind::FinishToStart),
        ];
        let (_, timings) = run(&tasks, &deps);

        for t in &timings {
            assert!(t.total_float >= 0);
            assert!(t.free_float <= t.total_float);
        }
    }

    #[test]
    fn test_mid_chain_free_float_vs_total() {
        // a -> c is the long branch; b -> c short. b's free float equals its
        // total float here since c is its only successor.
        let tasks = vec![Task::new("a", 10), Task::new("b", 4), Task::new("c", 2)];
        let deps = vec![
            Dependency::new("d1", "a", "c", DependencyKind::FinishToStart),
            Dependency::new("d2", "b", "c", DependencyKind::FinishToStart),
        ];
        let (graph, timings) = run(&tasks, &deps);

        let b = timing(&graph, &timings, "b");
        assert_eq!(b.total_float, 6);
        assert_eq!(b.free_float, 6);
    }

    #[test]
    fn test_negative_lag_scenario_floats() {
        // Spec scenario D: B floats by 4 (its EF of 1 vs project finish 5).
        let tasks = vec![Task::new("a", 5), Task::new("b", 3)];
        let deps = vec![Dependency::new("d1", "a", "b", DependencyKind::StartToStart).with_lag(-2)];
        let (graph, timings) = run(&tasks, &deps);

        let a = timing(&graph, &timings, "a");
        let b = timing(&graph, &timings, "b");
        assert!(a.is_critical());
        assert_eq!(b.earliest_start, -2);
        assert_eq!(b.total_float, 4);
    }
}
