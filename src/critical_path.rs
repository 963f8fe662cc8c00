//! Critical path extraction: zero-float tasks assembled into ordered chains.

use rustc_hash::FxHashMap;

use crate::forward_pass::ForwardPass;
use crate::graph::{DependencyGraph, TaskId};
use crate::models::{DependencyKind, TaskTiming};

/// Assemble the critical tasks into one or more maximal chains.
///
/// A task is critical iff its total float is exactly zero (integer ticks, no
/// tolerance needed). Chains follow *binding* edges — edges between two
/// critical tasks whose forward bound equals the successor's ES, i.e. the
/// edges that actually drive the schedule. Parallel binding edges between
/// the same ordered pair collapse to one link, FinishToStart first, then
/// higher dependency priority (the only effect priority has anywhere in the
/// engine). Every maximal path through the binding subgraph is returned;
/// parallel chains of equal length are a valid outcome. Chains are sorted
/// and deduplicated, so repeated runs on unchanged input are identical.
pub fn extract_chains(
    graph: &DependencyGraph,
    forward: &ForwardPass,
    timings: &[TaskTiming],
) -> Vec<Vec<String>> {
    let n = graph.len();
    let critical: Vec<bool> = timings.iter().map(|t| t.is_critical()).collect();

    // Collapse parallel binding edges per ordered pair.
    let mut links: FxHashMap<(TaskId, TaskId), (DependencyKind, i32)> = FxHashMap::default();
    for idx in 0..n {
        let pred = idx as TaskId;
        if !critical[idx] {
            continue;
        }
        for edge in graph.successors(pred) {
            let succ = edge.target;
            if !critical[succ as usize] {
                continue;
            }
            let bound = edge.kind.earliest_start_bound(
                forward.earliest_start[idx],
                forward.earliest_finish[idx],
                edge.lag,
                graph.duration(succ),
            );
            if bound != forward.earliest_start[succ as usize] {
                continue; // not the driving edge
            }
            let entry = links.entry((pred, succ)).or_insert((edge.kind, edge.priority));
            if prefer((edge.kind, edge.priority), *entry) {
                *entry = (edge.kind, edge.priority);
            }
        }
    }

    let mut outgoing: Vec<Vec<TaskId>> = vec![Vec::new(); n];
    let mut has_incoming = vec![false; n];
    for &(pred, succ) in links.keys() {
        outgoing[pred as usize].push(succ);
        has_incoming[succ as usize] = true;
    }
    for targets in &mut outgoing {
        targets.sort_unstable();
    }

    // Walk every maximal path from each chain head.
    let mut chains: Vec<Vec<String>> = Vec::new();
    for idx in 0..n {
        if critical[idx] && !has_incoming[idx] {
            let mut path: Vec<TaskId> = Vec::new();
            walk(idx as TaskId, &outgoing, &mut path, &mut |chain| {
                chains.push(
                    chain
                        .iter()
                        .map(|&id| graph.index().resolve(id).to_string())
                        .collect(),
                );
            });
        }
    }

    chains.sort();
    chains.dedup();
    chains
}

/// FinishToStart-dominant link preference: FS beats any other kind, then
/// higher priority wins.
fn prefer(candidate: (DependencyKind, i32), current: (DependencyKind, i32)) -> bool {
    let fs = |kind: DependencyKind| kind == DependencyKind::FinishToStart;
    match (fs(candidate.0), fs(current.0)) {
        (true, false) => true,
        (false, true) => false,
        _ => candidate.1 > current.1,
    }
}

/// Depth-first enumeration of maximal paths. The binding subgraph is a
/// sub-DAG of an already-validated graph, so no visited set is needed.
fn walk(
    node: TaskId,
    outgoing: &[Vec<TaskId>],
    path: &mut Vec<TaskId>,
    emit: &mut impl FnMut(&[TaskId]),
) {
    path.push(node);
    let targets = &outgoing[node as usize];
    if targets.is_empty() {
        emit(path);
    } else {
        for &next in targets {
            walk(next, outgoing, path, emit);
        }
    }
    path.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backward_pass::backward_pass;
    use crate::compute::CancellationToken;
    use crate::float::compute_timings;
    use crate::forward_pass::forward_pass;
    use crate::models::{Dependency, Task};

    fn chains_of(tasks: &[Task], deps: &[Dependency]) -> Vec<Vec<String>> {
        let graph = DependencyGraph::build(tasks, deps).unwrap();
        let never = CancellationToken::new();
        let order = graph.topological_order(&never).unwrap();
        let fwd = forward_pass(&graph, &order, &never).unwrap();
        let bwd = backward_pass(&graph, &order, &fwd, &never).unwrap();
        let timings = compute_timings(&graph, &fwd, &bwd).unwrap();
        extract_chains(&graph, &fwd, &timings)
    }

    fn fs(id: &str, pred: &str, succ: &str) -> Dependency {
        Dependency::new(id, pred, succ, DependencyKind::FinishToStart)
    }

    #[test]
    fn test_single_chain() {
        // Spec scenario A: one chain [a, b, c].
        let tasks = vec![Task::new("a", 2), Task::new("b", 3), Task::new("c", 1)];
        let deps = vec![fs("d1", "a", "b"), fs("d2", "b", "c")];

        assert_eq!(chains_of(&tasks, &deps), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_parallel_paths_excludes_floating_branch() {
        // Spec scenario B: critical path is [a, b, d]; c floats.
        let tasks = vec![
            Task::new("a", 2),
            Task::new("b", 3),
            Task::new("c", 1),
            Task::new("d", 2),
        ];
        let deps = vec![
            fs("d1", "a", "b"),
            fs("d2", "a", "c").with_lag(1),
            fs("d3", "b", "d"),
            fs("d4", "c", "d"),
        ];

        assert_eq!(chains_of(&tasks, &deps), vec![vec!["a", "b", "d"]]);
    }

    #[test]
    fn test_equal_length_parallel_chains_both_reported() {
        // Two branches of identical length: ties are a valid outcome.
        let tasks = vec![
            Task::new("a", 2),
            Task::new("b", 3),
            Task::new("c", 3),
            Task::new("d", 2),
        ];
        let deps = vec![
            fs("d1", "a", "b"),
            fs("d2", "a", "c"),
            fs("d3", "b", "d"),
            fs("d4", "c", "d"),
        ];

        assert_eq!(
            chains_of(&tasks, &deps),
            vec![
                vec!["a", "b", "d"],
                vec!["a", "c", "d"],
            ]
        );
    }

    #[test]
    fn test_isolated_critical_task_is_own_chain() {
        // Scenario D shape: A alone defines the makespan.
        let tasks = vec![Task::new("a", 5), Task::new("b", 3)];
        let deps =
            vec![Dependency::new("d1", "a", "b", DependencyKind::StartToStart).with_lag(-2)];

        assert_eq!(chains_of(&tasks, &deps), vec![vec!["a"]]);
    }

    #[test]
    fn test_lagged_edge_still_drives() {
        // The lag on b -> d counts toward the driving bound, so both
        // branches tie for the makespan.
        let tasks = vec![
            Task::new("a", 1),
            Task::new("b", 1),
            Task::new("c", 2),
            Task::new("d", 1),
        ];
        let deps = vec![
            fs("d1", "a", "b"),
            fs("d2", "a", "c"),
            fs("d3", "b", "d").with_lag(1),
            fs("d4", "c", "d"),
        ];

        // a->b->d (with its lag) and a->c->d are both length-4 drivers.
        let chains = chains_of(&tasks, &deps);
        assert_eq!(chains, vec![vec!["a", "b", "d"], vec!["a", "c", "d"]]);
    }

    #[test]
    fn test_milestone_in_chain() {
        let tasks = vec![Task::new("a", 3), Task::new("m", 0), Task::new("b", 2)];
        let deps = vec![fs("d1", "a", "m"), fs("d2", "m", "b")];

        assert_eq!(chains_of(&tasks, &deps), vec![vec!["a", "m", "b"]]);
    }

    #[test]
    fn test_fs_dominance_collapses_parallel_edges() {
        // Two binding edges on the same pair; the chain is reported once.
        let tasks = vec![Task::new("a", 4), Task::new("b", 2)];
        let deps = vec![
            fs("d1", "a", "b"),
            Dependency::new("d2", "a", "b", DependencyKind::StartToStart)
                .with_lag(4)
                .with_priority(9),
        ];

        assert_eq!(chains_of(&tasks, &deps), vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_empty_graph_has_no_chains() {
        assert!(chains_of(&[], &[]).is_empty());
    }
}
