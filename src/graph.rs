//! Dependency graph construction, cycle detection, and topological ordering.
//!
//! Tasks are interned into dense integer indices over a sorted id list, so
//! index order is lexicographic id order and every traversal that breaks ties
//! by index is deterministic across runs. Edges are adjacency lists of
//! indices; there are no object references and no ownership cycles, and a
//! snapshot is a plain structural copy.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use crate::compute::CancellationToken;
use crate::error::EngineError;
use crate::models::{Dependency, DependencyKind, Task, Ticks};

/// Dense task index (u32 for compact adjacency storage).
pub type TaskId = u32;

/// Task id string <-> integer mapping over a sorted id list.
#[derive(Debug, Clone)]
pub struct TaskIndex {
    to_id: FxHashMap<String, TaskId>,
    names: Vec<String>,
}

impl TaskIndex {
    /// Build an index from ids already sorted by the caller.
    fn from_sorted(names: Vec<String>) -> Self {
        let to_id = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i as TaskId))
            .collect();
        Self { to_id, names }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<TaskId> {
        self.to_id.get(name).copied()
    }

    #[inline]
    pub fn resolve(&self, id: TaskId) -> &str {
        &self.names[id as usize]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One directed edge in the graph. Stored on both the predecessor's
/// successor list and the successor's predecessor list; `target` is the
/// other endpoint in each case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub target: TaskId,
    pub kind: DependencyKind,
    pub lag: Ticks,
    pub priority: i32,
}

/// Immutable adjacency view of a task set and its active dependencies.
///
/// Duplicate edges between the same ordered pair are kept and honored
/// independently (they model multiple constraint types between two tasks).
/// Inactive dependencies never enter the graph.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    index: TaskIndex,
    durations: Vec<Ticks>,
    successors: Vec<Vec<Edge>>,
    predecessors: Vec<Vec<Edge>>,
}

impl DependencyGraph {
    /// Build the adjacency structure from a task list and its dependencies.
    ///
    /// Rejects duplicate task ids, negative durations, self-loops, and
    /// dependencies referencing unknown tasks. Does NOT check acyclicity;
    /// see [`DependencyGraph::validate_acyclic`].
    pub fn build(tasks: &[Task], dependencies: &[Dependency]) -> Result<Self, EngineError> {
        let mut names: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
        names.sort();
        for pair in names.windows(2) {
            if pair[0] == pair[1] {
                return Err(EngineError::DuplicateTask {
                    task_id: pair[0].clone(),
                });
            }
        }
        let index = TaskIndex::from_sorted(names);

        let n = index.len();
        let mut durations = vec![0; n];
        for task in tasks {
            if task.duration < 0 {
                return Err(EngineError::NegativeDuration {
                    task_id: task.id.clone(),
                });
            }
            // Every task id was interned above.
            let idx = index.get(&task.id).unwrap() as usize;
            durations[idx] = task.duration;
        }

        let mut successors: Vec<Vec<Edge>> = vec![Vec::new(); n];
        let mut predecessors: Vec<Vec<Edge>> = vec![Vec::new(); n];

        for dep in dependencies {
            if !dep.active {
                continue;
            }
            let (pred, succ) = Self::resolve_endpoints(&index, dep)?;

            successors[pred as usize].push(Edge {
                target: succ,
                kind: dep.kind,
                lag: dep.lag,
                priority: dep.priority,
            });
            predecessors[succ as usize].push(Edge {
                target: pred,
                kind: dep.kind,
                lag: dep.lag,
                priority: dep.priority,
            });
        }

        Ok(Self {
            index,
            durations,
            successors,
            predecessors,
        })
    }

    fn resolve_endpoints(
        index: &TaskIndex,
        dep: &Dependency,
    ) -> Result<(TaskId, TaskId), EngineError> {
        if dep.predecessor_id == dep.successor_id {
            return Err(EngineError::SelfDependency {
                dependency_id: dep.id.clone(),
                task_id: dep.predecessor_id.clone(),
            });
        }
        let pred = index
            .get(&dep.predecessor_id)
            .ok_or_else(|| EngineError::UnknownTask {
                dependency_id: dep.id.clone(),
                task_id: dep.predecessor_id.clone(),
            })?;
        let succ = index
            .get(&dep.successor_id)
            .ok_or_else(|| EngineError::UnknownTask {
                dependency_id: dep.id.clone(),
                task_id: dep.successor_id.clone(),
            })?;
        Ok((pred, succ))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &TaskIndex {
        &self.index
    }

    #[inline]
    pub fn duration(&self, id: TaskId) -> Ticks {
        self.durations[id as usize]
    }

    #[inline]
    pub fn successors(&self, id: TaskId) -> &[Edge] {
        &self.successors[id as usize]
    }

    #[inline]
    pub fn predecessors(&self, id: TaskId) -> &[Edge] {
        &self.predecessors[id as usize]
    }

    /// Whether committing `candidate` would close a cycle.
    ///
    /// A self-loop is rejected before any search. Otherwise: depth-first
    /// reachability from the candidate's successor along outgoing edges; if
    /// the candidate's predecessor is reachable, the new edge would close
    /// that path into a cycle. The graph is never mutated — commit/rollback
    /// is the caller's move, so rejection leaves prior state untouched.
    pub fn validate_candidate(&self, candidate: &Dependency) -> Result<(), EngineError> {
        let (pred, succ) = Self::resolve_endpoints(&self.index, candidate)?;

        // Iterative DFS with parent tracking for path reconstruction.
        let mut parent: FxHashMap<TaskId, TaskId> = FxHashMap::default();
        let mut visited = vec![false; self.len()];
        let mut stack = vec![succ];
        visited[succ as usize] = true;

        while let Some(node) = stack.pop() {
            if node == pred {
                return Err(EngineError::CircularDependency {
                    path: self.reconstruct_path(&parent, succ, pred),
                });
            }
            for edge in self.successors(node) {
                if !visited[edge.target as usize] {
                    visited[edge.target as usize] = true;
                    parent.insert(edge.target, node);
                    stack.push(edge.target);
                }
            }
        }

        Ok(())
    }

    /// Task-id chain from `from` to `to` along recorded DFS parents.
    fn reconstruct_path(
        &self,
        parent: &FxHashMap<TaskId, TaskId>,
        from: TaskId,
        to: TaskId,
    ) -> Vec<String> {
        let mut chain = vec![to];
        let mut cursor = to;
        while cursor != from {
            match parent.get(&cursor) {
                Some(&p) => {
                    chain.push(p);
                    cursor = p;
                }
                None => break,
            }
        }
        chain.reverse();
        chain
            .into_iter()
            .map(|id| self.index.resolve(id).to_string())
            .collect()
    }

    /// Whole-graph acyclicity check via Kahn's algorithm.
    ///
    /// Nodes left after all zero-in-degree removals sit on (or downstream of)
    /// a cycle; they are reported sorted by task id.
    pub fn validate_acyclic(&self) -> Result<(), EngineError> {
        self.topological_order(&CancellationToken::new()).map(|_| ())
    }

    /// Deterministic topological order: Kahn's algorithm with a min-heap
    /// ready set, so tasks with no mutual constraint come out in task-id
    /// order. Detects cycles itself rather than truncating output, and
    /// checks `cancel` at each step.
    pub fn topological_order(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<TaskId>, EngineError> {
        let n = self.len();
        let mut in_degree: Vec<usize> = vec![0; n];
        for edges in &self.successors {
            for edge in edges {
                in_degree[edge.target as usize] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<TaskId>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg == 0)
            .map(|(id, _)| Reverse(id as TaskId))
            .collect();

        let mut order: Vec<TaskId> = Vec::with_capacity(n);
        while let Some(Reverse(id)) = ready.pop() {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            order.push(id);
            for edge in self.successors(id) {
                let deg = &mut in_degree[edge.target as usize];
                *deg -= 1;
                if *deg == 0 {
                    ready.push(Reverse(edge.target));
                }
            }
        }

        if order.len() != n {
            let mut trapped: Vec<String> = in_degree
                .iter()
                .enumerate()
                .filter(|(_, &deg)| deg > 0)
                .map(|(id, _)| self.index.resolve(id as TaskId).to_string())
                .collect();
            trapped.sort();
            return Err(EngineError::CycleDetected { task_ids: trapped });
        }

        Ok(order)
    }
}
