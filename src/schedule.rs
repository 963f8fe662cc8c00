//! Auto-scheduler: concrete calendar dates from the forward pass.
//!
//! Raw assignment is Start = project start + ES, End = project start + EF
//! (one tick = one minute). A working calendar, or a root-task start anchor,
//! triggers an iterative fix-up: shifted tasks drag their successors through
//! the same constraint formulas until the schedule is quiescent.

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;

use crate::calendar::{ticks_to_duration, WorkingCalendar};
use crate::compute::CancellationToken;
use crate::error::EngineError;
use crate::forward_pass::forward_pass;
use crate::graph::DependencyGraph;
use crate::models::{Dependency, ScheduledTask, Task, Ticks};
use crate::{log_shift, log_trace};

/// Auto-scheduler knobs. `max_sweeps` defaults to task count + 1, the bound
/// within which a monotone fix-up must stabilize.
#[derive(Debug, Clone, Default)]
pub struct ScheduleConfig {
    /// 0 = silent, 1 = log schedule shifts, 2 = trace the fix-up loop.
    pub verbosity: u8,
    pub max_sweeps: Option<usize>,
}

/// Assign concrete Start/End dates to every task.
///
/// With no calendar and no applicable anchors, output is exactly
/// project start + ES/EF — subtracting the project start back out recovers
/// the forward-pass values. Tasks whose ES went negative under lead-time
/// lags start before the project start; the engine does not clamp them.
pub fn auto_schedule(
    tasks: &[Task],
    dependencies: &[Dependency],
    project_start: NaiveDateTime,
    calendar: Option<&dyn WorkingCalendar>,
) -> Result<FxHashMap<String, ScheduledTask>, EngineError> {
    auto_schedule_with_config(
        tasks,
        dependencies,
        project_start,
        calendar,
        &ScheduleConfig::default(),
    )
}

/// [`auto_schedule`] with explicit configuration.
pub fn auto_schedule_with_config(
    tasks: &[Task],
    dependencies: &[Dependency],
    project_start: NaiveDateTime,
    calendar: Option<&dyn WorkingCalendar>,
    config: &ScheduleConfig,
) -> Result<FxHashMap<String, ScheduledTask>, EngineError> {
    let graph = DependencyGraph::build(tasks, dependencies)?;
    let never = CancellationToken::new();
    let order = graph.topological_order(&never)?;
    let forward = forward_pass(&graph, &order, &never)?;

    let n = graph.len();
    let mut starts: Vec<Ticks> = forward.earliest_start.clone();
    let mut ends: Vec<Ticks> = forward.earliest_finish.clone();

    // Start anchors apply to root tasks only, and only when they land after
    // the project start; the CPM passes never see them.
    let mut anchors: Vec<Option<Ticks>> = vec![None; n];
    let mut any_anchor = false;
    for task in tasks {
        if let Some(anchor) = task.start {
            let idx = graph.index().get(&task.id).unwrap();
            if graph.predecessors(idx).is_empty() {
                let offset = (anchor - project_start).num_minutes();
                if offset > 0 {
                    anchors[idx as usize] = Some(offset);
                    any_anchor = true;
                    log_shift!(
                        config.verbosity,
                        "anchor: task {} lifted to +{offset}m",
                        task.id
                    );
                }
            }
        }
    }

    if calendar.is_some() || any_anchor {
        fix_up(
            &graph,
            &order,
            &anchors,
            calendar,
            project_start,
            config,
            &mut starts,
            &mut ends,
        )?;
    }

    let mut result = FxHashMap::default();
    for idx in 0..n {
        let task_id = graph.index().resolve(idx as crate::graph::TaskId).to_string();
        result.insert(
            task_id.clone(),
            ScheduledTask {
                task_id,
                start: project_start + ticks_to_duration(starts[idx]),
                end: project_start + ticks_to_duration(ends[idx]),
            },
        );
    }
    Ok(result)
}

/// Iterative fix-up: sweep in topological order, recomputing each task's
/// earliest start from its predecessors' adjusted times, shifting
/// non-working starts and ends forward. Shifts only ever move forward, so a
/// stable calendar converges within one sweep per dependency level; the
/// bound is task count + 1, beyond which the calendar itself is divergent.
#[allow(clippy::too_many_arguments)]
fn fix_up(
    graph: &DependencyGraph,
    order: &[crate::graph::TaskId],
    anchors: &[Option<Ticks>],
    calendar: Option<&dyn WorkingCalendar>,
    project_start: NaiveDateTime,
    config: &ScheduleConfig,
    starts: &mut [Ticks],
    ends: &mut [Ticks],
) -> Result<(), EngineError> {
    let to_working = |ticks: Ticks| -> Ticks {
        match calendar {
            Some(cal) => {
                let instant = project_start + ticks_to_duration(ticks);
                if cal.is_working_instant(instant) {
                    ticks
                } else {
                    (cal.next_working_instant(instant) - project_start).num_minutes()
                }
            }
            None => ticks,
        }
    };

    let max_sweeps = config.max_sweeps.unwrap_or(graph.len() + 1);
    for sweep in 0..max_sweeps {
        let mut changed = false;

        for &id in order {
            let idx = id as usize;
            let duration = graph.duration(id);
            let preds = graph.predecessors(id);

            let bound = if preds.is_empty() {
                anchors[idx].unwrap_or(0).max(0)
            } else {
                preds
                    .iter()
                    .map(|edge| {
                        edge.kind.earliest_start_bound(
                            starts[edge.target as usize],
                            ends[edge.target as usize],
                            edge.lag,
                            duration,
                        )
                    })
                    .max()
                    .unwrap()
            };

            let start = to_working(bound);
            let end = to_working(start + duration);

            if start != starts[idx] || end != ends[idx] {
                log_shift!(
                    config.verbosity,
                    "shift: task {} -> [{start}m, {end}m]",
                    graph.index().resolve(id)
                );
                starts[idx] = start;
                ends[idx] = end;
                changed = true;
            }
        }

        log_trace!(config.verbosity, "fix-up sweep {sweep}: changed={changed}");
        if !changed {
            return Ok(());
        }
    }

    Err(EngineError::NotConverged { sweeps: max_sweeps })
}
