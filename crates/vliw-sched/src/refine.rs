//! Tail-window exact refinement.
//!
//! The heuristic schedule's trailing cycles are re-packed through an
//! abstract `WindowSolver`: a trailing window of the schedule becomes a
//! `WindowProblem` (unit-duration start variables bounded by a horizon,
//! precedence edges with minimum gaps, per-engine slot limits, the current
//! cycles as hints), and a solution is adopted only when it strictly lowers
//! the makespan. Solver failure of any kind just ends refinement; every
//! adopted state is a complete valid schedule.

use std::collections::HashMap;
use std::time::Duration;

use vliw_ir::{Engine, IssueWidths, MachineConfig};

use crate::config::RefineConfig;
use crate::hazards::HazardGraph;
use crate::stream::{OpId, OpRecord};

/// One op of a window problem.
#[derive(Clone, Copy, Debug)]
pub struct WindowOp {
    pub engine: Engine,
    /// Earliest permitted start, window-relative (from predecessors that
    /// stay outside the window).
    pub release: u32,
    /// Current cycle, window-relative. The hints always form a feasible
    /// assignment.
    pub hint: u32,
}

/// Precedence edge between window-local op indices; `from < to`.
#[derive(Clone, Copy, Debug)]
pub struct WindowEdge {
    pub from: usize,
    pub to: usize,
    pub min_gap: u32,
}

/// Re-packing problem handed to a `WindowSolver`.
#[derive(Clone, Debug)]
pub struct WindowProblem {
    /// Exclusive upper bound on start cycles.
    pub horizon: u32,
    pub ops: Vec<WindowOp>,
    pub edges: Vec<WindowEdge>,
    pub widths: IssueWidths,
}

impl WindowProblem {
    /// Makespan of the hint assignment.
    pub fn hint_makespan(&self) -> u32 {
        self.ops.iter().map(|op| op.hint + 1).max().unwrap_or(0)
    }

    /// Check a candidate assignment against every constraint of the
    /// problem: horizon, release bounds, engine widths, edge gaps.
    pub fn validate(&self, solution: &WindowSolution) -> bool {
        if solution.starts.len() != self.ops.len() {
            return false;
        }
        let mut used = vec![[0u32; Engine::COUNT]; self.horizon as usize];
        for (op, &start) in self.ops.iter().zip(&solution.starts) {
            if start >= self.horizon || start < op.release {
                return false;
            }
            let lane = &mut used[start as usize][op.engine.index()];
            *lane += 1;
            if *lane > self.widths.get(op.engine) {
                return false;
            }
        }
        self.edges
            .iter()
            .all(|e| solution.starts[e.to] >= solution.starts[e.from] + e.min_gap)
    }
}

/// New window-relative start cycles, indexed like `WindowProblem::ops`.
#[derive(Clone, Debug)]
pub struct WindowSolution {
    pub starts: Vec<u32>,
}

impl WindowSolution {
    pub fn makespan(&self) -> u32 {
        self.starts.iter().map(|&s| s + 1).max().unwrap_or(0)
    }
}

/// Best-effort exact-packing capability.
///
/// `solve` returns a feasible assignment strictly better than the hints,
/// or `None` when it cannot find one inside the budget. Absence of a
/// provider simply leaves the heuristic schedule as-is.
pub trait WindowSolver {
    fn solve(&self, problem: &WindowProblem, budget: Duration) -> Option<WindowSolution>;
}

pub(crate) fn refine_tail(
    ops: &[OpRecord],
    graph: &HazardGraph,
    op_cycles: &mut Vec<u32>,
    machine: &MachineConfig,
    config: &RefineConfig,
    solver: &dyn WindowSolver,
) {
    if op_cycles.is_empty() {
        return;
    }

    for round in 0..config.rounds {
        let makespan = op_cycles.iter().copied().max().map_or(0, |m| m + 1);
        if makespan <= 1 {
            break;
        }

        let start = makespan.saturating_sub(config.window_cycles);
        let (start, members) = shrink_window(op_cycles, start, makespan, config);
        if members.is_empty() {
            break;
        }
        let horizon = makespan - start;
        let problem = build_problem(ops, graph, op_cycles, machine, start, horizon, &members);
        log::debug!(
            "refine round {}: window [{}, {}), {} ops",
            round,
            start,
            makespan,
            members.len()
        );

        let Some(solution) = solver.solve(&problem, config.solve_budget) else {
            log::debug!("refine round {}: solver found nothing better", round);
            break;
        };
        if !problem.validate(&solution) {
            log::warn!("refine round {}: discarding invalid solver assignment", round);
            break;
        }

        let mut trial = op_cycles.clone();
        for (k, &op) in members.iter().enumerate() {
            trial[op] = start + solution.starts[k];
        }
        let new_makespan = trial.iter().copied().max().map_or(0, |m| m + 1);
        if new_makespan >= makespan {
            log::debug!(
                "refine round {}: {} -> {} cycles, keeping current schedule",
                round,
                makespan,
                new_makespan
            );
            break;
        }

        log::debug!("refine round {}: {} -> {} cycles", round, makespan, new_makespan);
        *op_cycles = trial;
    }
}

/// Move the window start later in fixed steps until its op count fits the
/// cap. If no suffix fits, run with the oversized initial window.
fn shrink_window(
    op_cycles: &[u32],
    start: u32,
    makespan: u32,
    config: &RefineConfig,
) -> (u32, Vec<OpId>) {
    let members_from =
        |s: u32| -> Vec<OpId> { (0..op_cycles.len()).filter(|&i| op_cycles[i] >= s).collect() };

    let step = (config.window_cycles / 8).max(8);
    let mut s = start;
    while s < makespan {
        let members = members_from(s);
        if members.len() <= config.max_window_ops {
            if s > start {
                log::debug!("shrunk refine window start {} -> {}", start, s);
            }
            return (s, members);
        }
        s += step;
    }
    (start, members_from(start))
}

fn build_problem(
    ops: &[OpRecord],
    graph: &HazardGraph,
    op_cycles: &[u32],
    machine: &MachineConfig,
    start: u32,
    horizon: u32,
    members: &[OpId],
) -> WindowProblem {
    let mut local: HashMap<OpId, usize> = HashMap::with_capacity(members.len());
    for (k, &op) in members.iter().enumerate() {
        local.insert(op, k);
    }

    let mut window_ops = Vec::with_capacity(members.len());
    let mut edges = Vec::new();
    for (k, &op) in members.iter().enumerate() {
        let mut release = 0u32;
        for &(pred, gap) in graph.preds(op) {
            if let Some(&pk) = local.get(&pred) {
                edges.push(WindowEdge { from: pk, to: k, min_gap: gap });
            } else {
                release = release.max((op_cycles[pred] + gap).saturating_sub(start));
            }
        }
        window_ops.push(WindowOp {
            engine: ops[op].engine,
            release,
            hint: op_cycles[op] - start,
        });
    }

    WindowProblem { horizon, ops: window_ops, edges, widths: machine.widths }
}
