//! Exact re-packing of schedule windows.
//!
//! [`BranchBoundSolver`] implements [`vliw_sched::WindowSolver`] with a
//! branch-and-bound descent: starting just below the hint makespan, it
//! probes successively smaller targets until one is proven infeasible or
//! the budget runs out, and returns the best assignment found. Workers
//! split each probe's root domain; a node budget and the wall-clock
//! deadline bound every probe.

mod search;

use std::time::{Duration, Instant};

use vliw_sched::{WindowProblem, WindowSolution, WindowSolver};

use crate::search::{Search, SearchOutcome};

const DEFAULT_NODE_LIMIT: u64 = 20_000_000;

pub struct BranchBoundSolver {
    workers: usize,
    node_limit: u64,
}

impl BranchBoundSolver {
    pub fn new(workers: usize) -> Self {
        Self { workers: workers.max(1), node_limit: DEFAULT_NODE_LIMIT }
    }

    /// One worker per CPU, capped at eight.
    pub fn auto() -> Self {
        Self::new(num_cpus::get().clamp(1, 8))
    }

    /// Cap on search nodes per probe, on top of the wall-clock budget.
    pub fn with_node_limit(mut self, node_limit: u64) -> Self {
        self.node_limit = node_limit;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl WindowSolver for BranchBoundSolver {
    fn solve(&self, problem: &WindowProblem, budget: Duration) -> Option<WindowSolution> {
        let deadline = Instant::now() + budget;
        let hint = problem.hint_makespan();
        if hint <= 1 {
            return None;
        }
        let search = Search::new(problem);
        let floor = search.lower_bound();
        if floor >= hint {
            return None;
        }

        let mut best: Option<Vec<u32>> = None;
        let mut target = hint - 1;
        while target >= floor {
            match search.find(target, deadline, self.node_limit, self.workers) {
                SearchOutcome::Feasible(starts) => {
                    let makespan = starts.iter().map(|&s| s + 1).max().unwrap_or(0);
                    log::debug!("window repacked to {} cycles (target {})", makespan, target);
                    best = Some(starts);
                    if makespan <= floor {
                        break;
                    }
                    target = makespan - 1;
                }
                SearchOutcome::Infeasible => {
                    log::debug!("no assignment fits {} cycles; stopping", target);
                    break;
                }
                SearchOutcome::Aborted => {
                    log::debug!("window search out of budget at target {}", target);
                    break;
                }
            }
        }
        best.map(|starts| WindowSolution { starts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_picks_at_least_one_worker() {
        let solver = BranchBoundSolver::auto();
        assert!(solver.workers() >= 1);
        assert!(solver.workers() <= 8);
    }

    #[test]
    fn empty_window_is_declined() {
        let problem = WindowProblem {
            horizon: 0,
            ops: Vec::new(),
            edges: Vec::new(),
            widths: vliw_ir::IssueWidths::default(),
        };
        assert!(BranchBoundSolver::new(1).solve(&problem, Duration::from_secs(1)).is_none());
    }
}
