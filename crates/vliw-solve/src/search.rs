//! Feasibility search behind the solver.
//!
//! One `Search` is built per window and probed at successive target
//! makespans. A probe computes earliest/latest start bounds from releases,
//! edge gaps and the target, then runs a depth-first assignment in index
//! order (edges always point forward, so predecessors are placed first)
//! with per-cycle engine counters. Probes are bounded by a node budget and
//! a wall-clock deadline.

use std::time::Instant;

use vliw_ir::Engine;
use vliw_sched::{WindowOp, WindowProblem};

pub(crate) enum SearchOutcome {
    /// Start cycles meeting the target.
    Feasible(Vec<u32>),
    /// No assignment meets the target.
    Infeasible,
    /// Budget ran out before the probe settled either way.
    Aborted,
}

pub(crate) struct Search<'a> {
    ops: &'a [WindowOp],
    widths: [u32; Engine::COUNT],
    preds: Vec<Vec<(usize, u32)>>,
    succs: Vec<Vec<(usize, u32)>>,
    /// Earliest start per op from releases and edges alone.
    est: Vec<u32>,
}

impl<'a> Search<'a> {
    pub fn new(problem: &'a WindowProblem) -> Self {
        let n = problem.ops.len();
        let mut preds = vec![Vec::new(); n];
        let mut succs = vec![Vec::new(); n];
        for edge in &problem.edges {
            preds[edge.to].push((edge.from, edge.min_gap));
            succs[edge.from].push((edge.to, edge.min_gap));
        }

        let mut est: Vec<u32> = problem.ops.iter().map(|op| op.release).collect();
        for i in 0..n {
            for &(succ, gap) in &succs[i] {
                est[succ] = est[succ].max(est[i] + gap);
            }
        }

        let widths = Engine::ALL.map(|e| problem.widths.get(e));
        Self { ops: &problem.ops, widths, preds, succs, est }
    }

    /// Provable floor on the window makespan: per-engine slot demand and
    /// the release- and gap-weighted critical path.
    pub fn lower_bound(&self) -> u32 {
        let mut counts = [0u32; Engine::COUNT];
        for op in self.ops {
            counts[op.engine.index()] += 1;
        }
        let mut bound = 0;
        for engine in Engine::ALL {
            let count = counts[engine.index()];
            if count == 0 {
                continue;
            }
            let width = self.widths[engine.index()];
            if width == 0 {
                return u32::MAX;
            }
            bound = bound.max(count.div_ceil(width));
        }
        for &e in &self.est {
            bound = bound.max(e + 1);
        }
        bound
    }

    /// Probe one target makespan. `workers > 1` splits the first op's
    /// start domain round-robin across scoped threads; shard results are
    /// joined in shard order.
    pub fn find(
        &self,
        target: u32,
        deadline: Instant,
        node_limit: u64,
        workers: usize,
    ) -> SearchOutcome {
        let n = self.ops.len();
        debug_assert!(n > 0 && target > 0);

        let mut lst = vec![target as i64 - 1; n];
        for i in (0..n).rev() {
            for &(succ, gap) in &self.succs[i] {
                lst[i] = lst[i].min(lst[succ] - gap as i64);
            }
        }
        if (0..n).any(|i| self.est[i] as i64 > lst[i]) {
            return SearchOutcome::Infeasible;
        }
        let lst: Vec<u32> = lst.into_iter().map(|v| v as u32).collect();

        let root: Vec<u32> = (self.est[0]..=lst[0]).collect();
        let workers = workers.max(1).min(root.len());
        if workers <= 1 {
            return self.run_shard(&root, &lst, target, deadline, node_limit);
        }

        std::thread::scope(|scope| {
            let lst = &lst;
            let handles: Vec<_> = (0..workers)
                .map(|w| {
                    let shard: Vec<u32> =
                        root.iter().skip(w).step_by(workers).copied().collect();
                    scope.spawn(move || self.run_shard(&shard, lst, target, deadline, node_limit))
                })
                .collect();

            let mut found = None;
            let mut aborted = false;
            for handle in handles {
                let outcome = match handle.join() {
                    Ok(outcome) => outcome,
                    Err(payload) => std::panic::resume_unwind(payload),
                };
                match outcome {
                    SearchOutcome::Feasible(starts) => {
                        if found.is_none() {
                            found = Some(starts);
                        }
                    }
                    SearchOutcome::Aborted => aborted = true,
                    SearchOutcome::Infeasible => {}
                }
            }
            match found {
                Some(starts) => SearchOutcome::Feasible(starts),
                None if aborted => SearchOutcome::Aborted,
                None => SearchOutcome::Infeasible,
            }
        })
    }

    fn run_shard(
        &self,
        root: &[u32],
        lst: &[u32],
        target: u32,
        deadline: Instant,
        node_limit: u64,
    ) -> SearchOutcome {
        let engine0 = self.ops[0].engine.index();
        if self.widths[engine0] == 0 {
            return SearchOutcome::Infeasible;
        }
        let mut dfs = Dfs {
            ops: self.ops,
            widths: &self.widths,
            preds: &self.preds,
            est: &self.est,
            lst,
            used: vec![[0u32; Engine::COUNT]; target as usize],
            starts: vec![0u32; self.ops.len()],
            nodes: 0,
            node_limit,
            deadline,
            aborted: false,
        };
        for &start in root {
            dfs.nodes += 1;
            dfs.used[start as usize][engine0] = 1;
            dfs.starts[0] = start;
            if dfs.assign(1) {
                return SearchOutcome::Feasible(dfs.starts);
            }
            dfs.used[start as usize][engine0] = 0;
            if dfs.aborted {
                return SearchOutcome::Aborted;
            }
        }
        SearchOutcome::Infeasible
    }
}

struct Dfs<'a> {
    ops: &'a [WindowOp],
    widths: &'a [u32; Engine::COUNT],
    preds: &'a [Vec<(usize, u32)>],
    est: &'a [u32],
    lst: &'a [u32],
    used: Vec<[u32; Engine::COUNT]>,
    starts: Vec<u32>,
    nodes: u64,
    node_limit: u64,
    deadline: Instant,
    aborted: bool,
}

impl Dfs<'_> {
    /// Place op `i` and recurse. Index order is topological, so every
    /// predecessor of `i` already has a start.
    fn assign(&mut self, i: usize) -> bool {
        if i == self.ops.len() {
            return true;
        }
        let engine = self.ops[i].engine.index();
        let lo = self.preds[i]
            .iter()
            .fold(self.est[i], |lo, &(p, gap)| lo.max(self.starts[p] + gap));
        for start in lo..=self.lst[i] {
            self.nodes += 1;
            // Budget checks are amortized over batches of nodes.
            if self.nodes & 0xFFF == 0
                && (self.nodes >= self.node_limit || Instant::now() >= self.deadline)
            {
                self.aborted = true;
                return false;
            }
            let lane = &mut self.used[start as usize][engine];
            if *lane >= self.widths[engine] {
                continue;
            }
            *lane += 1;
            self.starts[i] = start;
            if self.assign(i + 1) {
                return true;
            }
            self.used[start as usize][engine] -= 1;
            if self.aborted {
                return false;
            }
        }
        false
    }
}
