//! Scheduling pipeline entry point.
//!
//! `Scheduler::schedule` runs the full pipeline: hazard graph construction,
//! critical-path list scheduling, randomized priority-noise trials, and
//! optional exact refinement of the trailing window. Every stage is
//! deterministic for a given `SchedulerConfig`, including the threaded
//! trial fanout: each trial draws from its own seed-derived noise stream
//! and ties are broken by trial index, so worker assignment never shows up
//! in the output.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vliw_ir::MachineConfig;

use crate::asap::asap_schedule;
use crate::config::SchedulerConfig;
use crate::hazards::HazardGraph;
use crate::list::{list_schedule, ListOutcome};
use crate::priority;
use crate::refine::{refine_tail, WindowSolver};
use crate::schedule::Schedule;
use crate::stream::{OpRecord, OpStream};

/// Priority keys put the critical-path height above this many noise bits,
/// so noise reorders ops within a height level but never across levels.
const PRIORITY_SHIFT: u32 = 10;
const NOISE_SPAN: u64 = 512;

pub struct Scheduler {
    machine: MachineConfig,
    config: SchedulerConfig,
    solver: Option<Box<dyn WindowSolver>>,
}

impl Scheduler {
    pub fn new(machine: MachineConfig) -> Self {
        Self::with_config(machine, SchedulerConfig::default())
    }

    pub fn with_config(machine: MachineConfig, config: SchedulerConfig) -> Self {
        Self { machine, config, solver: None }
    }

    /// Install an exact solver for tail-window refinement. Without one the
    /// pipeline stops after the randomized trials.
    pub fn with_solver(mut self, solver: Box<dyn WindowSolver>) -> Self {
        self.solver = Some(solver);
        self
    }

    pub fn machine(&self) -> &MachineConfig {
        &self.machine
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Schedule a stream for minimal makespan.
    pub fn schedule(&self, stream: OpStream) -> Schedule {
        let ops = stream.into_ops();
        if ops.is_empty() {
            return Schedule::from_cycles(ops, Vec::new(), &self.machine);
        }

        let graph = HazardGraph::build(&ops);
        let heights = priority::critical_path(&graph);
        let outcome = self.run_trials(&ops, &graph, &heights);
        log::debug!(
            "scheduled {} ops over {} cycles (critical path {})",
            ops.len(),
            outcome.makespan,
            priority::critical_path_cycles(&graph)
        );

        let mut cycles = outcome.op_cycles;
        if let Some(solver) = &self.solver {
            refine_tail(&ops, &graph, &mut cycles, &self.machine, &self.config.refine, solver.as_ref());
        }
        Schedule::from_cycles(ops, cycles, &self.machine)
    }

    /// Schedule a stream in emission order, placing each op at the first
    /// hazard-legal cycle with a free slot. Cheap, and the baseline the
    /// optimizing pipeline is measured against.
    pub fn schedule_asap(&self, stream: OpStream) -> Schedule {
        let ops = stream.into_ops();
        let cycles = asap_schedule(&ops, &self.machine);
        Schedule::from_cycles(ops, cycles, &self.machine)
    }

    /// Noiseless baseline plus `trials - 1` noise trials; the result is the
    /// earliest trial with the smallest makespan, or the baseline when no
    /// trial beats it.
    fn run_trials(&self, ops: &[OpRecord], graph: &HazardGraph, heights: &[u32]) -> ListOutcome {
        let base: Vec<u64> =
            heights.iter().map(|&h| (h as u64) << PRIORITY_SHIFT).collect();
        let baseline = list_schedule(ops, graph, &base, &self.machine);
        if self.config.trials <= 1 {
            return baseline;
        }

        let trials = self.config.trials;
        let seed = self.config.seed;
        let machine = &self.machine;

        // (makespan, trial, outcome), minimized lexicographically.
        let run_stride = |first: u32, stride: u32| -> Option<(u32, u32, ListOutcome)> {
            let mut best: Option<(u32, u32, ListOutcome)> = None;
            let mut t = first;
            while t < trials {
                let keys = noisy_keys(&base, seed, t);
                let outcome = list_schedule(ops, graph, &keys, machine);
                if best.as_ref().is_none_or(|(m, _, _)| outcome.makespan < *m) {
                    best = Some((outcome.makespan, t, outcome));
                }
                t += stride;
            }
            best
        };

        let workers = self.config.threads.max(1).min(trials as usize - 1);
        let best = if workers == 1 {
            run_stride(1, 1)
        } else {
            std::thread::scope(|scope| {
                let handles: Vec<_> = (0..workers as u32)
                    .map(|w| {
                        let run_stride = &run_stride;
                        scope.spawn(move || run_stride(w + 1, workers as u32))
                    })
                    .collect();
                let mut best: Option<(u32, u32, ListOutcome)> = None;
                for handle in handles {
                    let local = match handle.join() {
                        Ok(local) => local,
                        Err(payload) => std::panic::resume_unwind(payload),
                    };
                    if let Some((m, t, outcome)) = local {
                        if best.as_ref().is_none_or(|(bm, bt, _)| (m, t) < (*bm, *bt)) {
                            best = Some((m, t, outcome));
                        }
                    }
                }
                best
            })
        };

        match best {
            Some((m, t, outcome)) if m < baseline.makespan => {
                log::debug!("trial {} improved makespan {} -> {}", t, baseline.makespan, m);
                outcome
            }
            _ => baseline,
        }
    }
}

/// Base keys plus per-op noise below one height level, drawn from the
/// trial's own stream.
fn noisy_keys(base: &[u64], seed: u64, trial: u32) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(trial_seed(seed, trial));
    base.iter().map(|&k| k + rng.gen_range(0..NOISE_SPAN)).collect()
}

/// splitmix64-style mix of the seed/trial pair. Streams depend only on
/// (seed, trial), never on which worker runs the trial.
fn trial_seed(seed: u64, trial: u32) -> u64 {
    let mut z = seed ^ (trial as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
