//! Scheduled output: cycle-indexed bundles and the utilization report.

use std::fmt;

use serde::{Deserialize, Serialize};
use vliw_ir::{Engine, MachineConfig, SlotOp};

use crate::stream::{OpId, OpRecord};

/// One issue cycle: per-engine lanes of slot operations. Lane order within
/// an engine is emission order.
#[derive(Clone, Debug)]
pub struct Bundle {
    lanes: [Vec<SlotOp>; Engine::COUNT],
}

impl Default for Bundle {
    fn default() -> Self {
        Self { lanes: std::array::from_fn(|_| Vec::new()) }
    }
}

impl Bundle {
    pub fn ops(&self, engine: Engine) -> &[SlotOp] {
        &self.lanes[engine.index()]
    }

    pub fn op_count(&self) -> usize {
        self.lanes.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(Vec::is_empty)
    }

    pub(crate) fn push(&mut self, engine: Engine, slot: SlotOp) {
        self.lanes[engine.index()].push(slot);
    }
}

/// A fully placed program: one bundle per cycle, plus the cycle each
/// operation landed on.
#[derive(Clone, Debug)]
pub struct Schedule {
    bundles: Vec<Bundle>,
    op_cycles: Vec<u32>,
    machine: MachineConfig,
}

impl Schedule {
    pub(crate) fn from_cycles(
        ops: Vec<OpRecord>,
        op_cycles: Vec<u32>,
        machine: &MachineConfig,
    ) -> Self {
        debug_assert_eq!(ops.len(), op_cycles.len());
        let height = op_cycles.iter().copied().max().map_or(0, |m| m as usize + 1);
        let mut bundles = vec![Bundle::default(); height];
        for (record, &cycle) in ops.into_iter().zip(&op_cycles) {
            bundles[cycle as usize].push(record.engine, record.slot);
        }
        while bundles.last().is_some_and(Bundle::is_empty) {
            bundles.pop();
        }
        Self { bundles, op_cycles, machine: machine.clone() }
    }

    pub fn bundles(&self) -> &[Bundle] {
        &self.bundles
    }

    /// Total cycle count, end-of-program bundle included.
    pub fn makespan(&self) -> u32 {
        self.bundles.len() as u32
    }

    /// Cycle the given operation was placed on, `None` for an unknown id.
    pub fn cycle_of(&self, op: OpId) -> Option<u32> {
        self.op_cycles.get(op).copied()
    }

    pub fn op_count(&self) -> usize {
        self.bundles.iter().map(Bundle::op_count).sum()
    }

    pub fn machine(&self) -> &MachineConfig {
        &self.machine
    }

    /// Append a final bundle carrying a `Pause` on the flow lane. Pause has
    /// no scratch reads or writes, so it never goes through hazard
    /// placement; it terminates the program unconditionally.
    pub fn mark_end(&mut self) {
        let mut end = Bundle::default();
        end.push(Engine::Flow, SlotOp::Pause);
        self.bundles.push(end);
    }

    pub fn utilization(&self) -> UtilizationReport {
        let cycles = self.bundles.len() as u32;
        let engines = Engine::ALL
            .iter()
            .map(|&engine| {
                let width = self.machine.issue_width(engine);
                let mut histogram = vec![0u32; width as usize + 1];
                let mut busy_cycles = 0;
                let mut total_ops = 0;
                for bundle in &self.bundles {
                    let n = bundle.ops(engine).len();
                    if n >= histogram.len() {
                        histogram.resize(n + 1, 0);
                    }
                    histogram[n] += 1;
                    if n > 0 {
                        busy_cycles += 1;
                    }
                    total_ops += n;
                }
                EngineUsage {
                    engine,
                    width,
                    busy_cycles,
                    idle_cycles: cycles - busy_cycles,
                    total_ops,
                    histogram,
                }
            })
            .collect();
        UtilizationReport { cycles, engines }
    }
}

/// Per-engine slot occupancy over a whole schedule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineUsage {
    pub engine: Engine,
    pub width: u32,
    /// Cycles with at least one op on this engine.
    pub busy_cycles: u32,
    pub idle_cycles: u32,
    pub total_ops: usize,
    /// `histogram[k]` counts cycles issuing exactly `k` ops on this engine.
    pub histogram: Vec<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UtilizationReport {
    pub cycles: u32,
    pub engines: Vec<EngineUsage>,
}

impl fmt::Display for UtilizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let denom = self.cycles.max(1) as f64;
        writeln!(f, "Schedule utilization: {} cycles", self.cycles)?;
        for usage in &self.engines {
            writeln!(
                f,
                "  {:<5} busy {}/{} ({:.1}%)  ops {}  mean {:.2} of {}  hist {:?}",
                usage.engine,
                usage.busy_cycles,
                self.cycles,
                usage.busy_cycles as f64 / denom * 100.0,
                usage.total_ops,
                usage.total_ops as f64 / denom,
                usage.width,
                usage.histogram,
            )?;
        }
        Ok(())
    }
}
