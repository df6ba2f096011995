//! Resource-constrained list scheduler.
//!
//! Ready ops are gated by unplaced-predecessor counts plus a per-op release
//! cycle derived from placed predecessors and edge gaps. Each cycle scans
//! the ready set in (priority desc, emission asc) order; ops released with
//! gap 0 inside the current cycle cascade into the same bundle while their
//! engine still has slots.

use vliw_ir::MachineConfig;

use crate::hazards::HazardGraph;
use crate::stream::{OpId, OpRecord};

pub(crate) struct ListOutcome {
    pub op_cycles: Vec<u32>,
    pub makespan: u32,
}

pub(crate) fn list_schedule(
    ops: &[OpRecord],
    graph: &HazardGraph,
    keys: &[u64],
    machine: &MachineConfig,
) -> ListOutcome {
    let n = ops.len();
    debug_assert_eq!(graph.op_count(), n);
    debug_assert_eq!(keys.len(), n);

    let by_priority = |a: &OpId, b: &OpId| keys[*b].cmp(&keys[*a]).then(a.cmp(b));

    let mut pending: Vec<u32> = (0..n).map(|v| graph.preds(v).len() as u32).collect();
    let mut release = vec![0u32; n];
    let mut op_cycles = vec![0u32; n];

    let mut ready: Vec<OpId> = (0..n).filter(|&v| pending[v] == 0).collect();
    ready.sort_unstable_by(by_priority);

    let mut used = [0u32; vliw_ir::Engine::COUNT];
    let mut placed = 0usize;
    let mut cycle = 0u32;

    while placed < n {
        used.fill(0);
        let mut carry: Vec<OpId> = Vec::new(); // engine full this cycle
        let mut future: Vec<OpId> = Vec::new(); // released past this cycle
        let mut progress = false;

        let mut batch = std::mem::take(&mut ready);
        while !batch.is_empty() {
            let mut cascade: Vec<OpId> = Vec::new();
            for &v in &batch {
                debug_assert!(release[v] <= cycle);
                let engine = ops[v].engine;
                if used[engine.index()] < machine.issue_width(engine) {
                    used[engine.index()] += 1;
                    op_cycles[v] = cycle;
                    placed += 1;
                    progress = true;
                    for &(s, gap) in graph.succs(v) {
                        let at = cycle + gap;
                        if at > release[s] {
                            release[s] = at;
                        }
                        pending[s] -= 1;
                        if pending[s] == 0 {
                            if release[s] <= cycle {
                                cascade.push(s);
                            } else {
                                future.push(s);
                            }
                        }
                    }
                } else {
                    carry.push(v);
                }
            }
            cascade.sort_unstable_by(by_priority);
            batch = cascade;
        }

        assert!(progress, "no op placed in cycle {cycle}; scheduler stalled");

        carry.extend(future);
        carry.sort_unstable_by(by_priority);
        ready = carry;
        cycle += 1;
    }

    ListOutcome { op_cycles, makespan: cycle }
}
