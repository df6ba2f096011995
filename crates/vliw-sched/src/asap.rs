//! Eager placement in emission order.
//!
//! Each op lands at the earliest cycle allowed by per-address last-write /
//! last-read tracking (same gap rule as the hazard graph: one full cycle
//! after the last writer, same cycle as the last reader) scanning forward
//! for a free slot on its engine. No lookahead, no reordering.

use std::collections::HashMap;

use vliw_ir::{Addr, Engine, MachineConfig};

use crate::stream::OpRecord;

pub(crate) fn asap_schedule(ops: &[OpRecord], machine: &MachineConfig) -> Vec<u32> {
    let mut last_write: HashMap<Addr, u32> = HashMap::new();
    let mut last_read: HashMap<Addr, u32> = HashMap::new();
    let mut used: Vec<[u32; Engine::COUNT]> = Vec::new();
    let mut op_cycles = vec![0u32; ops.len()];

    for (idx, op) in ops.iter().enumerate() {
        let mut start = 0u32;
        for addr in &op.reads {
            if let Some(&w) = last_write.get(addr) {
                start = start.max(w + 1);
            }
        }
        for addr in &op.writes {
            if let Some(&w) = last_write.get(addr) {
                start = start.max(w + 1);
            }
            if let Some(&r) = last_read.get(addr) {
                start = start.max(r);
            }
        }

        let width = machine.issue_width(op.engine);
        assert!(width > 0, "engine {} has zero issue width", op.engine);
        let lane = op.engine.index();
        let mut cycle = start as usize;
        loop {
            while cycle >= used.len() {
                used.push([0; Engine::COUNT]);
            }
            if used[cycle][lane] < width {
                used[cycle][lane] += 1;
                break;
            }
            cycle += 1;
        }
        let cycle = cycle as u32;
        op_cycles[idx] = cycle;

        for addr in &op.writes {
            last_write.insert(*addr, cycle);
        }
        for addr in &op.reads {
            last_read
                .entry(*addr)
                .and_modify(|c| *c = (*c).max(cycle))
                .or_insert(cycle);
        }
    }

    op_cycles
}
