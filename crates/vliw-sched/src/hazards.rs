//! Hazard graph construction.
//!
//! One forward scan over the emission stream derives every ordering edge
//! at word granularity. Per address we track the last writer and the
//! readers seen since that writer:
//!
//! - a read depends on the last writer of the address (min gap 1);
//! - a write depends on the last writer (min gap 1) and on every tracked
//!   reader (min gap 0: a write may share a cycle with an earlier read of
//!   the same address, never the other way around).
//!
//! A write resets the tracked readers for its address; an op's own reads
//! are recorded after its writes. Edges always point from a lower emission
//! index to a higher one, and duplicate (pred, succ) pairs keep the larger
//! gap.

use std::collections::HashMap;

use vliw_ir::Addr;

use crate::stream::{OpId, OpRecord};

/// Dependency DAG over a stream, with a minimum cycle gap per edge.
#[derive(Clone, Debug)]
pub struct HazardGraph {
    preds: Vec<Vec<(OpId, u32)>>,
    succs: Vec<Vec<(OpId, u32)>>,
    edges: usize,
}

impl HazardGraph {
    pub fn build(ops: &[OpRecord]) -> Self {
        let n = ops.len();
        let mut last_writer: HashMap<Addr, OpId> = HashMap::new();
        let mut readers: HashMap<Addr, Vec<OpId>> = HashMap::new();

        let mut preds: Vec<Vec<(OpId, u32)>> = vec![Vec::new(); n];
        let mut gather: HashMap<OpId, u32> = HashMap::new();

        for (idx, op) in ops.iter().enumerate() {
            gather.clear();
            for addr in &op.reads {
                if let Some(&writer) = last_writer.get(addr) {
                    merge_max(&mut gather, writer, 1);
                }
            }
            for addr in &op.writes {
                if let Some(&writer) = last_writer.get(addr) {
                    merge_max(&mut gather, writer, 1);
                }
                if let Some(since) = readers.get(addr) {
                    for &reader in since {
                        merge_max(&mut gather, reader, 0);
                    }
                }
            }

            for addr in &op.writes {
                last_writer.insert(*addr, idx);
                readers.remove(addr);
            }
            for addr in &op.reads {
                readers.entry(*addr).or_default().push(idx);
            }

            let mut incoming: Vec<(OpId, u32)> = gather.iter().map(|(&p, &g)| (p, g)).collect();
            incoming.sort_unstable();
            preds[idx] = incoming;
        }

        let mut succs: Vec<Vec<(OpId, u32)>> = vec![Vec::new(); n];
        let mut edges = 0;
        for (v, incoming) in preds.iter().enumerate() {
            for &(u, gap) in incoming {
                succs[u].push((v, gap));
                edges += 1;
            }
        }

        log::debug!("hazard graph: {} ops, {} edges", n, edges);
        Self { preds, succs, edges }
    }

    pub fn op_count(&self) -> usize {
        self.preds.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges
    }

    /// Incoming edges of `op` as `(pred, min_gap)`, sorted by pred.
    pub fn preds(&self, op: OpId) -> &[(OpId, u32)] {
        &self.preds[op]
    }

    /// Outgoing edges of `op` as `(succ, min_gap)`, sorted by succ.
    pub fn succs(&self, op: OpId) -> &[(OpId, u32)] {
        &self.succs[op]
    }
}

fn merge_max(gather: &mut HashMap<OpId, u32>, pred: OpId, gap: u32) {
    gather
        .entry(pred)
        .and_modify(|g| *g = (*g).max(gap))
        .or_insert(gap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::OpStream;
    use vliw_ir::{BinOp, MachineConfig, ScratchAllocator};

    fn setup() -> (ScratchAllocator, OpStream) {
        (ScratchAllocator::new(&MachineConfig::default()), OpStream::new())
    }

    #[test]
    fn read_after_write_requires_full_gap() {
        let (mut scratch, mut stream) = setup();
        let a = scratch.alloc_scalar("a").unwrap();
        let b = scratch.alloc_scalar("b").unwrap();

        stream.constant(a, 1);
        stream.alu(BinOp::Add, b, a, a);

        let graph = HazardGraph::build(stream.ops());
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.preds(1), &[(0, 1)]);
        assert_eq!(graph.succs(0), &[(1, 1)]);
    }

    #[test]
    fn write_after_write_requires_full_gap() {
        let (mut scratch, mut stream) = setup();
        let a = scratch.alloc_scalar("a").unwrap();

        stream.constant(a, 1);
        stream.constant(a, 2);

        let graph = HazardGraph::build(stream.ops());
        assert_eq!(graph.preds(1), &[(0, 1)]);
    }

    #[test]
    fn write_after_read_allows_shared_cycle() {
        let (mut scratch, mut stream) = setup();
        let a = scratch.alloc_scalar("a").unwrap();
        let b = scratch.alloc_scalar("b").unwrap();
        let c = scratch.alloc_scalar("c").unwrap();

        stream.alu(BinOp::Add, b, a, a); // reads a
        stream.alu(BinOp::Add, a, c, c); // overwrites a

        let graph = HazardGraph::build(stream.ops());
        assert_eq!(graph.preds(1), &[(0, 0)]);
    }

    #[test]
    fn write_clears_tracked_readers() {
        let (mut scratch, mut stream) = setup();
        let a = scratch.alloc_scalar("a").unwrap();
        let b = scratch.alloc_scalar("b").unwrap();

        stream.alu(BinOp::Add, b, a, a); // 0: reads a
        stream.constant(a, 1); //            1: writes a, clears readers
        stream.constant(a, 2); //            2: writes a again

        let graph = HazardGraph::build(stream.ops());
        // Op 2 orders against the intervening writer only, not the stale
        // reader from before it.
        assert_eq!(graph.preds(2), &[(1, 1)]);
    }

    #[test]
    fn duplicate_edges_keep_the_larger_gap() {
        let (mut scratch, mut stream) = setup();
        let a = scratch.alloc_scalar("a").unwrap();
        let b = scratch.alloc_scalar("b").unwrap();

        // Op 0 writes a and reads b; op 1 reads a (gap 1) and writes b
        // (gap 0 against op 0's read). The merged edge must keep gap 1.
        stream.alu(BinOp::Add, a, b, b);
        stream.alu(BinOp::Add, b, a, a);

        let graph = HazardGraph::build(stream.ops());
        assert_eq!(graph.preds(1), &[(0, 1)]);
    }

    #[test]
    fn op_reading_and_writing_same_address_gets_no_self_edge() {
        let (mut scratch, mut stream) = setup();
        let a = scratch.alloc_scalar("a").unwrap();

        stream.constant(a, 1);
        stream.alu(BinOp::Add, a, a, a); // a += a

        let graph = HazardGraph::build(stream.ops());
        assert_eq!(graph.preds(1), &[(0, 1)]);
        assert!(graph.succs(1).is_empty());
    }

    #[test]
    fn accumulator_chain_after_self_update() {
        let (mut scratch, mut stream) = setup();
        let a = scratch.alloc_scalar("a").unwrap();
        let b = scratch.alloc_scalar("b").unwrap();

        stream.constant(a, 1); //            0
        stream.alu(BinOp::Add, a, a, a); //  1: reads and writes a
        stream.alu(BinOp::Add, b, a, a); //  2: reads a
        stream.constant(a, 9); //            3: overwrites a

        let graph = HazardGraph::build(stream.ops());
        assert_eq!(graph.preds(2), &[(1, 1)]);
        // The overwrite orders after the self-update (gap 1, as writer) and
        // after the later reader (gap 0).
        assert_eq!(graph.preds(3), &[(1, 1), (2, 0)]);
    }

    #[test]
    fn independent_streams_share_no_edges() {
        let (mut scratch, mut stream) = setup();
        let a = scratch.alloc_scalar("a").unwrap();
        let b = scratch.alloc_scalar("b").unwrap();

        stream.constant(a, 1);
        stream.constant(b, 2);

        let graph = HazardGraph::build(stream.ops());
        assert_eq!(graph.edge_count(), 0);
    }
}
