//! Critical-path priorities over the hazard graph.

use crate::hazards::HazardGraph;

/// Height of every op above the sinks: 0 for ops with no successors,
/// otherwise 1 + the max over direct successors. Emission order is
/// topological, so one backward pass suffices.
pub fn critical_path(graph: &HazardGraph) -> Vec<u32> {
    let n = graph.op_count();
    let mut height = vec![0u32; n];
    for v in (0..n).rev() {
        let mut best = 0;
        for &(s, _) in graph.succs(v) {
            best = best.max(height[s] + 1);
        }
        height[v] = best;
    }
    height
}

/// Gap-weighted longest path through the graph, plus one: no schedule of
/// these ops can finish in fewer cycles. Anti edges contribute zero, so
/// this is tighter than the op count of the longest chain.
pub fn critical_path_cycles(graph: &HazardGraph) -> u32 {
    let n = graph.op_count();
    if n == 0 {
        return 0;
    }
    let mut tail = vec![0u32; n];
    let mut longest = 0;
    for v in (0..n).rev() {
        let mut t = 0;
        for &(s, gap) in graph.succs(v) {
            t = t.max(tail[s] + gap);
        }
        tail[v] = t;
        longest = longest.max(t);
    }
    longest + 1
}
