//! Operation stream and emission API.
//!
//! Emission is deferred: every method records one operation together with
//! its exact read and write address sets and returns immediately. Nothing
//! is placed into bundles until the stream is handed to a `Scheduler`.

use vliw_ir::{Addr, BinOp, Engine, RegRef, ScalarReg, SlotOp, VectorReg};

/// Emission index of an operation, assigned in record order.
pub type OpId = usize;

/// One recorded operation. The payload is opaque to the scheduler; only
/// the engine tag and the address sets drive placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpRecord {
    pub engine: Engine,
    pub slot: SlotOp,
    /// Word addresses read, sorted and deduplicated.
    pub reads: Vec<Addr>,
    /// Word addresses written, sorted and deduplicated.
    pub writes: Vec<Addr>,
}

/// Append-only stream of operations in emission order.
#[derive(Clone, Debug, Default)]
pub struct OpStream {
    ops: Vec<OpRecord>,
}

impl OpStream {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[OpRecord] {
        &self.ops
    }

    pub(crate) fn into_ops(self) -> Vec<OpRecord> {
        self.ops
    }

    /// The emission primitive: record one operation with explicit address
    /// sets. The typed helpers below all funnel through here.
    pub fn record(
        &mut self,
        engine: Engine,
        slot: SlotOp,
        reads: &[RegRef],
        writes: &[RegRef],
    ) -> OpId {
        self.ops.push(OpRecord {
            engine,
            slot,
            reads: expand_addrs(reads),
            writes: expand_addrs(writes),
        });
        self.ops.len() - 1
    }

    /// Load an immediate into a scalar register.
    pub fn constant(&mut self, dst: ScalarReg, imm: u32) -> OpId {
        self.record(
            Engine::Load,
            SlotOp::Const { dst: dst.addr(), imm },
            &[],
            &[dst.into()],
        )
    }

    /// Scalar load from the memory word named by `addr`.
    pub fn load(&mut self, dst: ScalarReg, addr: ScalarReg) -> OpId {
        self.record(
            Engine::Load,
            SlotOp::Load { dst: dst.addr(), addr: addr.addr() },
            &[addr.into()],
            &[dst.into()],
        )
    }

    /// Vector load starting at the memory word named by `addr`.
    pub fn vload(&mut self, dst: VectorReg, addr: ScalarReg) -> OpId {
        self.record(
            Engine::Load,
            SlotOp::VLoad { dst: dst.addr(), addr: addr.addr() },
            &[addr.into()],
            &[dst.into()],
        )
    }

    /// Scalar store. Reads both operands and writes no scratch word:
    /// memory itself is outside hazard tracking.
    pub fn store(&mut self, addr: ScalarReg, src: ScalarReg) -> OpId {
        self.record(
            Engine::Store,
            SlotOp::Store { addr: addr.addr(), src: src.addr() },
            &[addr.into(), src.into()],
            &[],
        )
    }

    /// Vector store; like `store`, writes no scratch word.
    pub fn vstore(&mut self, addr: ScalarReg, src: VectorReg) -> OpId {
        self.record(
            Engine::Store,
            SlotOp::VStore { addr: addr.addr(), src: src.addr() },
            &[addr.into(), src.into()],
            &[],
        )
    }

    pub fn alu(&mut self, op: BinOp, dst: ScalarReg, lhs: ScalarReg, rhs: ScalarReg) -> OpId {
        self.record(
            Engine::Alu,
            SlotOp::Alu { op, dst: dst.addr(), lhs: lhs.addr(), rhs: rhs.addr() },
            &[lhs.into(), rhs.into()],
            &[dst.into()],
        )
    }

    pub fn valu(&mut self, op: BinOp, dst: VectorReg, lhs: VectorReg, rhs: VectorReg) -> OpId {
        self.record(
            Engine::Valu,
            SlotOp::VAlu { op, dst: dst.addr(), lhs: lhs.addr(), rhs: rhs.addr() },
            &[lhs.into(), rhs.into()],
            &[dst.into()],
        )
    }

    /// Fused `dst = a * b + c` on the vector engine.
    pub fn vmul_add(&mut self, dst: VectorReg, a: VectorReg, b: VectorReg, c: VectorReg) -> OpId {
        self.record(
            Engine::Valu,
            SlotOp::VMulAdd { dst: dst.addr(), a: a.addr(), b: b.addr(), c: c.addr() },
            &[a.into(), b.into(), c.into()],
            &[dst.into()],
        )
    }

    /// Replicate a scalar across every lane of `dst`.
    pub fn vbroadcast(&mut self, dst: VectorReg, src: ScalarReg) -> OpId {
        self.record(
            Engine::Valu,
            SlotOp::VBroadcast { dst: dst.addr(), src: src.addr() },
            &[src.into()],
            &[dst.into()],
        )
    }

    /// Lane-wise select; issues on the flow engine.
    pub fn vselect(
        &mut self,
        dst: VectorReg,
        cond: VectorReg,
        on_true: VectorReg,
        on_false: VectorReg,
    ) -> OpId {
        self.record(
            Engine::Flow,
            SlotOp::VSelect {
                dst: dst.addr(),
                cond: cond.addr(),
                on_true: on_true.addr(),
                on_false: on_false.addr(),
            },
            &[cond.into(), on_true.into(), on_false.into()],
            &[dst.into()],
        )
    }
}

fn expand_addrs(regs: &[RegRef]) -> Vec<Addr> {
    let mut addrs: Vec<Addr> = Vec::with_capacity(regs.iter().map(|r| r.len() as usize).sum());
    for reg in regs {
        addrs.extend(reg.addrs());
    }
    addrs.sort_unstable();
    addrs.dedup();
    addrs
}
