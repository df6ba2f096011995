use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reg::Addr;

/// Execution engine classes of the target machine. Every slot payload
/// dispatches to exactly one class, and a bundle holds at most
/// `MachineConfig::issue_width(engine)` payloads per class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Load,
    Store,
    Alu,
    Valu,
    Flow,
}

impl Engine {
    pub const COUNT: usize = 5;
    pub const ALL: [Engine; Engine::COUNT] =
        [Engine::Load, Engine::Store, Engine::Alu, Engine::Valu, Engine::Flow];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Engine::Load => "load",
            Engine::Store => "store",
            Engine::Alu => "alu",
            Engine::Valu => "valu",
            Engine::Flow => "flow",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Two-source opcodes shared by the scalar and vector compute engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    CmpLt,
    CmpEq,
}

impl BinOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div",
            BinOp::Mod => "mod",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
            BinOp::Shl => "shl",
            BinOp::Shr => "shr",
            BinOp::CmpLt => "cmplt",
            BinOp::CmpEq => "cmpeq",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One slot payload: an opcode plus its scratch-address operands.
///
/// Operand fields carry the base address of the register; vector operands
/// cover `vlen` consecutive words starting there. The payload is opaque to
/// the scheduler, which orders ops purely by their declared address sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotOp {
    // Scalar memory
    Const { dst: Addr, imm: u32 },
    Load { dst: Addr, addr: Addr },
    Store { addr: Addr, src: Addr },

    // Vector memory
    VLoad { dst: Addr, addr: Addr },
    VStore { addr: Addr, src: Addr },

    // Compute
    Alu { op: BinOp, dst: Addr, lhs: Addr, rhs: Addr },
    VAlu { op: BinOp, dst: Addr, lhs: Addr, rhs: Addr },
    VMulAdd { dst: Addr, a: Addr, b: Addr, c: Addr },
    VBroadcast { dst: Addr, src: Addr },

    // Control
    VSelect { dst: Addr, cond: Addr, on_true: Addr, on_false: Addr },
    Pause,
}

impl SlotOp {
    /// Engine class this payload issues on.
    pub fn engine(&self) -> Engine {
        match self {
            SlotOp::Const { .. } | SlotOp::Load { .. } | SlotOp::VLoad { .. } => Engine::Load,
            SlotOp::Store { .. } | SlotOp::VStore { .. } => Engine::Store,
            SlotOp::Alu { .. } => Engine::Alu,
            SlotOp::VAlu { .. } | SlotOp::VMulAdd { .. } | SlotOp::VBroadcast { .. } => {
                Engine::Valu
            }
            SlotOp::VSelect { .. } | SlotOp::Pause => Engine::Flow,
        }
    }
}
