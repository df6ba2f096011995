//! Target model for a word-addressed VLIW machine.
//!
//! Defines the execution engine classes, slot payloads, register handles
//! over scratch memory, the machine description (issue widths, vector
//! length, scratch capacity) and the bump allocator that hands out
//! non-overlapping register address runs.

pub mod machine;
pub mod op;
pub mod reg;
pub mod scratch;

pub use machine::{IssueWidths, MachineConfig};
pub use op::{BinOp, Engine, SlotOp};
pub use reg::{Addr, RegRef, ScalarReg, VectorReg};
pub use scratch::{ScratchAllocator, ScratchEntry, ScratchError};
