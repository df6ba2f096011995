//! Bump allocator over scratch memory.
//!
//! Registers are never freed: allocation is a monotone pointer bump with a
//! hard capacity check. Each allocation records a name so hosts can dump a
//! scratch map when debugging kernels.

use thiserror::Error;

use crate::machine::MachineConfig;
use crate::reg::{Addr, ScalarReg, VectorReg};

/// Errors raised by the scratch allocator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScratchError {
    #[error("scratch capacity exhausted allocating '{name}': need {requested} words, {used}/{capacity} in use")]
    Exhausted { name: String, requested: u32, used: u32, capacity: u32 },
}

/// One named allocation, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScratchEntry {
    pub name: String,
    pub base: Addr,
    pub len: u32,
}

/// Bump allocator handing out non-overlapping register address runs.
#[derive(Clone, Debug)]
pub struct ScratchAllocator {
    capacity: u32,
    vlen: u32,
    next: Addr,
    entries: Vec<ScratchEntry>,
}

impl ScratchAllocator {
    pub fn new(machine: &MachineConfig) -> Self {
        Self {
            capacity: machine.scratch_words,
            vlen: machine.vlen,
            next: 0,
            entries: Vec::new(),
        }
    }

    /// Allocate one word.
    pub fn alloc_scalar(&mut self, name: &str) -> Result<ScalarReg, ScratchError> {
        let base = self.alloc_run(name, 1)?;
        Ok(ScalarReg::new(base))
    }

    /// Allocate a `vlen`-word vector register.
    pub fn alloc_vector(&mut self, name: &str) -> Result<VectorReg, ScratchError> {
        let len = self.vlen;
        let base = self.alloc_run(name, len)?;
        Ok(VectorReg::new(base, len))
    }

    pub fn used(&self) -> u32 {
        self.next
    }

    pub fn free(&self) -> u32 {
        self.capacity - self.next
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Allocations made so far, in address order.
    pub fn entries(&self) -> &[ScratchEntry] {
        &self.entries
    }

    // Capacity is checked before any state changes, so a failed allocation
    // leaves the allocator exactly as it was.
    fn alloc_run(&mut self, name: &str, len: u32) -> Result<Addr, ScratchError> {
        if len > self.capacity - self.next {
            return Err(ScratchError::Exhausted {
                name: name.to_string(),
                requested: len,
                used: self.next,
                capacity: self.capacity,
            });
        }
        let base = self.next;
        self.next += len;
        self.entries.push(ScratchEntry { name: name.to_string(), base, len });
        Ok(base)
    }
}
