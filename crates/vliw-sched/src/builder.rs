//! Program construction above the raw stream: scratch allocation plus
//! constant pooling, so kernels materialize each immediate once.

use std::collections::HashMap;

use vliw_ir::{MachineConfig, ScalarReg, ScratchAllocator, ScratchError, VectorReg};

use crate::stream::OpStream;

pub struct ProgramBuilder {
    machine: MachineConfig,
    scratch: ScratchAllocator,
    stream: OpStream,
    const_pool: HashMap<u32, ScalarReg>,
}

impl ProgramBuilder {
    pub fn new(machine: MachineConfig) -> Self {
        let scratch = ScratchAllocator::new(&machine);
        Self { machine, scratch, stream: OpStream::new(), const_pool: HashMap::new() }
    }

    pub fn machine(&self) -> &MachineConfig {
        &self.machine
    }

    pub fn scratch(&self) -> &ScratchAllocator {
        &self.scratch
    }

    /// The op stream; all typed emission methods live there.
    pub fn stream(&mut self) -> &mut OpStream {
        &mut self.stream
    }

    pub fn alloc_scalar(&mut self, name: &str) -> Result<ScalarReg, ScratchError> {
        self.scratch.alloc_scalar(name)
    }

    pub fn alloc_vector(&mut self, name: &str) -> Result<VectorReg, ScratchError> {
        self.scratch.alloc_vector(name)
    }

    /// Scalar register holding `value`. The first request allocates a
    /// `const_<value>` word and emits the load; later requests reuse it.
    pub fn intern_const(&mut self, value: u32) -> Result<ScalarReg, ScratchError> {
        if let Some(&reg) = self.const_pool.get(&value) {
            return Ok(reg);
        }
        let reg = self.scratch.alloc_scalar(&format!("const_{value}"))?;
        self.stream.constant(reg, value);
        self.const_pool.insert(value, reg);
        Ok(reg)
    }

    pub fn into_stream(self) -> OpStream {
        self.stream
    }
}
