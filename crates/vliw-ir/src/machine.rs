//! Machine description consumed by the scheduler.
//!
//! The description is host-supplied and read-only during scheduling: issue
//! widths per engine class, the vector length in words, and the scratch
//! capacity in words. `Default` is the reference target.

use serde::{Deserialize, Serialize};

use crate::op::Engine;

/// Per-engine issue width: how many payloads of each class fit in one bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueWidths {
    pub load: u32,
    pub store: u32,
    pub alu: u32,
    pub valu: u32,
    pub flow: u32,
}

impl IssueWidths {
    pub fn get(&self, engine: Engine) -> u32 {
        match engine {
            Engine::Load => self.load,
            Engine::Store => self.store,
            Engine::Alu => self.alu,
            Engine::Valu => self.valu,
            Engine::Flow => self.flow,
        }
    }

    /// Uniform width for every engine class.
    pub fn uniform(width: u32) -> Self {
        Self { load: width, store: width, alu: width, valu: width, flow: width }
    }
}

impl Default for IssueWidths {
    fn default() -> Self {
        Self { load: 2, store: 2, alu: 12, valu: 6, flow: 1 }
    }
}

/// Full machine description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    pub widths: IssueWidths,
    /// Vector register length in words.
    pub vlen: u32,
    /// Scratch memory capacity in words.
    pub scratch_words: u32,
}

impl MachineConfig {
    pub fn issue_width(&self, engine: Engine) -> u32 {
        self.widths.get(engine)
    }

    pub fn with_widths(mut self, widths: IssueWidths) -> Self {
        self.widths = widths;
        self
    }

    pub fn with_vlen(mut self, vlen: u32) -> Self {
        self.vlen = vlen;
        self
    }

    pub fn with_scratch_words(mut self, words: u32) -> Self {
        self.scratch_words = words;
        self
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self { widths: IssueWidths::default(), vlen: 8, scratch_words: 1536 }
    }
}
