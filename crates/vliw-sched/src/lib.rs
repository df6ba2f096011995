//! Bundle scheduling for the VLIW target.
//!
//! Programs are emitted as a flat [`OpStream`] carrying exact read/write
//! address sets. [`Scheduler::schedule`] packs the stream into per-cycle
//! bundles: it builds the hazard graph (read-after-write and
//! write-after-write order with a one-cycle gap, write-after-read with
//! none), list-schedules by critical-path height, runs seeded
//! priority-noise trials, and optionally hands trailing windows to an
//! exact [`WindowSolver`]. [`Scheduler::schedule_asap`] is the in-order
//! baseline.

pub mod builder;
pub mod config;
pub mod hazards;
pub mod priority;
pub mod refine;
pub mod schedule;
pub mod scheduler;
pub mod stream;

mod asap;
mod list;

pub use builder::ProgramBuilder;
pub use config::{RefineConfig, SchedulerConfig};
pub use hazards::HazardGraph;
pub use refine::{WindowEdge, WindowOp, WindowProblem, WindowSolution, WindowSolver};
pub use schedule::{Bundle, EngineUsage, Schedule, UtilizationReport};
pub use scheduler::Scheduler;
pub use stream::{OpId, OpRecord, OpStream};
