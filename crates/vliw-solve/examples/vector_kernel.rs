//! Schedules a scale-and-clamp vector kernel and prints the utilization
//! report, comparing in-order placement against the optimizing pipeline.
//!
//! Run: cargo run --release -p vliw-solve --example vector_kernel

use anyhow::Result;
use vliw_ir::{BinOp, MachineConfig};
use vliw_sched::{ProgramBuilder, Scheduler, SchedulerConfig};
use vliw_solve::BranchBoundSolver;

const GROUPS: u32 = 16;

fn main() -> Result<()> {
    env_logger::init();

    let machine = MachineConfig::default();
    let mut builder = ProgramBuilder::new(machine.clone());

    let base = builder.intern_const(4096)?;
    let scale = builder.intern_const(3)?;
    let limit = builder.intern_const(255)?;

    // Shared broadcast operands.
    let v_scale = builder.alloc_vector("v_scale")?;
    let v_limit = builder.alloc_vector("v_limit")?;
    builder.stream().vbroadcast(v_scale, scale);
    builder.stream().vbroadcast(v_limit, limit);

    // Per group: acc = clamp(v * scale * scale + v, limit), stored back.
    for g in 0..GROUPS {
        let offset = builder.intern_const(g * 8)?;
        let ptr = builder.alloc_scalar(&format!("ptr{g}"))?;
        let v = builder.alloc_vector(&format!("v{g}"))?;
        let acc = builder.alloc_vector(&format!("acc{g}"))?;
        let mask = builder.alloc_vector(&format!("mask{g}"))?;

        builder.stream().alu(BinOp::Add, ptr, base, offset);
        builder.stream().vload(v, ptr);
        builder.stream().valu(BinOp::Mul, acc, v, v_scale);
        builder.stream().vmul_add(acc, acc, v_scale, v);
        builder.stream().valu(BinOp::CmpLt, mask, v_limit, acc);
        builder.stream().vselect(acc, mask, v_limit, acc);
        builder.stream().vstore(ptr, acc);
    }

    let stream = builder.into_stream();
    println!("=== VLIW kernel scheduling ===");
    println!("ops emitted:      {}", stream.len());

    let in_order = Scheduler::new(machine.clone()).schedule_asap(stream.clone());
    println!("in-order:         {} cycles", in_order.makespan());

    let config = SchedulerConfig::default().with_trials(100).with_seed(42).with_threads(4);
    let mut schedule = Scheduler::with_config(machine, config)
        .with_solver(Box::new(BranchBoundSolver::auto()))
        .schedule(stream);
    schedule.mark_end();
    println!("optimized:        {} cycles (end marker included)", schedule.makespan());

    println!("\n{}", schedule.utilization());
    Ok(())
}
