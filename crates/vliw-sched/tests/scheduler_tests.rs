//! End-to-end scheduling pipeline tests against the public API.

use std::time::Duration;

use vliw_ir::{BinOp, Engine, MachineConfig, ScratchAllocator};
use vliw_sched::{
    HazardGraph, OpStream, ProgramBuilder, Schedule, Scheduler, SchedulerConfig, WindowProblem,
    WindowSolution, WindowSolver,
};

/// Every edge gap and every engine width must hold in the final bundles.
fn assert_schedule_valid(schedule: &Schedule, graph: &HazardGraph) {
    for op in 0..graph.op_count() {
        let cycle = schedule.cycle_of(op).expect("scheduled op has a cycle");
        for &(succ, gap) in graph.succs(op) {
            let succ_cycle = schedule.cycle_of(succ).unwrap();
            assert!(
                succ_cycle >= cycle + gap,
                "op {op} at {cycle}, op {succ} at {succ_cycle}: gap {gap} violated"
            );
        }
    }
    for (i, bundle) in schedule.bundles().iter().enumerate() {
        for engine in Engine::ALL {
            let width = schedule.machine().issue_width(engine) as usize;
            assert!(
                bundle.ops(engine).len() <= width,
                "cycle {i} issues {} {engine} ops, width is {width}",
                bundle.ops(engine).len()
            );
        }
    }
}

fn mixed_program(machine: &MachineConfig) -> OpStream {
    let mut scratch = ScratchAllocator::new(machine);
    let regs: Vec<_> =
        (0..8).map(|i| scratch.alloc_scalar(&format!("r{i}")).unwrap()).collect();

    let mut stream = OpStream::new();
    for (i, &r) in regs.iter().enumerate() {
        stream.constant(r, i as u32);
    }
    stream.alu(BinOp::Add, regs[0], regs[0], regs[1]);
    stream.alu(BinOp::Mul, regs[2], regs[2], regs[3]);
    stream.alu(BinOp::Add, regs[0], regs[0], regs[2]);
    stream.alu(BinOp::Xor, regs[4], regs[4], regs[5]);
    stream.alu(BinOp::Add, regs[0], regs[0], regs[4]);
    stream.store(regs[6], regs[0]);
    stream.store(regs[7], regs[4]);
    stream
}

#[test]
fn dependent_chain_serializes_one_op_per_cycle() {
    let machine = MachineConfig::default();
    let mut scratch = ScratchAllocator::new(&machine);
    let regs: Vec<_> =
        (0..6).map(|i| scratch.alloc_scalar(&format!("c{i}")).unwrap()).collect();

    let mut stream = OpStream::new();
    stream.constant(regs[0], 1);
    for i in 1..6 {
        stream.alu(BinOp::Add, regs[i], regs[i - 1], regs[i - 1]);
    }

    let schedule = Scheduler::new(machine).schedule(stream);
    assert_eq!(schedule.makespan(), 6);
    for op in 0..6 {
        assert_eq!(schedule.cycle_of(op), Some(op as u32));
    }
}

#[test]
fn raw_consumer_waits_a_cycle_despite_free_slots() {
    let machine = MachineConfig::default();
    let mut scratch = ScratchAllocator::new(&machine);
    let a = scratch.alloc_scalar("a").unwrap();
    let b = scratch.alloc_scalar("b").unwrap();
    let c = scratch.alloc_scalar("c").unwrap();

    let mut stream = OpStream::new();
    stream.constant(a, 1);
    stream.constant(b, 2);
    stream.alu(BinOp::Add, c, a, a);

    let schedule = Scheduler::new(machine).schedule(stream);
    assert_eq!(schedule.cycle_of(0), Some(0));
    assert_eq!(schedule.cycle_of(2), Some(1), "consumer must trail its producer by a cycle");
    // The wait is the hazard, not a full engine: cycle 0 issued no alu ops.
    assert!(schedule.bundles()[0].ops(Engine::Alu).is_empty());
    assert_eq!(schedule.makespan(), 2);
}

#[test]
fn overwrite_shares_the_last_readers_cycle() {
    let machine = MachineConfig::default();
    let mut scratch = ScratchAllocator::new(&machine);
    let x = scratch.alloc_scalar("x").unwrap();
    let y = scratch.alloc_scalar("y").unwrap();

    let mut stream = OpStream::new();
    stream.constant(x, 1); //               0: writes x
    stream.alu(BinOp::Add, y, x, x); //     1: reads x
    stream.constant(x, 7); //               2: overwrites x

    let schedule = Scheduler::new(machine).schedule(stream);
    let read = schedule.cycle_of(1).unwrap();
    let write = schedule.cycle_of(2).unwrap();
    assert!(write >= read, "overwrite must never precede the read");
    assert_eq!(write, read, "free slots let the overwrite share the cycle");
    assert_eq!(schedule.makespan(), 2);
}

#[test]
fn same_seed_reproduces_the_same_schedule() {
    let machine = MachineConfig::default();
    let config = SchedulerConfig::default().with_trials(20).with_seed(7);

    let first = Scheduler::with_config(machine.clone(), config.clone())
        .schedule(mixed_program(&machine));
    let second = Scheduler::with_config(machine.clone(), config).schedule(mixed_program(&machine));

    assert_eq!(first.makespan(), second.makespan());
    for op in 0..first.op_count() {
        assert_eq!(first.cycle_of(op), second.cycle_of(op));
    }
}

#[test]
fn more_trials_never_lengthen_the_schedule() {
    let machine = MachineConfig::default();
    let one = Scheduler::with_config(
        machine.clone(),
        SchedulerConfig::default().with_trials(1).with_seed(3),
    )
    .schedule(mixed_program(&machine));
    let many = Scheduler::with_config(
        machine.clone(),
        SchedulerConfig::default().with_trials(40).with_seed(3),
    )
    .schedule(mixed_program(&machine));

    assert!(many.makespan() <= one.makespan());
}

#[test]
fn vector_kernel_schedule_is_hazard_and_width_clean() {
    let machine = MachineConfig::default();
    let mut builder = ProgramBuilder::new(machine.clone());
    let ptr = builder.intern_const(64).unwrap();
    let bias = builder.intern_const(3).unwrap();
    let v_in = builder.alloc_vector("v_in").unwrap();
    let v_tmp = builder.alloc_vector("v_tmp").unwrap();
    let v_mask = builder.alloc_vector("v_mask").unwrap();
    let v_out = builder.alloc_vector("v_out").unwrap();

    builder.stream().vload(v_in, ptr);
    builder.stream().vbroadcast(v_tmp, bias);
    builder.stream().valu(BinOp::Mul, v_tmp, v_in, v_tmp);
    builder.stream().vmul_add(v_out, v_in, v_tmp, v_in);
    builder.stream().valu(BinOp::CmpLt, v_mask, v_out, v_tmp);
    builder.stream().vselect(v_out, v_mask, v_in, v_out);
    builder.stream().vstore(ptr, v_out);

    let stream = builder.into_stream();
    let graph = HazardGraph::build(stream.ops());
    let op_count = stream.len();

    let schedule = Scheduler::new(machine).schedule(stream);
    assert_schedule_valid(&schedule, &graph);
    assert_eq!(schedule.op_count(), op_count);
    assert!(schedule.makespan() >= vliw_sched::priority::critical_path_cycles(&graph));
}

struct NeverSolver;

impl WindowSolver for NeverSolver {
    fn solve(&self, _problem: &WindowProblem, _budget: Duration) -> Option<WindowSolution> {
        None
    }
}

/// Hands the current assignment straight back.
struct EchoSolver;

impl WindowSolver for EchoSolver {
    fn solve(&self, problem: &WindowProblem, _budget: Duration) -> Option<WindowSolution> {
        Some(WindowSolution { starts: problem.ops.iter().map(|op| op.hint).collect() })
    }
}

#[test]
fn solver_without_improvements_leaves_the_schedule_alone() {
    let machine = MachineConfig::default();
    let config = SchedulerConfig::default().with_trials(4).with_seed(5);

    let plain = Scheduler::with_config(machine.clone(), config.clone())
        .schedule(mixed_program(&machine));
    let with_never = Scheduler::with_config(machine.clone(), config.clone())
        .with_solver(Box::new(NeverSolver))
        .schedule(mixed_program(&machine));
    let with_echo = Scheduler::with_config(machine.clone(), config)
        .with_solver(Box::new(EchoSolver))
        .schedule(mixed_program(&machine));

    assert_eq!(plain.makespan(), with_never.makespan());
    assert_eq!(plain.makespan(), with_echo.makespan());
    for op in 0..plain.op_count() {
        assert_eq!(plain.cycle_of(op), with_never.cycle_of(op));
        assert_eq!(plain.cycle_of(op), with_echo.cycle_of(op));
    }
}

#[test]
fn mark_end_shows_up_in_the_utilization_report() {
    let machine = MachineConfig::default();
    let mut schedule = Scheduler::new(machine).schedule(mixed_program(&MachineConfig::default()));
    let before = schedule.makespan();

    schedule.mark_end();
    assert_eq!(schedule.makespan(), before + 1);

    let report = schedule.utilization();
    assert_eq!(report.cycles, before + 1);
    let flow = &report.engines[Engine::Flow.index()];
    assert_eq!(flow.total_ops, 1);
    let total: usize = report.engines.iter().map(|e| e.total_ops).sum();
    assert_eq!(total, schedule.op_count());
}

#[test]
fn asap_mode_packs_without_violating_hazards() {
    let machine = MachineConfig::default();
    let stream = mixed_program(&machine);
    let graph = HazardGraph::build(stream.ops());

    let schedule = Scheduler::new(machine).schedule_asap(stream);
    assert_schedule_valid(&schedule, &graph);
    assert_eq!(schedule.op_count(), graph.op_count());
}
