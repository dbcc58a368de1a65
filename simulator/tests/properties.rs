//! Randomized invariant checks over small workloads.

use std::num::NonZeroU32;

use proptest::prelude::*;

use simulator::{
    BlockReason, Instruction, MultilevelFeedback, Priority, Process, ProcessState, ResourceId,
    RoundRobin, Scheduler, Simulation, TraceKind, Workload,
};

/// Generous upper bound; every generated workload finishes in far fewer ticks
const MAX_TICKS: usize = 50_000;

#[derive(Clone, Copy, Debug)]
enum Policy {
    Rr,
    Prio,
    Mlfq,
}

fn policy_strategy() -> impl Strategy<Value = (Policy, u32)> {
    (
        prop_oneof![Just(Policy::Rr), Just(Policy::Prio), Just(Policy::Mlfq)],
        1u32..8,
    )
}

fn build_policy(policy: Policy, quantum: u32) -> Box<dyn Scheduler> {
    let quantum = NonZeroU32::new(quantum).unwrap();
    match policy {
        Policy::Rr => Box::new(RoundRobin::new(quantum)),
        Policy::Prio => Box::new(Priority::new()),
        Policy::Mlfq => Box::new(MultilevelFeedback::new(quantum)),
    }
}

fn compute_instruction() -> impl Strategy<Value = Instruction> + Clone {
    prop_oneof![
        (1u32..6).prop_map(|duration| Instruction::Cpu { duration }),
        (1u32..4).prop_map(|duration| Instruction::Io { duration }),
    ]
}

fn resource_instruction(resources: u32) -> impl Strategy<Value = Instruction> + Clone {
    prop_oneof![
        4 => (1u32..6).prop_map(|duration| Instruction::Cpu { duration }),
        2 => (1..=resources, 1u32..4).prop_map(|(r, count)| Instruction::Request {
            resource: ResourceId::new(r),
            count,
        }),
        2 => (1..=resources, 1u32..4).prop_map(|(r, count)| Instruction::Release {
            resource: ResourceId::new(r),
            count,
        }),
    ]
}

fn processes(
    instruction: impl Strategy<Value = Instruction> + Clone,
) -> impl Strategy<Value = Vec<Process>> {
    prop::collection::vec(
        (
            prop::collection::vec(instruction, 1..6),
            0u64..10,
            0u32..6,
        ),
        1..5,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(index, (program, arrival, priority))| {
                Process::new(format!("P{index}"), arrival, priority, program)
            })
            .collect()
    })
}

/// Steps the simulation to completion, checking the boundary invariants
/// after every tick.
fn run_checked(workload: Workload, scheduler: Box<dyn Scheduler>) -> Simulation<Box<dyn Scheduler>> {
    let mut sim = Simulation::new(workload, scheduler);
    for _ in 0..MAX_TICKS {
        let more = sim.step();
        assert!(
            sim.resources().is_conserved(),
            "resource conservation broken at tick {}",
            sim.now()
        );
        let running = sim
            .table()
            .iter()
            .filter(|p| p.state == ProcessState::Running)
            .count();
        assert!(running <= 1, "more than one process running");
        for proc in sim.table().iter() {
            if proc.state == ProcessState::Blocked && proc.block_reason == BlockReason::WaitingIo {
                assert!(proc.remaining > 0, "io waiter with nothing left to wait");
            }
            if proc.state == ProcessState::Terminated {
                assert!(proc.finish_time.is_some());
            }
        }
        if !more {
            return sim;
        }
    }
    panic!("workload did not finish within {MAX_TICKS} ticks");
}

fn check_report(sim: Simulation<Box<dyn Scheduler>>, expected: usize) {
    let cpu_by_pid: Vec<(String, u64)> = sim
        .table()
        .iter()
        .map(|p| (p.pid.clone(), p.total_cpu_time))
        .collect();
    let report = sim.into_report();

    assert_eq!(report.metrics.per_process.len(), expected);
    for m in &report.metrics.per_process {
        assert!(m.turnaround >= m.cpu_time + m.io_time);
        let ran = report
            .trace
            .iter()
            .filter(|r| matches!(&r.kind, TraceKind::Running { pid } if *pid == m.pid))
            .count() as u64;
        let (_, cpu_time) = cpu_by_pid
            .iter()
            .find(|(pid, _)| *pid == m.pid)
            .cloned()
            .unwrap();
        assert_eq!(ran, cpu_time, "cpu time disagrees with the trace");
    }
}

proptest! {
    #[test]
    fn workloads_without_requests_never_deadlock(
        procs in processes(compute_instruction()),
        (policy, quantum) in policy_strategy(),
    ) {
        let workload = Workload { capacities: vec![1], processes: procs };
        let expected = workload.processes.len();
        let sim = run_checked(workload, build_policy(policy, quantum));

        for proc in sim.table().iter() {
            prop_assert_eq!(proc.state, ProcessState::Terminated);
            prop_assert!(proc.finish_time.unwrap() >= proc.arrival_time);
            if let Some(start) = proc.start_time {
                prop_assert!(start >= proc.arrival_time);
            }
        }
        let no_deadlock_or_recovery = sim.trace().iter().all(|r| !matches!(
            r.kind,
            TraceKind::DeadlockDetected
                | TraceKind::Abort { .. }
                | TraceKind::RecoveryRelease { .. }
        ));
        prop_assert!(no_deadlock_or_recovery);
        check_report(sim, expected);
    }

    #[test]
    fn resource_workloads_conserve_units_and_terminate(
        procs in processes(resource_instruction(2)),
        capacities in prop::collection::vec(1u32..4, 2),
        (policy, quantum) in policy_strategy(),
    ) {
        let workload = Workload { capacities, processes: procs };
        let expected = workload.processes.len();
        let sim = run_checked(workload, build_policy(policy, quantum));

        // Every process ends, by running out of program or by abort
        for proc in sim.table().iter() {
            prop_assert_eq!(proc.state, ProcessState::Terminated);
        }
        for res in sim.resources().resources() {
            prop_assert!(res.available <= res.capacity);
        }
        check_report(sim, expected);
    }

    #[test]
    fn aging_respects_the_zero_floor(
        procs in processes(compute_instruction()),
    ) {
        let workload = Workload { capacities: vec![], processes: procs };
        let sim = run_checked(workload, Box::new(Priority::new()));
        // u32 priorities cannot wrap past zero without panicking in debug
        // builds; reaching here means the floor held
        for proc in sim.table().iter() {
            prop_assert!(proc.priority <= 5);
        }
    }
}
