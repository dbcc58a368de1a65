//! A discrete-time CPU scheduling and resource simulator.
//!
//! This library provides the process model, the resource allocator, the
//! scheduling policies and the tick engine needed to simulate a workload
//! of processes on a single logical CPU.
//!

use std::num::NonZeroU32;

mod schedulers;

pub use schedulers::MultilevelFeedback;
pub use schedulers::Priority;
pub use schedulers::RoundRobin;

mod scheduler;
pub use crate::scheduler::Scheduler;

mod types;
pub use crate::types::ProcId;
pub use crate::types::ResourceId;
pub use crate::types::Tick;

mod process;
pub use crate::process::{
    BlockReason, Instruction, Process, ProcessState, ProcessTable, Workload,
};

mod resources;
pub use crate::resources::{Resource, ResourceManager};

mod trace;
pub use crate::trace::{Trace, TraceKind, TraceRecord};

mod engine;
pub use crate::engine::{Simulation, SimulationReport};

mod metrics;
pub use crate::metrics::{MetricsReport, MetricsSummary, ProcessMetrics};

/// Returns a structure that implements the `Scheduler` trait with a round robin policy
///
/// * `quantum` - the time quanta that a process can run before it is preempted
pub fn round_robin(quantum: NonZeroU32) -> impl Scheduler {
    RoundRobin::new(quantum)
}

/// Returns a structure that implements the `Scheduler` trait with a static priority policy
///
/// The policy is cooperative: a process keeps the CPU until its burst
/// completes or it blocks. Ready processes that wait too long are aged
/// toward priority 0.
pub fn priority() -> impl Scheduler {
    Priority::new()
}

/// Returns a structure that implements the `Scheduler` trait with a three-level
/// multilevel feedback queue policy
///
/// * `quantum` - the level 0 time quanta; each level below doubles it. A
///   process that exhausts its quanta is demoted one level, and every 200
///   ticks all queued processes are boosted back to level 0.
pub fn multilevel_feedback(quantum: NonZeroU32) -> impl Scheduler {
    MultilevelFeedback::new(quantum)
}
