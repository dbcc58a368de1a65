use std::ops::{Index, IndexMut};

use crate::types::{ProcId, ResourceId, Tick};

/// One step of a process program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Consume `duration` ticks of CPU.
    Cpu { duration: u32 },
    /// Leave the CPU and wait `duration` ticks for a device.
    Io { duration: u32 },
    /// Acquire `count` units of `resource`, blocking until available.
    Request { resource: ResourceId, count: u32 },
    /// Return `count` units of `resource` to the pool.
    Release { resource: ResourceId, count: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    New,
    Ready,
    Running,
    Blocked,
    Terminated,
}

/// Why a blocked process is off the CPU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockReason {
    None,
    WaitingIo,
    WaitingResource,
}

/// A simulated process: static identity plus the live scheduling state.
///
/// The record is owned by the [`ProcessTable`]; everything else refers to it
/// through its [`ProcId`].
#[derive(Clone, Debug)]
pub struct Process {
    /// Textual identity from the workload, unique per run
    pub pid: String,
    /// Tick at which the process enters the system
    pub arrival_time: Tick,
    /// Static priority, smaller is more urgent
    pub priority: u32,
    /// The program, executed in order
    pub program: Vec<Instruction>,
    /// Cursor into `program`
    pub pc: usize,

    pub state: ProcessState,
    pub block_reason: BlockReason,
    /// Resource the process is queued on while blocked on a request
    pub blocked_on: Option<ResourceId>,
    /// Units left in the current CPU or IO instruction
    pub remaining: u32,
    /// Feedback queue level, 0 is the highest
    pub queue_level: usize,
    /// Tick at which the process last entered the ready set
    pub last_ready_time: Tick,

    /// First tick the process ever ran; unset until first dispatch
    pub start_time: Option<Tick>,
    /// Tick the process terminated, set exactly once
    pub finish_time: Option<Tick>,
    pub total_cpu_time: u64,
    pub total_io_time: u64,
}

impl Process {
    /// Creates a new process in the `New` state
    ///
    /// * `pid` - textual identity
    /// * `arrival_time` - tick the process enters the system
    /// * `priority` - static priority, smaller is more urgent
    /// * `program` - the instructions to execute
    pub fn new(
        pid: impl Into<String>,
        arrival_time: Tick,
        priority: u32,
        program: Vec<Instruction>,
    ) -> Process {
        Process {
            pid: pid.into(),
            arrival_time,
            priority,
            program,
            pc: 0,
            state: ProcessState::New,
            block_reason: BlockReason::None,
            blocked_on: None,
            remaining: 0,
            queue_level: 0,
            last_ready_time: 0,
            start_time: None,
            finish_time: None,
            total_cpu_time: 0,
            total_io_time: 0,
        }
    }

    /// The instruction at the program cursor, if the program has not ended
    pub fn current_instruction(&self) -> Option<&Instruction> {
        self.program.get(self.pc)
    }

    /// True once the cursor has passed the last instruction
    pub fn program_ended(&self) -> bool {
        self.pc >= self.program.len()
    }
}

/// Arena owning every process of a run.
///
/// Iteration order is load order, which every stage of the engine relies on
/// for determinism.
#[derive(Debug, Default)]
pub struct ProcessTable {
    procs: Vec<Process>,
}

impl ProcessTable {
    pub fn new() -> ProcessTable {
        ProcessTable { procs: Vec::new() }
    }

    /// Adds a process and returns its table index
    pub fn push(&mut self, proc: Process) -> ProcId {
        let id = ProcId::new(self.procs.len());
        self.procs.push(proc);
        id
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    /// All process ids, in load order
    pub fn ids(&self) -> Vec<ProcId> {
        (0..self.procs.len()).map(ProcId::new).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.procs.iter()
    }
}

impl Index<ProcId> for ProcessTable {
    type Output = Process;

    fn index(&self, id: ProcId) -> &Process {
        &self.procs[id.get()]
    }
}

impl IndexMut<ProcId> for ProcessTable {
    fn index_mut(&mut self, id: ProcId) -> &mut Process {
        &mut self.procs[id.get()]
    }
}

/// A parsed workload: the resource configuration and the process set.
#[derive(Clone, Debug, Default)]
pub struct Workload {
    /// Capacity of resource `i + 1`
    pub capacities: Vec<u32>,
    pub processes: Vec<Process>,
}
