use std::collections::VecDeque;
use std::num::NonZeroU32;

use crate::process::{ProcessState, ProcessTable};
use crate::scheduler::Scheduler;
use crate::types::{ProcId, Tick};

/// The Round Robin scheduling policy.
///
/// A single FIFO ready queue; the running process is preempted once it has
/// executed a full quantum of one CPU instruction.
pub struct RoundRobin {
    /// The queue for processes in `Ready` state
    ready: VecDeque<ProcId>,
    /// The time quanta of the policy
    ///
    /// The maximum number of CPU ticks a process can execute before it is
    /// sent back to the tail of the queue
    quantum: NonZeroU32,
    /// The policy's view of the clock
    now: Tick,
}

impl RoundRobin {
    /// Creates a new Round Robin policy
    ///
    /// * `quantum` - the time quanta
    pub fn new(quantum: NonZeroU32) -> RoundRobin {
        RoundRobin {
            ready: VecDeque::new(),
            quantum,
            now: 0,
        }
    }
}

impl Scheduler for RoundRobin {
    fn set_time(&mut self, now: Tick) {
        self.now = now;
    }

    fn add(&mut self, id: ProcId, table: &mut ProcessTable) {
        let proc = &mut table[id];
        proc.state = ProcessState::Ready;
        proc.last_ready_time = self.now;
        self.ready.push_back(id);
    }

    fn next(&mut self) -> Option<ProcId> {
        self.ready.pop_front()
    }

    fn should_preempt(&mut self, _id: ProcId, executed: u32, _table: &mut ProcessTable) -> bool {
        executed >= self.quantum.get()
    }

    fn apply_aging(&mut self, _table: &mut ProcessTable) -> bool {
        false
    }

    fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }
}
