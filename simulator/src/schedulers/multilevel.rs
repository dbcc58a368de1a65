use std::collections::VecDeque;
use std::num::NonZeroU32;

use crate::process::{ProcessState, ProcessTable};
use crate::scheduler::Scheduler;
use crate::types::{ProcId, Tick};

/// Number of feedback levels.
pub const LEVELS: usize = 3;

/// Every `BOOST_INTERVAL` ticks all queued processes return to level 0.
const BOOST_INTERVAL: Tick = 200;

/// The three-level multilevel feedback queue policy.
///
/// Dispatch scans the levels top down and pops the head of the first
/// non-empty one. A process that exhausts its level's quantum
/// (`quantum * 2^level`) is demoted one level, down to the last. The
/// periodic boost undoes the demotions to keep long-running processes from
/// starving once new short ones keep arriving.
pub struct MultilevelFeedback {
    /// One FIFO queue per level, `levels[0]` is served first
    levels: [VecDeque<ProcId>; LEVELS],
    /// Base time quanta; level `l` runs `quantum << l` ticks
    quantum: NonZeroU32,
    /// The policy's view of the clock
    now: Tick,
}

impl MultilevelFeedback {
    /// Creates a new multilevel feedback policy
    ///
    /// * `quantum` - the level 0 time quanta
    pub fn new(quantum: NonZeroU32) -> MultilevelFeedback {
        MultilevelFeedback {
            levels: [VecDeque::new(), VecDeque::new(), VecDeque::new()],
            quantum,
            now: 0,
        }
    }
}

impl Scheduler for MultilevelFeedback {
    fn set_time(&mut self, now: Tick) {
        self.now = now;
    }

    fn add(&mut self, id: ProcId, table: &mut ProcessTable) {
        let proc = &mut table[id];
        proc.state = ProcessState::Ready;
        proc.last_ready_time = self.now;
        let level = proc.queue_level.min(LEVELS - 1);
        self.levels[level].push_back(id);
    }

    fn next(&mut self) -> Option<ProcId> {
        self.levels.iter_mut().find_map(|queue| queue.pop_front())
    }

    fn should_preempt(&mut self, id: ProcId, executed: u32, table: &mut ProcessTable) -> bool {
        let proc = &mut table[id];
        let limit = self.quantum.get() << proc.queue_level;
        if executed >= limit {
            if proc.queue_level < LEVELS - 1 {
                proc.queue_level += 1;
            }
            return true;
        }
        false
    }

    fn apply_aging(&mut self, table: &mut ProcessTable) -> bool {
        if self.now == 0 || self.now % BOOST_INTERVAL != 0 {
            return false;
        }

        let mut moved = false;
        for level in 1..LEVELS {
            while let Some(id) = self.levels[level].pop_front() {
                table[id].queue_level = 0;
                self.levels[0].push_back(id);
                moved = true;
            }
        }
        moved
    }

    fn has_ready(&self) -> bool {
        self.levels.iter().any(|queue| !queue.is_empty())
    }
}
