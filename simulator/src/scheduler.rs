use crate::process::ProcessTable;
use crate::types::{ProcId, Tick};

/// The contract every scheduling policy implements.
///
/// The engine is policy-agnostic: it admits ready processes, asks for the
/// next one to dispatch, checks the quantum after every executed CPU tick
/// and lets the policy age its ready set once per tick. Policies keep only
/// `ProcId`s; the process records stay in the [`ProcessTable`].
pub trait Scheduler {
    /// Updates the policy's view of the clock
    ///
    /// Called at the top of every tick, before any admission, so that
    /// `last_ready_time` stamps are exact.
    fn set_time(&mut self, now: Tick);

    /// Admits a process to the ready set
    ///
    /// Marks it `Ready`, stamps `last_ready_time` and enqueues it according
    /// to the policy's discipline.
    ///
    /// * `id` - process to admit
    /// * `table` - the process arena
    fn add(&mut self, id: ProcId, table: &mut ProcessTable);

    /// Removes and returns the next process to run, if any is ready
    fn next(&mut self) -> Option<ProcId>;

    /// Decides whether the running process must be preempted
    ///
    /// Invoked after each executed CPU tick while the current CPU
    /// instruction is unfinished.
    ///
    /// * `id` - the running process
    /// * `executed` - CPU ticks consumed since the last dispatch
    fn should_preempt(&mut self, id: ProcId, executed: u32, table: &mut ProcessTable) -> bool;

    /// Applies the policy's aging rule for the current tick
    ///
    /// Returns true when a feedback boost moved at least one process, so the
    /// engine can record it in the trace.
    fn apply_aging(&mut self, table: &mut ProcessTable) -> bool;

    /// True while at least one process is ready on any level
    fn has_ready(&self) -> bool;
}

impl<T: Scheduler + ?Sized> Scheduler for Box<T> {
    fn set_time(&mut self, now: Tick) {
        (**self).set_time(now)
    }

    fn add(&mut self, id: ProcId, table: &mut ProcessTable) {
        (**self).add(id, table)
    }

    fn next(&mut self) -> Option<ProcId> {
        (**self).next()
    }

    fn should_preempt(&mut self, id: ProcId, executed: u32, table: &mut ProcessTable) -> bool {
        (**self).should_preempt(id, executed, table)
    }

    fn apply_aging(&mut self, table: &mut ProcessTable) -> bool {
        (**self).apply_aging(table)
    }

    fn has_ready(&self) -> bool {
        (**self).has_ready()
    }
}
