use std::collections::VecDeque;

use crate::process::{ProcessState, ProcessTable};
use crate::scheduler::Scheduler;
use crate::types::{ProcId, Tick};

/// Ticks a process may sit in the ready set before its priority is raised.
const AGING_THRESHOLD: Tick = 50;

/// The static priority scheduling policy.
///
/// The ready queue is kept sorted by `(priority, arrival_time)`, smaller
/// priority first. The policy never preempts on a quantum: a process keeps
/// the CPU until its burst completes or it blocks. Processes that wait too
/// long are aged one priority step at a time, down to a floor of 0.
pub struct Priority {
    /// The queue for processes in `Ready` state, kept sorted
    ready: VecDeque<ProcId>,
    /// The policy's view of the clock
    now: Tick,
}

impl Priority {
    pub fn new() -> Priority {
        Priority {
            ready: VecDeque::new(),
            now: 0,
        }
    }

    /// Restores the sort order after an insertion or a priority change
    ///
    /// The sort is stable, so processes with equal priority keep their
    /// relative order and ties fall back to arrival time.
    fn resort(&mut self, table: &ProcessTable) {
        self.ready
            .make_contiguous()
            .sort_by_key(|&id| (table[id].priority, table[id].arrival_time));
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::new()
    }
}

impl Scheduler for Priority {
    fn set_time(&mut self, now: Tick) {
        self.now = now;
    }

    fn add(&mut self, id: ProcId, table: &mut ProcessTable) {
        let proc = &mut table[id];
        proc.state = ProcessState::Ready;
        proc.last_ready_time = self.now;
        self.ready.push_back(id);
        self.resort(table);
    }

    fn next(&mut self) -> Option<ProcId> {
        self.ready.pop_front()
    }

    fn should_preempt(&mut self, _id: ProcId, _executed: u32, _table: &mut ProcessTable) -> bool {
        false
    }

    fn apply_aging(&mut self, table: &mut ProcessTable) -> bool {
        let mut changed = false;
        for &id in self.ready.iter() {
            let proc = &mut table[id];
            if self.now - proc.last_ready_time > AGING_THRESHOLD && proc.priority > 0 {
                proc.priority -= 1;
                proc.last_ready_time = self.now;
                changed = true;
            }
        }
        if changed {
            self.resort(table);
        }
        false
    }

    fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Process;

    fn push(table: &mut ProcessTable, pid: &str, arrival: Tick, priority: u32) -> ProcId {
        table.push(Process::new(pid, arrival, priority, Vec::new()))
    }

    #[test]
    fn orders_by_priority_then_arrival() {
        let mut table = ProcessTable::new();
        let low = push(&mut table, "low", 0, 5);
        let late = push(&mut table, "late", 4, 1);
        let early = push(&mut table, "early", 2, 1);
        let mut prio = Priority::new();
        prio.add(low, &mut table);
        prio.add(late, &mut table);
        prio.add(early, &mut table);
        assert_eq!(prio.next(), Some(early));
        assert_eq!(prio.next(), Some(late));
        assert_eq!(prio.next(), Some(low));
    }

    #[test]
    fn never_preempts_on_quantum() {
        let mut table = ProcessTable::new();
        let id = push(&mut table, "A", 0, 0);
        let mut prio = Priority::new();
        assert!(!prio.should_preempt(id, u32::MAX, &mut table));
    }

    #[test]
    fn aging_raises_priority_after_threshold() {
        let mut table = ProcessTable::new();
        let id = push(&mut table, "A", 0, 5);
        let mut prio = Priority::new();
        prio.set_time(0);
        prio.add(id, &mut table);

        prio.set_time(AGING_THRESHOLD);
        prio.apply_aging(&mut table);
        assert_eq!(table[id].priority, 5);

        prio.set_time(AGING_THRESHOLD + 1);
        prio.apply_aging(&mut table);
        assert_eq!(table[id].priority, 4);
        assert_eq!(table[id].last_ready_time, AGING_THRESHOLD + 1);

        // Next step needs another full wait
        prio.set_time(AGING_THRESHOLD + 2);
        prio.apply_aging(&mut table);
        assert_eq!(table[id].priority, 4);
        prio.set_time(2 * (AGING_THRESHOLD + 1));
        prio.apply_aging(&mut table);
        assert_eq!(table[id].priority, 3);
    }

    #[test]
    fn aging_never_drops_below_zero() {
        let mut table = ProcessTable::new();
        let id = push(&mut table, "A", 0, 1);
        let mut prio = Priority::new();
        prio.set_time(0);
        prio.add(id, &mut table);
        for step in 1..=5 {
            prio.set_time(step * (AGING_THRESHOLD + 1));
            prio.apply_aging(&mut table);
        }
        assert_eq!(table[id].priority, 0);
    }

    #[test]
    fn aging_reorders_the_ready_queue() {
        let mut table = ProcessTable::new();
        let hog = push(&mut table, "hog", 3, 1);
        let aged = push(&mut table, "aged", 0, 2);
        let mut prio = Priority::new();
        prio.set_time(0);
        prio.add(aged, &mut table);
        // Admitted much later, so only `aged` crosses the threshold
        prio.set_time(AGING_THRESHOLD);
        prio.add(hog, &mut table);
        assert!(prio.has_ready());

        prio.set_time(AGING_THRESHOLD + 1);
        prio.apply_aging(&mut table);
        assert_eq!(table[aged].priority, 1);
        // Equal priority now; `aged` arrived earlier and goes first
        assert_eq!(prio.next(), Some(aged));
        assert_eq!(prio.next(), Some(hog));
    }
}
