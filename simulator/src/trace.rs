//! The per-tick event record of a run.
//!
//! The engine never prints; it records typed events here and the caller
//! decides how to render them. Tests assert on the event sequence directly.

use std::fmt;

use crate::types::{ResourceId, Tick};

/// What happened during one tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceKind {
    /// The running process executed one CPU tick
    Running { pid: String },
    /// The running process started an IO delay
    BlockIo { pid: String },
    /// The running process asked for resource units
    Request {
        pid: String,
        resource: ResourceId,
        count: u32,
    },
    /// The request could not be satisfied
    BlockedOnResource { pid: String, resource: ResourceId },
    /// The running process returned resource units
    Release {
        pid: String,
        resource: ResourceId,
        count: u32,
    },
    /// No process was available to run
    Idle,
    /// A waiter was granted its pending request
    Unblock { pid: String, resource: ResourceId },
    /// The periodic boost returned all queued processes to level 0
    Boost,
    /// The detector found a resource deadlock
    DeadlockDetected,
    /// The chosen victim was aborted
    Abort { pid: String },
    /// Recovery returned units held by the aborted victim
    RecoveryRelease {
        pid: String,
        resource: ResourceId,
        count: u32,
    },
}

/// One event, stamped with the tick it happened in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceRecord {
    pub time: Tick,
    pub kind: TraceKind,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TraceKind::Running { pid } => write!(f, "Time {}: {} RUNNING", self.time, pid),
            TraceKind::BlockIo { pid } => write!(f, "Time {}: {} BLOCK (IO)", self.time, pid),
            TraceKind::Request {
                pid,
                resource,
                count,
            } => write!(
                f,
                "Time {}: {} REQUEST R{} ({})",
                self.time, pid, resource, count
            ),
            TraceKind::BlockedOnResource { pid, resource } => write!(
                f,
                "Time {}: {} BLOCKED (Resource R{})",
                self.time, pid, resource
            ),
            TraceKind::Release {
                pid,
                resource,
                count,
            } => write!(
                f,
                "Time {}: {} RELEASE R{} ({})",
                self.time, pid, resource, count
            ),
            TraceKind::Idle => write!(f, "Time {}: IDLE", self.time),
            TraceKind::Unblock { pid, resource } => {
                write!(f, "[UNBLOCK] Process {} got Resource {}", pid, resource)
            }
            TraceKind::Boost => write!(
                f,
                "Time {} [BOOST] All MLFQ processes moved to Level 0",
                self.time
            ),
            TraceKind::DeadlockDetected => {
                write!(f, "\n*** DEADLOCK DETECTED at time {} ***", self.time)
            }
            TraceKind::Abort { pid } => {
                write!(f, "[DEADLOCK RECOVERY] Aborting process {}", pid)
            }
            TraceKind::RecoveryRelease {
                pid,
                resource,
                count,
            } => write!(
                f,
                "[RECOVERY] Releasing {} of R{} from aborted {}",
                count, resource, pid
            ),
        }
    }
}

/// An append-only sequence of [`TraceRecord`]s.
#[derive(Debug, Default)]
pub struct Trace {
    records: Vec<TraceRecord>,
}

impl Trace {
    pub fn new() -> Trace {
        Trace {
            records: Vec::new(),
        }
    }

    pub fn record(&mut self, time: Tick, kind: TraceKind) {
        self.records.push(TraceRecord { time, kind });
    }

    pub fn iter(&self) -> impl Iterator<Item = &TraceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_the_timeline_vocabulary() {
        let lines = [
            (
                TraceRecord {
                    time: 3,
                    kind: TraceKind::Running { pid: "A".into() },
                },
                "Time 3: A RUNNING",
            ),
            (
                TraceRecord {
                    time: 4,
                    kind: TraceKind::Request {
                        pid: "B".into(),
                        resource: ResourceId::new(2),
                        count: 3,
                    },
                },
                "Time 4: B REQUEST R2 (3)",
            ),
            (
                TraceRecord {
                    time: 4,
                    kind: TraceKind::BlockedOnResource {
                        pid: "B".into(),
                        resource: ResourceId::new(2),
                    },
                },
                "Time 4: B BLOCKED (Resource R2)",
            ),
            (
                TraceRecord {
                    time: 9,
                    kind: TraceKind::Unblock {
                        pid: "B".into(),
                        resource: ResourceId::new(2),
                    },
                },
                "[UNBLOCK] Process B got Resource 2",
            ),
            (
                TraceRecord {
                    time: 200,
                    kind: TraceKind::Boost,
                },
                "Time 200 [BOOST] All MLFQ processes moved to Level 0",
            ),
            (
                TraceRecord {
                    time: 12,
                    kind: TraceKind::Idle,
                },
                "Time 12: IDLE",
            ),
        ];
        for (record, expected) in lines {
            assert_eq!(record.to_string(), expected);
        }
    }

    #[test]
    fn deadlock_line_is_set_off_by_a_blank_line() {
        let record = TraceRecord {
            time: 8,
            kind: TraceKind::DeadlockDetected,
        };
        assert_eq!(record.to_string(), "\n*** DEADLOCK DETECTED at time 8 ***");
    }
}
