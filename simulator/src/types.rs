use std::fmt;

/// Simulated time, measured in ticks since the start of the run.
pub type Tick = u64;

/// Opaque index of a process in the [`ProcessTable`](crate::ProcessTable).
///
/// Ready queues, wait queues and the running slot all hold `ProcId`s; the
/// table is the single owner of every process record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcId(usize);

impl ProcId {
    /// Creates a new ProcId object
    ///
    /// * `index` - position of the process in the table
    pub fn new(index: usize) -> ProcId {
        ProcId(index)
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

/// Identity of a resource, as numbered in the workload (`1..=M`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(u32);

impl ResourceId {
    /// Creates a new ResourceId object
    ///
    /// * `id` - the resource number from the workload
    pub fn new(id: u32) -> ResourceId {
        ResourceId(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
