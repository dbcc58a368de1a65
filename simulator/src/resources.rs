use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::{debug, warn};

use crate::process::{BlockReason, Instruction, ProcessTable};
use crate::scheduler::Scheduler;
use crate::trace::{Trace, TraceKind};
use crate::types::{ProcId, ResourceId, Tick};

/// A multi-unit resource.
///
/// `available + sum(allocation)` equals `capacity` at every tick boundary;
/// the manager clamps releases so the sum can never drift upward.
#[derive(Debug)]
pub struct Resource {
    pub id: ResourceId,
    pub capacity: u32,
    pub available: u32,
    /// Units currently held, keyed by textual pid for traceability
    pub allocation: HashMap<String, u32>,
}

/// The multi-unit allocator with per-resource FIFO wait queues.
///
/// Granting is immediate when enough units are free; otherwise the caller
/// is queued and woken first-come-first-served when a release makes its
/// pending request satisfiable. The head of a wait queue is never skipped.
#[derive(Debug, Default)]
pub struct ResourceManager {
    resources: BTreeMap<ResourceId, Resource>,
    waiting: BTreeMap<ResourceId, VecDeque<ProcId>>,
}

impl ResourceManager {
    /// Populates resources `1..=capacities.len()` with the given capacities
    pub fn new(capacities: &[u32]) -> ResourceManager {
        let mut resources = BTreeMap::new();
        let mut waiting = BTreeMap::new();
        for (index, &capacity) in capacities.iter().enumerate() {
            let id = ResourceId::new(index as u32 + 1);
            resources.insert(
                id,
                Resource {
                    id,
                    capacity,
                    available: capacity,
                    allocation: HashMap::new(),
                },
            );
            waiting.insert(id, VecDeque::new());
        }
        ResourceManager { resources, waiting }
    }

    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(&id)
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Processes queued on `id`, head first
    pub fn waiters(&self, id: ResourceId) -> impl Iterator<Item = ProcId> + '_ {
        self.waiting.get(&id).into_iter().flatten().copied()
    }

    /// Tries to grant `count` units of `resource` to `id`.
    ///
    /// On refusal the caller is appended to the resource's wait queue and
    /// `false` is returned; transitioning the process to `Blocked` is the
    /// engine's job. An unknown resource is refused without queueing.
    pub fn request(
        &mut self,
        id: ProcId,
        table: &ProcessTable,
        resource: ResourceId,
        count: u32,
    ) -> bool {
        let Some(res) = self.resources.get_mut(&resource) else {
            debug!(pid = %table[id].pid, resource = %resource, "request for unknown resource");
            return false;
        };

        if res.available >= count {
            res.available -= count;
            *res.allocation.entry(table[id].pid.clone()).or_insert(0) += count;
            debug!(pid = %table[id].pid, resource = %resource, count, "granted");
            true
        } else {
            if let Some(queue) = self.waiting.get_mut(&resource) {
                queue.push_back(id);
            }
            debug!(pid = %table[id].pid, resource = %resource, count, "refused");
            false
        }
    }

    /// Returns `count` units of `resource` held by `id`, then drains waiters.
    ///
    /// The release is clamped to the units actually held. Waiters are
    /// inspected head first: while the head's pending request fits the pool
    /// it is granted, its `pc` advanced past the request, and it is admitted
    /// back to the ready set; the drain stops at the first waiter that does
    /// not fit.
    #[allow(clippy::too_many_arguments)]
    pub fn release(
        &mut self,
        now: Tick,
        id: ProcId,
        resource: ResourceId,
        count: u32,
        table: &mut ProcessTable,
        sched: &mut dyn Scheduler,
        trace: &mut Trace,
    ) {
        {
            let Some(res) = self.resources.get_mut(&resource) else {
                debug!(pid = %table[id].pid, resource = %resource, "release of unknown resource");
                return;
            };

            let holder = table[id].pid.clone();
            let held = res.allocation.get(&holder).copied().unwrap_or(0);
            let freed = count.min(held);
            if freed < count {
                warn!(
                    pid = %holder,
                    resource = %resource,
                    count,
                    held,
                    "release exceeds holding, clamped"
                );
            }
            res.available += freed;
            if held - freed == 0 {
                res.allocation.remove(&holder);
            } else {
                res.allocation.insert(holder, held - freed);
            }
        }

        self.drain_waiters(now, resource, table, sched, trace);
    }

    /// Returns every unit held by `id`, resource by resource.
    ///
    /// Used by deadlock recovery when aborting a victim; the cascading
    /// grants may ready other waiters.
    pub fn release_all(
        &mut self,
        now: Tick,
        id: ProcId,
        table: &mut ProcessTable,
        sched: &mut dyn Scheduler,
        trace: &mut Trace,
    ) {
        let holder = table[id].pid.clone();
        let held: Vec<(ResourceId, u32)> = self
            .resources
            .values()
            .filter_map(|res| {
                res.allocation
                    .get(&holder)
                    .map(|&count| (res.id, count))
                    .filter(|&(_, count)| count > 0)
            })
            .collect();

        for (resource, count) in held {
            trace.record(
                now,
                TraceKind::RecoveryRelease {
                    pid: holder.clone(),
                    resource,
                    count,
                },
            );
            self.release(now, id, resource, count, table, sched, trace);
        }
    }

    /// Drops `id` from every wait queue.
    ///
    /// Must run before a blocked process is aborted, so a cascading grant
    /// cannot ready the process it is recovering from.
    pub fn forget_waiter(&mut self, id: ProcId) {
        for queue in self.waiting.values_mut() {
            queue.retain(|&waiter| waiter != id);
        }
    }

    /// True while every resource satisfies the conservation invariant
    pub fn is_conserved(&self) -> bool {
        self.resources.values().all(|res| {
            let allocated: u32 = res.allocation.values().sum();
            res.available <= res.capacity && res.available + allocated == res.capacity
        })
    }

    fn drain_waiters(
        &mut self,
        now: Tick,
        resource: ResourceId,
        table: &mut ProcessTable,
        sched: &mut dyn Scheduler,
        trace: &mut Trace,
    ) {
        loop {
            let head = self
                .waiting
                .get(&resource)
                .and_then(|queue| queue.front().copied());
            let Some(waiter) = head else {
                return;
            };

            // The waiter's cursor still sits on the request that blocked it
            let need = match table[waiter].current_instruction() {
                Some(&Instruction::Request { count, .. }) => count,
                _ => return,
            };

            let Some(res) = self.resources.get_mut(&resource) else {
                return;
            };
            if res.available < need {
                return;
            }

            res.available -= need;
            *res.allocation
                .entry(table[waiter].pid.clone())
                .or_insert(0) += need;
            if let Some(queue) = self.waiting.get_mut(&resource) {
                queue.pop_front();
            }

            let proc = &mut table[waiter];
            proc.block_reason = BlockReason::None;
            proc.blocked_on = None;
            proc.pc += 1;
            trace.record(
                now,
                TraceKind::Unblock {
                    pid: proc.pid.clone(),
                    resource,
                },
            );
            debug!(pid = %table[waiter].pid, resource = %resource, count = need, "waiter granted");
            sched.add(waiter, table);
        }
    }
}
