//! The discrete-time simulation engine.
//!
//! One logical CPU, one global clock. Each tick runs a fixed stage order:
//! arrivals, IO progress, aging, dispatch, deadlock detection, execution of
//! one unit of the running process's current instruction. Everything is
//! driven synchronously from here; blocking is nothing but state on the
//! process records.

use tracing::{debug, info};

use crate::metrics::MetricsReport;
use crate::process::{BlockReason, Instruction, ProcessState, ProcessTable, Workload};
use crate::resources::ResourceManager;
use crate::scheduler::Scheduler;
use crate::trace::{Trace, TraceKind};
use crate::types::{ProcId, Tick};

/// Everything a finished run leaves behind.
#[derive(Debug)]
pub struct SimulationReport {
    /// The per-tick event record
    pub trace: Trace,
    /// Per-process metrics and the aggregate summary
    pub metrics: MetricsReport,
    /// Ticks the run took
    pub elapsed: Tick,
}

/// The simulator, generic over the scheduling policy it drives.
pub struct Simulation<S: Scheduler> {
    table: ProcessTable,
    resources: ResourceManager,
    scheduler: S,
    now: Tick,
    /// Process on the CPU, if any
    running: Option<ProcId>,
    /// CPU ticks consumed by `running` since its last dispatch
    burst_executed: u32,
    completed: usize,
    trace: Trace,
}

impl<S: Scheduler> Simulation<S> {
    pub fn new(workload: Workload, scheduler: S) -> Simulation<S> {
        let mut table = ProcessTable::new();
        for proc in workload.processes {
            table.push(proc);
        }
        Simulation {
            table,
            resources: ResourceManager::new(&workload.capacities),
            scheduler,
            now: 0,
            running: None,
            burst_executed: 0,
            completed: 0,
            trace: Trace::new(),
        }
    }

    /// Runs to completion and returns the report
    pub fn run(mut self) -> SimulationReport {
        while self.step() {}
        self.into_report()
    }

    /// Advances one tick; returns false once every process has terminated.
    ///
    /// Exposed so tests can inspect state at tick boundaries.
    pub fn step(&mut self) -> bool {
        if self.completed >= self.table.len() {
            return false;
        }
        self.tick();
        debug_assert!(self.resources.is_conserved());
        self.completed < self.table.len()
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn table(&self) -> &ProcessTable {
        &self.table
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn running(&self) -> Option<ProcId> {
        self.running
    }

    pub fn into_report(self) -> SimulationReport {
        SimulationReport {
            metrics: MetricsReport::collect(&self.table, self.now),
            trace: self.trace,
            elapsed: self.now,
        }
    }

    fn tick(&mut self) {
        self.scheduler.set_time(self.now);
        self.admit_arrivals();
        self.advance_io();
        if self.scheduler.apply_aging(&mut self.table) {
            self.trace.record(self.now, TraceKind::Boost);
            info!(tick = self.now, "boost");
        }
        self.dispatch();
        self.detect_deadlock();
        self.execute();
        self.now += 1;
    }

    /// Stage 1: processes whose arrival time is now become ready
    fn admit_arrivals(&mut self) {
        for id in self.table.ids() {
            if self.table[id].state == ProcessState::New && self.table[id].arrival_time == self.now
            {
                debug!(pid = %self.table[id].pid, tick = self.now, "arrival");
                self.scheduler.add(id, &mut self.table);
            }
        }
    }

    /// Stage 2: IO waiters progress by one unit and wake when done
    fn advance_io(&mut self) {
        for id in self.table.ids() {
            let proc = &mut self.table[id];
            if proc.state != ProcessState::Blocked || proc.block_reason != BlockReason::WaitingIo {
                continue;
            }
            proc.remaining -= 1;
            proc.total_io_time += 1;
            if proc.remaining == 0 {
                proc.pc += 1;
                proc.block_reason = BlockReason::None;
                debug!(pid = %proc.pid, tick = self.now, "io complete");
                self.scheduler.add(id, &mut self.table);
            }
        }
    }

    /// Stage 4: put a process on the idle CPU
    fn dispatch(&mut self) {
        if self.running.is_some() {
            return;
        }
        self.running = self.scheduler.next();
        self.burst_executed = 0;

        if let Some(id) = self.running {
            let proc = &mut self.table[id];
            proc.state = ProcessState::Running;
            if proc.start_time.is_none() {
                proc.start_time = Some(self.now);
            }
            // A fresh CPU op gets its countdown here; a preempted one
            // carries its remainder over
            if let Some(&Instruction::Cpu { duration }) = proc.current_instruction() {
                if proc.remaining == 0 {
                    proc.remaining = duration;
                }
            }
            debug!(pid = %proc.pid, tick = self.now, "dispatch");
        }
    }

    /// Stage 5: a stalled system with only resource waiters cannot recover
    /// by itself; abort the earliest-loaded waiter and return its units.
    fn detect_deadlock(&mut self) {
        if self.running.is_some() || self.scheduler.has_ready() {
            return;
        }

        let mut resource_waiters = Vec::new();
        let mut any_io = false;
        for id in self.table.ids() {
            let proc = &self.table[id];
            if proc.state != ProcessState::Blocked {
                continue;
            }
            match proc.block_reason {
                BlockReason::WaitingResource => resource_waiters.push(id),
                BlockReason::WaitingIo => any_io = true,
                BlockReason::None => {}
            }
        }

        // An IO waiter will become ready on its own timer, so the stall
        // is not a deadlock
        if resource_waiters.is_empty() || any_io {
            return;
        }

        let victim = resource_waiters[0];
        self.trace.record(self.now, TraceKind::DeadlockDetected);
        self.trace.record(
            self.now,
            TraceKind::Abort {
                pid: self.table[victim].pid.clone(),
            },
        );
        info!(victim = %self.table[victim].pid, tick = self.now, "deadlock, aborting victim");

        // Detach the victim from its own wait queue first, so the cascade
        // below cannot grant and re-ready a process being aborted
        self.resources.forget_waiter(victim);
        self.resources.release_all(
            self.now,
            victim,
            &mut self.table,
            &mut self.scheduler,
            &mut self.trace,
        );

        let proc = &mut self.table[victim];
        proc.state = ProcessState::Terminated;
        proc.block_reason = BlockReason::None;
        proc.blocked_on = None;
        proc.finish_time = Some(self.now);
        self.completed += 1;
    }

    /// Stage 6: execute one unit of the running process's instruction
    fn execute(&mut self) {
        let Some(id) = self.running else {
            self.trace.record(self.now, TraceKind::Idle);
            return;
        };

        if self.table[id].program_ended() {
            let proc = &mut self.table[id];
            proc.state = ProcessState::Terminated;
            proc.finish_time = Some(self.now);
            debug!(pid = %proc.pid, tick = self.now, "terminated");
            self.running = None;
            self.completed += 1;
            return;
        }

        let instruction = self.table[id].program[self.table[id].pc];
        match instruction {
            Instruction::Cpu { .. } => self.execute_cpu(id),
            Instruction::Io { duration } => {
                let proc = &mut self.table[id];
                proc.state = ProcessState::Blocked;
                proc.block_reason = BlockReason::WaitingIo;
                proc.remaining = duration;
                self.trace.record(
                    self.now,
                    TraceKind::BlockIo {
                        pid: self.table[id].pid.clone(),
                    },
                );
                self.running = None;
            }
            Instruction::Request { resource, count } => {
                self.trace.record(
                    self.now,
                    TraceKind::Request {
                        pid: self.table[id].pid.clone(),
                        resource,
                        count,
                    },
                );
                if self.resources.request(id, &self.table, resource, count) {
                    self.table[id].pc += 1;
                    self.scheduler.add(id, &mut self.table);
                } else {
                    let proc = &mut self.table[id];
                    proc.state = ProcessState::Blocked;
                    proc.block_reason = BlockReason::WaitingResource;
                    proc.blocked_on = Some(resource);
                    self.trace.record(
                        self.now,
                        TraceKind::BlockedOnResource {
                            pid: self.table[id].pid.clone(),
                            resource,
                        },
                    );
                }
                self.running = None;
            }
            Instruction::Release { resource, count } => {
                self.trace.record(
                    self.now,
                    TraceKind::Release {
                        pid: self.table[id].pid.clone(),
                        resource,
                        count,
                    },
                );
                self.resources.release(
                    self.now,
                    id,
                    resource,
                    count,
                    &mut self.table,
                    &mut self.scheduler,
                    &mut self.trace,
                );
                self.table[id].pc += 1;
                self.scheduler.add(id, &mut self.table);
                self.running = None;
            }
        }
    }

    fn execute_cpu(&mut self, id: ProcId) {
        self.trace.record(
            self.now,
            TraceKind::Running {
                pid: self.table[id].pid.clone(),
            },
        );

        let proc = &mut self.table[id];
        proc.remaining -= 1;
        proc.total_cpu_time += 1;
        self.burst_executed += 1;

        if self.table[id].remaining == 0 {
            let proc = &mut self.table[id];
            proc.pc += 1;
            if proc.program_ended() {
                proc.state = ProcessState::Terminated;
                proc.finish_time = Some(self.now + 1);
                debug!(pid = %proc.pid, tick = self.now, "terminated");
                self.completed += 1;
            } else {
                self.scheduler.add(id, &mut self.table);
            }
            self.running = None;
        } else if self
            .scheduler
            .should_preempt(id, self.burst_executed, &mut self.table)
        {
            debug!(
                pid = %self.table[id].pid,
                tick = self.now,
                executed = self.burst_executed,
                "preempt"
            );
            self.scheduler.add(id, &mut self.table);
            self.running = None;
        }
    }
}
