//! The scheduling policies.
//!
//! Each policy lives in its own file and is exported here. All three share
//! the [`Scheduler`](crate::Scheduler) contract; the engine never knows
//! which one it is driving.

mod round_robin;
pub use round_robin::RoundRobin;

mod priority;
pub use priority::Priority;

mod multilevel;
pub use multilevel::MultilevelFeedback;
