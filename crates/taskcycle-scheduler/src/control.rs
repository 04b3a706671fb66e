//! OS thread property control.
//!
//! [`RealtimeThreadControl`] is the seam between the task engine and the
//! operating system. All methods act on the calling thread (or, for memory
//! locking, the whole process), so an implementation is used from inside
//! the task thread it configures.

use crate::deadline::DeadlineAttr;
use crate::error::RTResult;
use crate::rt_setup::SchedulingClass;

/// Per-thread real-time property control.
pub trait RealtimeThreadControl: Send {
    /// Number of online CPUs.
    fn online_cpus(&self) -> usize;

    /// Pin the calling thread to `cpu`.
    fn set_affinity(&self, cpu: usize) -> RTResult;

    /// Highest static priority allowed for `class`.
    fn max_priority(&self, class: SchedulingClass) -> RTResult<i32>;

    /// Switch the calling thread to `class` at `priority`.
    fn set_scheduler(&self, class: SchedulingClass, priority: i32) -> RTResult;

    /// Set the calling thread's nice value.
    fn set_nice(&self, nice: i32) -> RTResult;

    /// Set the calling thread's timer slack.
    fn set_timer_slack(&self, slack_ns: u64) -> RTResult;

    /// Lock current and future process memory.
    fn lock_memory(&self) -> RTResult;

    /// Install the deadline scheduling policy on the calling thread.
    fn set_deadline(&self, attr: &DeadlineAttr) -> RTResult;

    /// Give up the remainder of the current time slice.
    fn yield_now(&self);
}

/// Accepts every request and changes nothing.
///
/// For callers that must not touch process-wide state (tests, unprivileged
/// demos). With this control the deadline variant degrades to a yield loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopThreadControl;

impl RealtimeThreadControl for NoopThreadControl {
    fn online_cpus(&self) -> usize {
        std::thread::available_parallelism().map_or(1, |n| n.get())
    }

    fn set_affinity(&self, _cpu: usize) -> RTResult {
        Ok(())
    }

    fn max_priority(&self, _class: SchedulingClass) -> RTResult<i32> {
        Ok(0)
    }

    fn set_scheduler(&self, _class: SchedulingClass, _priority: i32) -> RTResult {
        Ok(())
    }

    fn set_nice(&self, _nice: i32) -> RTResult {
        Ok(())
    }

    fn set_timer_slack(&self, _slack_ns: u64) -> RTResult {
        Ok(())
    }

    fn lock_memory(&self) -> RTResult {
        Ok(())
    }

    fn set_deadline(&self, _attr: &DeadlineAttr) -> RTResult {
        Ok(())
    }

    fn yield_now(&self) {
        std::thread::yield_now();
    }
}
