//! Deadline-scheduling variant.
//!
//! Instead of waiting itself, the task asks the kernel for `runtime` of CPU
//! time every `period`, to be delivered within `deadline` of each period
//! start (`SCHED_DEADLINE`). The loop runs the callback and yields; the
//! kernel throttles the thread until its next reservation. Cycle times are
//! recorded but never fed back, because the kernel owns the period.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};

use crate::clock::MonotonicClock;
use crate::control::RealtimeThreadControl;
use crate::engine::CycleEngine;
use crate::error::{RTError, RTResult};
use crate::task::{SharedTaskState, TaskState};

/// Deadline reservation requested by a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineParams {
    /// CPU time reserved per period.
    pub runtime_ns: u64,
    /// Relative deadline (None = half the period).
    pub deadline_ns: Option<u64>,
}

impl DeadlineParams {
    /// Reserve `runtime_ns` per period with the default deadline.
    pub fn new(runtime_ns: u64) -> Self {
        Self {
            runtime_ns,
            deadline_ns: None,
        }
    }

    /// Set the relative deadline.
    pub fn with_deadline_ns(mut self, deadline_ns: u64) -> Self {
        self.deadline_ns = Some(deadline_ns);
        self
    }

    /// Resolve against a period, checking `0 < runtime <= deadline <= period`.
    pub fn resolve(&self, period_ns: u64) -> RTResult<DeadlineAttr> {
        let deadline_ns = self.deadline_ns.unwrap_or(period_ns / 2);

        if self.runtime_ns == 0 {
            return Err(RTError::InvalidConfig("deadline runtime must be non-zero"));
        }
        if self.runtime_ns > deadline_ns {
            return Err(RTError::InvalidConfig(
                "deadline runtime must not exceed the relative deadline",
            ));
        }
        if deadline_ns > period_ns {
            return Err(RTError::InvalidConfig(
                "relative deadline must not exceed the period",
            ));
        }

        Ok(DeadlineAttr {
            runtime_ns: self.runtime_ns,
            deadline_ns,
            period_ns,
        })
    }
}

/// Fully resolved deadline parameters, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineAttr {
    /// CPU time per period.
    pub runtime_ns: u64,
    /// Relative deadline.
    pub deadline_ns: u64,
    /// Reservation period.
    pub period_ns: u64,
}

/// Install the deadline policy and run the cooperative loop on the calling
/// thread until `running` is cleared.
///
/// If the policy cannot be installed the error is logged, `running` is
/// cleared and the callback is never invoked.
pub fn run_deadline<C, R, F>(
    clock: &C,
    control: &R,
    attr: &DeadlineAttr,
    engine: &mut CycleEngine,
    running: &AtomicBool,
    state: &SharedTaskState,
    callback: &mut F,
) -> RTResult
where
    C: MonotonicClock + ?Sized,
    R: RealtimeThreadControl + ?Sized,
    F: FnMut() + ?Sized,
{
    if let Err(e) = control.set_deadline(attr) {
        error!(
            "Failed to install deadline scheduling (runtime {} ns, deadline {} ns, period {} ns): {}",
            attr.runtime_ns, attr.deadline_ns, attr.period_ns, e
        );
        running.store(false, Ordering::Release);
        return Err(e);
    }

    info!(
        "Deadline scheduling installed (runtime {} ns, deadline {} ns, period {} ns)",
        attr.runtime_ns, attr.deadline_ns, attr.period_ns
    );

    let mut reference = clock.now();
    engine.begin(reference);
    state.set(TaskState::Running);

    while running.load(Ordering::Acquire) {
        let start = clock.now();
        callback();
        let now = clock.now();

        if let Err(e) = engine.record_unregulated(start, now, now.diff_ns(&reference)) {
            warn!("Failed to record cycle time: {}", e);
        }
        reference = now;

        control.yield_now();
    }

    Ok(())
}
