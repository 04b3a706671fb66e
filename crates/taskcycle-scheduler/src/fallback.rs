//! Fallback platform implementation for non-Linux systems.
//!
//! The clock is an `Instant` measured from a process-wide epoch, so readings
//! stay comparable across threads. Real-time thread properties are reported
//! as unsupported.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::clock::Timestamp;
use crate::control::RealtimeThreadControl;
use crate::deadline::DeadlineAttr;
use crate::error::{RTError, RTResult, RtOp};
use crate::rt_setup::SchedulingClass;

static EPOCH: OnceLock<Instant> = OnceLock::new();

fn epoch() -> Instant {
    *EPOCH.get_or_init(Instant::now)
}

pub(crate) fn monotonic_now() -> Timestamp {
    let elapsed = epoch().elapsed();
    Timestamp::normalized(
        i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
        i64::from(elapsed.subsec_nanos()),
    )
}

pub(crate) fn sleep_until(deadline: &Timestamp) {
    let now = monotonic_now();
    let remaining = deadline.diff_ns(&now);
    if remaining > 0 {
        std::thread::sleep(Duration::from_nanos(remaining.unsigned_abs()));
    }
}

/// Thread control for platforms without a real-time backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemThreadControl;

impl SystemThreadControl {
    /// Create new thread control instance.
    pub fn new() -> Self {
        Self
    }
}

impl RealtimeThreadControl for SystemThreadControl {
    fn online_cpus(&self) -> usize {
        std::thread::available_parallelism().map_or(1, |n| n.get())
    }

    fn set_affinity(&self, _cpu: usize) -> RTResult {
        Err(RTError::Unsupported(RtOp::Affinity))
    }

    fn max_priority(&self, _class: SchedulingClass) -> RTResult<i32> {
        Err(RTError::Unsupported(RtOp::PriorityRange))
    }

    fn set_scheduler(&self, _class: SchedulingClass, _priority: i32) -> RTResult {
        Err(RTError::Unsupported(RtOp::Scheduler))
    }

    fn set_nice(&self, _nice: i32) -> RTResult {
        Err(RTError::Unsupported(RtOp::Nice))
    }

    fn set_timer_slack(&self, _slack_ns: u64) -> RTResult {
        Err(RTError::Unsupported(RtOp::TimerSlack))
    }

    fn lock_memory(&self) -> RTResult {
        Err(RTError::Unsupported(RtOp::MemoryLock))
    }

    fn set_deadline(&self, _attr: &DeadlineAttr) -> RTResult {
        Err(RTError::Unsupported(RtOp::Deadline))
    }

    fn yield_now(&self) {
        std::thread::yield_now();
    }
}
