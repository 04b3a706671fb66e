//! Real-time setup configuration.

use tracing::{debug, warn};

use crate::control::RealtimeThreadControl;
use crate::error::{RTError, RTResult, RtOp};

/// OS scheduling class for a task thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulingClass {
    /// Default time-sharing (`SCHED_OTHER`).
    Other,
    /// Real-time first-in first-out (`SCHED_FIFO`).
    Fifo,
    /// Real-time round robin (`SCHED_RR`).
    RoundRobin,
    /// CPU-bound batch (`SCHED_BATCH`).
    Batch,
    /// Very low priority background (`SCHED_IDLE`).
    Idle,
}

/// Real-time setup configuration.
///
/// Applied once by the task thread before its first cycle. Every property is
/// best effort: a failure is logged and recorded in the [`RtSetupReport`]
/// and the task runs without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RTSetup {
    /// Scheduling class (None = leave the inherited class).
    pub scheduling: Option<SchedulingClass>,

    /// Priority below the class maximum.
    ///
    /// The thread priority is `max_priority(class) - priority_offset`.
    pub priority_offset: i32,

    /// CPU index counted down from the highest-numbered online CPU
    /// (None = no affinity).
    ///
    /// Index 0 pins to the last CPU, index 1 to the one before it, and so
    /// on, wrapping modulo the CPU count.
    pub cpu_affinity: Option<usize>,

    /// Nice value for the thread (None = unchanged).
    pub nice: Option<i32>,

    /// Timer slack in nanoseconds (None = unchanged).
    ///
    /// A slack of 1 ns disables the kernel's timer coalescing for the thread.
    pub timer_slack_ns: Option<u64>,

    /// Lock all current and future pages of the process.
    pub lock_memory: bool,
}

impl Default for RTSetup {
    fn default() -> Self {
        Self {
            scheduling: Some(SchedulingClass::Fifo),
            priority_offset: 0,
            cpu_affinity: None,
            nice: None,
            timer_slack_ns: Some(1),
            lock_memory: true,
        }
    }
}

impl RTSetup {
    /// Create a new RTSetup with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a minimal RTSetup (no special configuration).
    pub fn minimal() -> Self {
        Self {
            scheduling: None,
            priority_offset: 0,
            cpu_affinity: None,
            nice: None,
            timer_slack_ns: None,
            lock_memory: false,
        }
    }

    /// Create RTSetup suitable for unprivileged runs.
    pub fn testing() -> Self {
        Self {
            timer_slack_ns: Some(1),
            ..Self::minimal()
        }
    }

    /// Set the scheduling class.
    pub fn with_scheduling(mut self, class: SchedulingClass) -> Self {
        self.scheduling = Some(class);
        self
    }

    /// Set the priority offset below the class maximum.
    pub fn with_priority_offset(mut self, offset: i32) -> Self {
        self.priority_offset = offset;
        self
    }

    /// Set the CPU affinity index.
    pub fn with_cpu_affinity(mut self, index: usize) -> Self {
        self.cpu_affinity = Some(index);
        self
    }

    /// Set the nice value.
    pub fn with_nice(mut self, nice: i32) -> Self {
        self.nice = Some(nice);
        self
    }

    /// Set the timer slack.
    pub fn with_timer_slack_ns(mut self, slack_ns: u64) -> Self {
        self.timer_slack_ns = Some(slack_ns);
        self
    }

    /// Set memory locking.
    pub fn with_lock_memory(mut self, enabled: bool) -> Self {
        self.lock_memory = enabled;
        self
    }

    /// Check if any RT features are enabled.
    pub fn has_rt_features(&self) -> bool {
        self.scheduling.is_some()
            || self.cpu_affinity.is_some()
            || self.nice.is_some()
            || self.timer_slack_ns.is_some()
            || self.lock_memory
    }
}

/// Map an affinity index onto a CPU number, counting down from the last
/// online CPU.
pub fn affinity_cpu(index: usize, online_cpus: usize) -> Option<usize> {
    let last = online_cpus.checked_sub(1)?;
    Some(last - index % online_cpus)
}

/// Outcome of applying an [`RTSetup`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RtSetupReport {
    /// Properties that were applied.
    pub applied: Vec<RtOp>,
    /// Properties that failed, with the error.
    pub failed: Vec<RTError>,
}

impl RtSetupReport {
    /// Whether every requested property was applied.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, op: RtOp, result: RTResult) {
        match result {
            Ok(()) => {
                debug!("Applied {}", op);
                self.applied.push(op);
            }
            Err(e) => {
                warn!("Failed to apply {}: {} (continuing without it)", op, e);
                self.failed.push(e);
            }
        }
    }
}

/// Apply `setup` to the calling thread.
///
/// Order: affinity, scheduling class, nice value, timer slack, memory
/// locking. A failure never stops the remaining properties.
pub fn apply_rt_setup<R>(control: &R, setup: &RTSetup) -> RtSetupReport
where
    R: RealtimeThreadControl + ?Sized,
{
    let mut report = RtSetupReport::default();

    if let Some(index) = setup.cpu_affinity {
        let result = match affinity_cpu(index, control.online_cpus()) {
            Some(cpu) => {
                debug!("Pinning to CPU {} (affinity index {})", cpu, index);
                control.set_affinity(cpu)
            }
            None => Err(RTError::InvalidConfig("no online CPUs reported")),
        };
        report.record(RtOp::Affinity, result);
    }

    if let Some(class) = setup.scheduling {
        let result = control.max_priority(class).and_then(|max| {
            let priority = max.saturating_sub(setup.priority_offset);
            debug!("Scheduling class {:?} at priority {}", class, priority);
            control.set_scheduler(class, priority)
        });
        report.record(RtOp::Scheduler, result);
    }

    if let Some(nice) = setup.nice {
        report.record(RtOp::Nice, control.set_nice(nice));
    }

    if let Some(slack) = setup.timer_slack_ns {
        report.record(RtOp::TimerSlack, control.set_timer_slack(slack));
    }

    if setup.lock_memory {
        report.record(RtOp::MemoryLock, control.lock_memory());
    }

    report
}
