//! Periodic cycle engine with drift feedback.
//!
//! Each iteration invokes the callback, waits until `start + period_cmp`,
//! and pushes the measured cycle time into a [`SampleBuffer`]. Whenever the
//! buffer completes a traversal the window average is compared against the
//! target period. If the relative error exceeds the tolerance, `period_cmp`
//! is set to `period - (average - period)`.
//!
//! The corrector is a single proportional step without smoothing. It removes
//! a constant bias (callback overhead, wake-up latency) within one window.

use std::sync::atomic::{AtomicBool, Ordering};

use taskcycle_stats::SampleBuffer;
use tracing::{debug, warn};

use crate::clock::{MonotonicClock, Timestamp};
use crate::error::RTResult;
use crate::task::{SharedTaskState, TaskConfig, TaskState};
use crate::wait::{BusyWait, WaitOutcome, busy_wait, wait};

/// Timing state of a running task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleState {
    /// Start of the last iteration.
    pub timer: Timestamp,
    /// Clock reading at the end of the last wait.
    pub current: Timestamp,
    /// Absolute deadline of the last wait.
    pub deadline: Timestamp,
    /// Callback run time of the last iteration.
    pub exec_time_ns: i64,
    /// Full cycle time of the last iteration.
    pub cycle_time_ns: i64,
    /// Wait length currently applied after each callback.
    pub period_cmp_ns: i64,
    /// Completed iterations.
    pub iterations: u64,
    /// Drift corrections applied.
    pub corrections: u64,
}

impl CycleState {
    /// Fresh state waiting `period_cmp_ns` per cycle.
    pub fn new(period_cmp_ns: i64) -> Self {
        Self {
            timer: Timestamp::ZERO,
            current: Timestamp::ZERO,
            deadline: Timestamp::ZERO,
            exec_time_ns: 0,
            cycle_time_ns: 0,
            period_cmp_ns,
            iterations: 0,
            corrections: 0,
        }
    }
}

/// How the periodic loop waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Absolute-deadline sleep.
    Sleep,
    /// Spin until the deadline.
    Busy(BusyWait),
}

/// New wait length for a window average, or `None` when no correction
/// applies.
///
/// A negative tolerance disables correction.
pub fn drift_correction(period_ns: u64, tolerance: f64, average_ns: f64) -> Option<i64> {
    if tolerance < 0.0 || period_ns == 0 {
        return None;
    }

    let period = period_ns as f64;
    let diff = average_ns - period;
    if (diff / period).abs() > tolerance {
        Some((period - diff).round().max(0.0) as i64)
    } else {
        None
    }
}

/// Cycle state, sample window and feedback parameters of one task.
#[derive(Debug, Clone)]
pub struct CycleEngine {
    period_ns: u64,
    tolerance: f64,
    state: CycleState,
    samples: SampleBuffer,
}

impl CycleEngine {
    /// Create an engine. The initial wait length is `period_ns - offset_ns`.
    pub fn new(period_ns: u64, offset_ns: i64, tolerance: f64, sample_capacity: usize) -> Self {
        let period = i64::try_from(period_ns).unwrap_or(i64::MAX);
        Self {
            period_ns,
            tolerance,
            state: CycleState::new(period.saturating_sub(offset_ns)),
            samples: SampleBuffer::with_capacity(sample_capacity),
        }
    }

    /// Create an engine for `config`.
    pub fn from_config(config: &TaskConfig) -> Self {
        Self::new(
            config.period_ns,
            config.offset_ns,
            config.tolerance,
            config.sample_capacity,
        )
    }

    /// Target period.
    pub fn period_ns(&self) -> u64 {
        self.period_ns
    }

    /// Current wait length.
    pub fn period_cmp_ns(&self) -> i64 {
        self.state.period_cmp_ns
    }

    /// Timing state.
    pub fn state(&self) -> &CycleState {
        &self.state
    }

    /// Sample window.
    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }

    /// Push one cycle time and run the feedback step when the window wraps.
    ///
    /// Returns the new wait length if a correction was applied.
    pub fn record_cycle(&mut self, cycle_time_ns: i64) -> RTResult<Option<i64>> {
        let wrapped = self.samples.push(cycle_time_ns as f64)?;
        if !wrapped || self.tolerance < 0.0 {
            return Ok(None);
        }

        let average = self.samples.average()?;
        let Some(period_cmp) = drift_correction(self.period_ns, self.tolerance, average) else {
            return Ok(None);
        };

        debug!(
            "Drift correction: window average {:.0} ns vs period {} ns, wait {} -> {} ns",
            average, self.period_ns, self.state.period_cmp_ns, period_cmp
        );
        self.state.period_cmp_ns = period_cmp;
        self.state.corrections += 1;
        Ok(Some(period_cmp))
    }

    /// Record a completed wait. The wake-up time becomes the next start.
    pub fn record_wait(&mut self, outcome: &WaitOutcome) -> RTResult<Option<i64>> {
        self.state.current = outcome.woke_at;
        self.state.deadline = outcome.deadline;
        self.state.exec_time_ns = outcome.exec_time_ns;
        self.state.cycle_time_ns = outcome.cycle_time_ns;
        self.state.timer = outcome.woke_at;
        self.state.iterations += 1;
        self.record_cycle(outcome.cycle_time_ns)
    }

    /// Record one iteration without feedback.
    pub(crate) fn record_unregulated(
        &mut self,
        start: Timestamp,
        now: Timestamp,
        elapsed_ns: i64,
    ) -> RTResult {
        self.state.timer = start;
        self.state.current = now;
        self.state.exec_time_ns = now.diff_ns(&start);
        self.state.cycle_time_ns = elapsed_ns;
        self.state.iterations += 1;
        self.samples.push(elapsed_ns as f64)?;
        Ok(())
    }

    pub(crate) fn begin(&mut self, start: Timestamp) {
        self.state.timer = start;
        self.state.current = start;
    }

    /// Final state and samples.
    pub fn into_parts(self) -> (CycleState, SampleBuffer) {
        (self.state, self.samples)
    }
}

/// Run the periodic loop on the calling thread until `running` is cleared.
///
/// The flag is checked once per iteration, before the callback. A stop
/// request never interrupts a wait in progress.
pub fn run_periodic<C, F>(
    clock: &C,
    engine: &mut CycleEngine,
    strategy: WaitStrategy,
    running: &AtomicBool,
    state: &SharedTaskState,
    callback: &mut F,
) where
    C: MonotonicClock + ?Sized,
    F: FnMut() + ?Sized,
{
    if let WaitStrategy::Busy(params) = strategy
        && params.lazy_sleep_ns.is_some()
        && params.effective_lazy_sleep(engine.period_cmp_ns()).is_none()
    {
        debug!(
            "Lazy sleep {:?} ns is not shorter than the {} ns wait, spinning the whole cycle",
            params.lazy_sleep_ns,
            engine.period_cmp_ns()
        );
    }

    engine.begin(clock.now());
    state.set(TaskState::Running);

    while running.load(Ordering::Acquire) {
        callback();

        let start = engine.state().timer;
        let wait_ns = engine.period_cmp_ns();
        let outcome = match strategy {
            WaitStrategy::Sleep => wait(clock, &start, wait_ns),
            WaitStrategy::Busy(params) => busy_wait(clock, &start, wait_ns, &params),
        };

        if let Err(e) = engine.record_wait(&outcome) {
            warn!("Failed to record cycle time: {}", e);
        }
    }
}
