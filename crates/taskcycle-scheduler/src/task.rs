//! Periodic task configuration and lifecycle.
//!
//! A [`PeriodicTask`] owns one dedicated OS thread. The thread applies the
//! task's [`RTSetup`], runs the cycle loop for the configured [`TaskMode`]
//! and hands its timing state back through [`PeriodicTask::join`].
//!
//! # Example
//!
//! ```no_run
//! use taskcycle_scheduler::{PeriodicTask, RTSetup, TaskConfig, TaskMode, BusyWait};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TaskConfig::new("control", 1_000_000)
//!     .with_mode(TaskMode::Busy(BusyWait::new(100)))
//!     .with_tolerance(0.005)
//!     .with_rt_setup(RTSetup::testing());
//!
//! let task = PeriodicTask::start(config, || {
//!     // per-cycle work
//! })?;
//!
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! task.request_stop();
//! let report = task.join()?;
//! println!("{:?}", report.summary()?);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::{self, JoinHandle};

use taskcycle_stats::{DistributionSummary, SampleBuffer, StatsResult, summarize};
use tracing::{debug, info, warn};

use crate::SystemThreadControl;
use crate::clock::SystemClock;
use crate::control::RealtimeThreadControl;
use crate::deadline::{DeadlineParams, run_deadline};
use crate::engine::{CycleEngine, CycleState, WaitStrategy, run_periodic};
use crate::error::{RTError, RTResult, TaskError};
use crate::rt_setup::{RTSetup, RtSetupReport, apply_rt_setup};
use crate::wait::BusyWait;

/// Default sample window size.
pub const DEFAULT_SAMPLE_CAPACITY: usize = 500;

/// Lifecycle state of a task thread.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Created, thread not yet configuring.
    Idle = 0,
    /// Applying real-time setup.
    Configuring = 1,
    /// Running cycles.
    Running = 2,
    /// Stop observed, finishing up.
    Stopping = 3,
    /// Thread finished.
    Terminated = 4,
}

impl TaskState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => TaskState::Idle,
            1 => TaskState::Configuring,
            2 => TaskState::Running,
            3 => TaskState::Stopping,
            _ => TaskState::Terminated,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Idle => "idle",
            TaskState::Configuring => "configuring",
            TaskState::Running => "running",
            TaskState::Stopping => "stopping",
            TaskState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// [`TaskState`] shared between a task thread and its observers.
#[derive(Debug, Clone, Default)]
pub struct SharedTaskState(Arc<AtomicU8>);

impl SharedTaskState {
    /// New shared state, `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn get(&self) -> TaskState {
        TaskState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Publish a new state.
    pub fn set(&self, state: TaskState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Cloneable handle that can stop a task from another thread, including
/// from inside its own callback.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Ask the task to stop after its current iteration.
    pub fn request_stop(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Whether the task is still asked to run.
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// How a task paces its cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskMode {
    /// Absolute-deadline sleep after each callback.
    Sleep,
    /// Spin until the deadline after each callback.
    Busy(BusyWait),
    /// Kernel deadline scheduling; no own waiting and no drift feedback.
    Deadline(DeadlineParams),
}

/// Periodic task configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    /// Task name; the thread is called `taskcycle-<name>`.
    pub name: String,
    /// Target period.
    pub period_ns: u64,
    /// Subtracted from the period to get the initial wait length.
    pub offset_ns: i64,
    /// Maximum relative drift before correction (negative = disabled).
    pub tolerance: f64,
    /// Pacing mode.
    pub mode: TaskMode,
    /// Thread properties applied before the first cycle.
    pub rt: RTSetup,
    /// Cycle-time window size; also the correction interval.
    pub sample_capacity: usize,
}

impl TaskConfig {
    /// A sleeping task with correction disabled and default RT setup.
    pub fn new(name: impl Into<String>, period_ns: u64) -> Self {
        Self {
            name: name.into(),
            period_ns,
            offset_ns: 0,
            tolerance: -1.0,
            mode: TaskMode::Sleep,
            rt: RTSetup::default(),
            sample_capacity: DEFAULT_SAMPLE_CAPACITY,
        }
    }

    /// Set the period offset.
    pub fn with_offset_ns(mut self, offset_ns: i64) -> Self {
        self.offset_ns = offset_ns;
        self
    }

    /// Set the drift tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the pacing mode.
    pub fn with_mode(mut self, mode: TaskMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the RT setup.
    pub fn with_rt_setup(mut self, rt: RTSetup) -> Self {
        self.rt = rt;
        self
    }

    /// Set the sample window size.
    pub fn with_sample_capacity(mut self, capacity: usize) -> Self {
        self.sample_capacity = capacity;
        self
    }

    /// Whether drift correction is enabled.
    pub fn correction_enabled(&self) -> bool {
        self.tolerance >= 0.0
    }

    /// Check the configuration before a thread is spawned.
    pub fn validate(&self) -> RTResult {
        if self.period_ns == 0 {
            return Err(RTError::InvalidConfig("period must be non-zero"));
        }
        let Ok(period) = i64::try_from(self.period_ns) else {
            return Err(RTError::InvalidConfig("period exceeds i64::MAX nanoseconds"));
        };
        if self.offset_ns >= period {
            return Err(RTError::InvalidConfig("offset must be smaller than the period"));
        }
        if self.tolerance.is_nan() {
            return Err(RTError::InvalidConfig("tolerance must be a number"));
        }
        if self.sample_capacity == 0 {
            return Err(RTError::InvalidConfig("sample capacity must be non-zero"));
        }
        match &self.mode {
            TaskMode::Sleep => {}
            TaskMode::Busy(params) => {
                if params.step_sleep == 0 {
                    return Err(RTError::InvalidConfig("step sleep must be non-zero"));
                }
            }
            TaskMode::Deadline(params) => {
                params.resolve(self.period_ns)?;
                // SCHED_DEADLINE admission needs the thread's mask to span
                // the whole root domain.
                if self.rt.cpu_affinity.is_some() {
                    return Err(RTError::InvalidConfig(
                        "deadline tasks cannot be pinned to a CPU",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Everything a task thread hands back when it finishes.
#[derive(Debug, Clone)]
pub struct TaskReport {
    /// Task name.
    pub name: String,
    /// Target period.
    pub period_ns: u64,
    /// Final timing state.
    pub cycle: CycleState,
    /// Last window of cycle times.
    pub samples: SampleBuffer,
    /// State the thread finished in.
    pub final_state: TaskState,
    /// What the RT setup achieved.
    pub setup: RtSetupReport,
    /// Fatal failure that ended the task, if any.
    pub error: Option<RTError>,
}

impl TaskReport {
    /// Distribution of the recorded cycle times against the target period.
    pub fn summary(&self) -> StatsResult<DistributionSummary> {
        summarize(&self.samples, self.period_ns)
    }
}

/// Handle to a running periodic task.
///
/// Dropping the handle without calling [`join`](Self::join) requests a stop
/// and waits for the thread.
#[derive(Debug)]
pub struct PeriodicTask {
    name: String,
    running: Arc<AtomicBool>,
    state: SharedTaskState,
    handle: Option<JoinHandle<TaskReport>>,
}

impl PeriodicTask {
    /// Start a task using the platform thread control.
    pub fn start<F>(config: TaskConfig, callback: F) -> Result<Self, TaskError>
    where
        F: FnMut() + Send + 'static,
    {
        Self::start_with(config, callback, SystemThreadControl::new())
    }

    /// Start a task using `control` for its thread properties.
    pub fn start_with<F, R>(config: TaskConfig, callback: F, control: R) -> Result<Self, TaskError>
    where
        F: FnMut() + Send + 'static,
        R: RealtimeThreadControl + 'static,
    {
        config.validate()?;

        let name = config.name.clone();
        let running = Arc::new(AtomicBool::new(true));
        let state = SharedTaskState::new();

        let thread_running = Arc::clone(&running);
        let thread_state = state.clone();
        let handle = thread::Builder::new()
            .name(format!("taskcycle-{name}"))
            .spawn(move || run_task(config, callback, control, &thread_running, &thread_state))?;

        Ok(Self {
            name,
            running,
            state,
            handle: Some(handle),
        })
    }

    /// Task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the thread to stop after its current iteration.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Whether the task is still asked to run.
    ///
    /// Turns false after [`request_stop`](Self::request_stop) or a fatal
    /// deadline setup failure.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.state.get()
    }

    /// Handle for stopping the task from elsewhere.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.running))
    }

    /// Wait for the thread to finish and collect its report.
    ///
    /// Does not request a stop; call [`request_stop`](Self::request_stop)
    /// first unless the task stops itself.
    pub fn join(mut self) -> Result<TaskReport, TaskError> {
        let Some(handle) = self.handle.take() else {
            return Err(TaskError::Panicked {
                name: self.name.clone(),
            });
        };

        match handle.join() {
            Ok(report) => Ok(report),
            Err(_panic) => {
                self.running.store(false, Ordering::Release);
                self.state.set(TaskState::Terminated);
                Err(TaskError::Panicked {
                    name: self.name.clone(),
                })
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.request_stop();
            if handle.join().is_err() {
                warn!("Task '{}' panicked", self.name);
            }
        }
    }
}

fn run_task<F, R>(
    config: TaskConfig,
    mut callback: F,
    control: R,
    running: &AtomicBool,
    state: &SharedTaskState,
) -> TaskReport
where
    F: FnMut(),
    R: RealtimeThreadControl,
{
    state.set(TaskState::Configuring);
    info!(
        "Task '{}' starting: period {} ns, offset {} ns, tolerance {}, {:?}",
        config.name, config.period_ns, config.offset_ns, config.tolerance, config.mode
    );

    let setup = apply_rt_setup(&control, &config.rt);
    if !setup.is_complete() {
        debug!(
            "Task '{}' runs with {} of {} RT properties",
            config.name,
            setup.applied.len(),
            setup.applied.len() + setup.failed.len()
        );
    }

    let clock = SystemClock;
    let mut engine = CycleEngine::from_config(&config);

    let error = match config.mode {
        TaskMode::Sleep => {
            run_periodic(&clock, &mut engine, WaitStrategy::Sleep, running, state, &mut callback);
            None
        }
        TaskMode::Busy(params) => {
            let strategy = WaitStrategy::Busy(params);
            run_periodic(&clock, &mut engine, strategy, running, state, &mut callback);
            None
        }
        TaskMode::Deadline(params) => params
            .resolve(config.period_ns)
            .and_then(|attr| {
                run_deadline(&clock, &control, &attr, &mut engine, running, state, &mut callback)
            })
            .err(),
    };

    state.set(TaskState::Stopping);
    let (cycle, samples) = engine.into_parts();
    info!(
        "Task '{}' stopped after {} iterations ({} corrections)",
        config.name, cycle.iterations, cycle.corrections
    );
    state.set(TaskState::Terminated);

    TaskReport {
        name: config.name,
        period_ns: config.period_ns,
        cycle,
        samples,
        final_state: TaskState::Terminated,
        setup,
        error,
    }
}
