//! Real-time periodic task execution with drift correction.
//!
//! A periodic task invokes a callback once per period on a dedicated OS
//! thread and keeps the cycle as close to the period as the platform allows:
//!
//! - **clock**: monotonic [`Timestamp`] arithmetic and the [`MonotonicClock`] seam
//! - **wait**: absolute-deadline sleep and busy-wait strategies
//! - **RTSetup**: scheduling class, priority, CPU affinity, nice value, timer
//!   slack and memory locking through [`RealtimeThreadControl`]
//! - **CycleEngine**: cycle-time window with one-step proportional drift
//!   correction
//! - **deadline**: `SCHED_DEADLINE` cooperative variant
//! - **PeriodicTask**: thread lifecycle, stop and join
//!
//! # RT-Safety Guarantees
//!
//! - **No heap allocations** in the cycle loop; the sample window is
//!   allocated before the thread starts
//! - **Absolute deadlines**: callback run time never accumulates as drift
//! - **Best-effort setup**: a refused RT property is logged and skipped
//!
//! # Example
//!
//! ```no_run
//! use taskcycle_scheduler::{PeriodicTask, RTSetup, TaskConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TaskConfig::new("sensor", 2_000_000)
//!     .with_tolerance(0.01)
//!     .with_rt_setup(RTSetup::default().with_cpu_affinity(0));
//!
//! let task = PeriodicTask::start(config, || {
//!     // Process real-time work here
//! })?;
//!
//! task.request_stop();
//! let report = task.join()?;
//! assert!(report.error.is_none());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]

pub mod clock;
pub mod control;
pub mod deadline;
pub mod engine;
pub mod error;
pub mod rt_setup;
pub mod task;
pub mod wait;

#[cfg(target_os = "linux")]
#[allow(unsafe_code, reason = "libc clock, scheduling and memory-lock calls")]
mod linux;
#[cfg(target_os = "linux")]
use linux as platform;

#[cfg(not(target_os = "linux"))]
mod fallback;
#[cfg(not(target_os = "linux"))]
use fallback as platform;

pub mod prelude;

pub use clock::{MonotonicClock, NANOS_PER_SEC, SimulatedClock, SystemClock, Timestamp};
pub use control::{NoopThreadControl, RealtimeThreadControl};
pub use deadline::{DeadlineAttr, DeadlineParams};
pub use engine::{CycleEngine, CycleState, WaitStrategy};
pub use error::{RTError, RTResult, RtOp, TaskError};
pub use platform::SystemThreadControl;
pub use rt_setup::{RTSetup, RtSetupReport, SchedulingClass};
pub use task::{PeriodicTask, StopHandle, TaskConfig, TaskMode, TaskReport, TaskState};
pub use wait::{BusyWait, WaitOutcome};
