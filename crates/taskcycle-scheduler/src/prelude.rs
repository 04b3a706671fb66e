//! Prelude module for common scheduler types.
//!
//! This module provides a convenient way to import the most commonly used
//! types from the scheduler crate.

pub use crate::clock::{MonotonicClock, SystemClock, Timestamp};
pub use crate::control::{NoopThreadControl, RealtimeThreadControl};
pub use crate::deadline::DeadlineParams;
pub use crate::error::{RTError, RTResult, TaskError};
pub use crate::rt_setup::{RTSetup, SchedulingClass};
pub use crate::task::{PeriodicTask, TaskConfig, TaskMode, TaskReport, TaskState};
pub use crate::wait::BusyWait;
pub use crate::SystemThreadControl;
