//! Error types for the scheduler crate.

use std::fmt;
use std::io;

use taskcycle_stats::StatsError;
use thiserror::Error;

/// OS-level thread property an [`RTError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RtOp {
    /// CPU affinity (`sched_setaffinity`)
    Affinity,
    /// Priority range query (`sched_get_priority_max`)
    PriorityRange,
    /// Scheduling class and priority (`sched_setscheduler`)
    Scheduler,
    /// Nice value (`setpriority`)
    Nice,
    /// Timer slack hint (`prctl(PR_SET_TIMERSLACK)`)
    TimerSlack,
    /// Process-wide memory locking (`mlockall`)
    MemoryLock,
    /// Deadline scheduling policy (`sched_setattr(SCHED_DEADLINE)`)
    Deadline,
}

impl fmt::Display for RtOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RtOp::Affinity => "sched_setaffinity",
            RtOp::PriorityRange => "sched_get_priority_max",
            RtOp::Scheduler => "sched_setscheduler",
            RtOp::Nice => "setpriority",
            RtOp::TimerSlack => "prctl(PR_SET_TIMERSLACK)",
            RtOp::MemoryLock => "mlockall",
            RtOp::Deadline => "sched_setattr(SCHED_DEADLINE)",
        };
        f.write_str(name)
    }
}

/// Real-time error codes.
///
/// `Copy` so it can be reported from the task thread without allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RTError {
    /// An OS call failed with the given errno.
    #[error("{op} failed (errno {errno})")]
    Os {
        /// The property being applied.
        op: RtOp,
        /// Raw OS error number.
        errno: i32,
    },

    /// The property cannot be applied on this platform.
    #[error("{0} is not supported on this platform")]
    Unsupported(RtOp),

    /// Invalid configuration parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Statistics failure inside the task loop.
    #[error(transparent)]
    Stats(#[from] StatsError),
}

impl RTError {
    /// Build an [`RTError::Os`] from the calling thread's last OS error.
    pub fn last_os_error(op: RtOp) -> Self {
        RTError::Os {
            op,
            errno: io::Error::last_os_error().raw_os_error().unwrap_or(0),
        }
    }

    /// The underlying OS error, if any.
    pub fn os_error(&self) -> Option<io::Error> {
        match self {
            RTError::Os { errno, .. } => Some(io::Error::from_raw_os_error(*errno)),
            _ => None,
        }
    }

    /// Whether the failure is a missing privilege (`EPERM`).
    ///
    /// Unprivileged processes hit this for real-time classes and memory locking.
    pub fn is_permission_denied(&self) -> bool {
        self.os_error()
            .is_some_and(|e| e.kind() == io::ErrorKind::PermissionDenied)
    }
}

/// RT-safe result type
pub type RTResult<T = ()> = Result<T, RTError>;

/// Errors from the task lifecycle surface (start / join).
#[derive(Debug, Error)]
pub enum TaskError {
    /// The task configuration was rejected before the thread started.
    #[error("invalid task configuration: {0}")]
    InvalidConfig(#[from] RTError),

    /// The OS refused to spawn the task thread.
    #[error("failed to spawn task thread: {0}")]
    Spawn(#[from] io::Error),

    /// The task thread panicked (usually inside the callback).
    #[error("task thread '{name}' panicked")]
    Panicked {
        /// Task name.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_error_display() {
        let err = RTError::Os {
            op: RtOp::Scheduler,
            errno: 1,
        };
        assert_eq!(err.to_string(), "sched_setscheduler failed (errno 1)");
        assert!(err.is_permission_denied());
    }

    #[test]
    fn test_unsupported_display() {
        let err = RTError::Unsupported(RtOp::Deadline);
        assert_eq!(
            err.to_string(),
            "sched_setattr(SCHED_DEADLINE) is not supported on this platform"
        );
        assert!(err.os_error().is_none());
    }

    #[test]
    fn test_stats_error_is_transparent() {
        let err = RTError::from(StatsError::ZeroCapacity);
        assert_eq!(err.to_string(), "sample buffer has zero capacity");
    }

    #[test]
    fn test_task_error_from_config() {
        let err = TaskError::from(RTError::InvalidConfig("period must be non-zero"));
        assert_eq!(
            err.to_string(),
            "invalid task configuration: invalid configuration: period must be non-zero"
        );
    }
}
