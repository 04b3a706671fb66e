//! Linux-specific platform implementation.

use core::mem;
use core::ptr;

use libc::{
    CLOCK_MONOTONIC, EINTR, MCL_CURRENT, MCL_FUTURE, PR_SET_TIMERSLACK, PRIO_PROCESS,
    TIMER_ABSTIME, c_int, c_long, clock_gettime, clock_nanosleep, cpu_set_t, id_t, mlockall,
    prctl, sched_get_priority_max, sched_param, sched_setaffinity, sched_setscheduler,
    sched_yield, setpriority, syscall, sysconf, time_t, timespec,
};

use crate::clock::Timestamp;
use crate::control::RealtimeThreadControl;
use crate::deadline::DeadlineAttr;
use crate::error::{RTError, RTResult, RtOp};
use crate::rt_setup::SchedulingClass;

/// Bits available in a `cpu_set_t`.
const CPU_SET_CAPACITY: usize = mem::size_of::<cpu_set_t>() * 8;

impl Timestamp {
    /// Convert to a `timespec` for the libc time APIs.
    pub fn to_timespec(&self) -> timespec {
        timespec {
            tv_sec: self.sec() as time_t,
            tv_nsec: self.nsec() as c_long,
        }
    }

    /// Convert from a `timespec`, normalizing out-of-range nanoseconds.
    pub fn from_timespec(ts: &timespec) -> Self {
        Timestamp::normalized(i64::from(ts.tv_sec), i64::from(ts.tv_nsec))
    }
}

pub(crate) fn monotonic_now() -> Timestamp {
    let mut ts = timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid, writable timespec for the duration of the call.
    // CLOCK_MONOTONIC is always available on Linux, so the call cannot fail.
    unsafe {
        clock_gettime(CLOCK_MONOTONIC, &mut ts);
    }
    Timestamp::from_timespec(&ts)
}

pub(crate) fn sleep_until(deadline: &Timestamp) {
    let ts = deadline.to_timespec();
    loop {
        // SAFETY: `ts` is a normalized absolute time. With TIMER_ABSTIME the
        // remainder pointer is never written, so null is allowed.
        let rc = unsafe { clock_nanosleep(CLOCK_MONOTONIC, TIMER_ABSTIME, &ts, ptr::null_mut()) };
        // An absolute deadline makes restarting after a signal exact.
        if rc != EINTR {
            break;
        }
    }
}

fn check(rc: c_int, op: RtOp) -> RTResult {
    if rc == 0 {
        Ok(())
    } else {
        Err(RTError::last_os_error(op))
    }
}

fn policy(class: SchedulingClass) -> c_int {
    match class {
        SchedulingClass::Other => libc::SCHED_OTHER,
        SchedulingClass::Fifo => libc::SCHED_FIFO,
        SchedulingClass::RoundRobin => libc::SCHED_RR,
        SchedulingClass::Batch => libc::SCHED_BATCH,
        SchedulingClass::Idle => libc::SCHED_IDLE,
    }
}

/// `struct sched_attr` from `linux/sched/types.h`.
///
/// libc exposes the syscall number but not the struct.
#[repr(C)]
#[derive(Debug, Default)]
struct SchedAttr {
    size: u32,
    sched_policy: u32,
    sched_flags: u64,
    sched_nice: i32,
    sched_priority: u32,
    sched_runtime: u64,
    sched_deadline: u64,
    sched_period: u64,
}

/// Thread control through libc.
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
        // SAFETY: sysconf has no preconditions.
        let n = unsafe { sysconf(libc::_SC_NPROCESSORS_ONLN) };
        usize::try_from(n).map_or(1, |n| n.max(1))
    }

    fn set_affinity(&self, cpu: usize) -> RTResult {
        if cpu >= CPU_SET_CAPACITY {
            return Err(RTError::InvalidConfig("CPU index exceeds cpu_set_t capacity"));
        }

        // SAFETY: an all-zero cpu_set_t is the empty set.
        let mut set: cpu_set_t = unsafe { mem::zeroed() };
        // SAFETY: `cpu` was bounds-checked against the set capacity above.
        unsafe { libc::CPU_SET(cpu, &mut set) };
        // SAFETY: `set` is initialized and the size matches its type. pid 0
        // targets the calling thread.
        let rc = unsafe { sched_setaffinity(0, mem::size_of::<cpu_set_t>(), &set) };
        check(rc, RtOp::Affinity)
    }

    fn max_priority(&self, class: SchedulingClass) -> RTResult<i32> {
        // SAFETY: sched_get_priority_max only reads its integer argument.
        let max = unsafe { sched_get_priority_max(policy(class)) };
        if max < 0 {
            return Err(RTError::last_os_error(RtOp::PriorityRange));
        }
        Ok(max)
    }

    fn set_scheduler(&self, class: SchedulingClass, priority: i32) -> RTResult {
        let param = sched_param {
            sched_priority: priority,
        };
        // SAFETY: `param` outlives the call. pid 0 targets the calling thread.
        let rc = unsafe { sched_setscheduler(0, policy(class), &param) };
        check(rc, RtOp::Scheduler)
    }

    fn set_nice(&self, nice: i32) -> RTResult {
        // SAFETY: gettid has no preconditions.
        let tid = unsafe { syscall(libc::SYS_gettid) };
        let Ok(tid) = id_t::try_from(tid) else {
            return Err(RTError::InvalidConfig("thread id out of range"));
        };
        // On Linux PRIO_PROCESS with a thread id changes only that thread.
        // SAFETY: plain integer arguments.
        let rc = unsafe { setpriority(PRIO_PROCESS, tid, nice) };
        check(rc, RtOp::Nice)
    }

    fn set_timer_slack(&self, slack_ns: u64) -> RTResult {
        // Saturates where `c_ulong` is 32 bits wide.
        let slack = libc::c_ulong::try_from(slack_ns).unwrap_or(libc::c_ulong::MAX);
        // SAFETY: PR_SET_TIMERSLACK takes one integer argument and touches no
        // caller memory.
        let rc = unsafe { prctl(PR_SET_TIMERSLACK, slack) };
        check(rc, RtOp::TimerSlack)
    }

    fn lock_memory(&self) -> RTResult {
        // SAFETY: mlockall only takes flags.
        let rc = unsafe { mlockall(MCL_CURRENT | MCL_FUTURE) };
        check(rc, RtOp::MemoryLock)
    }

    fn set_deadline(&self, attr: &DeadlineAttr) -> RTResult {
        let Ok(policy) = u32::try_from(libc::SCHED_DEADLINE) else {
            return Err(RTError::Unsupported(RtOp::Deadline));
        };
        let sched_attr = SchedAttr {
            size: mem::size_of::<SchedAttr>() as u32,
            sched_policy: policy,
            sched_runtime: attr.runtime_ns,
            sched_deadline: attr.deadline_ns,
            sched_period: attr.period_ns,
            ..SchedAttr::default()
        };
        // SAFETY: `sched_attr` is a correctly sized, initialized sched_attr and
        // outlives the call. pid 0 targets the calling thread; flags are 0.
        let rc = unsafe {
            syscall(
                libc::SYS_sched_setattr,
                0 as libc::pid_t,
                &sched_attr as *const SchedAttr,
                0 as libc::c_uint,
            )
        };
        if rc == 0 {
            Ok(())
        } else {
            Err(RTError::last_os_error(RtOp::Deadline))
        }
    }

    fn yield_now(&self) {
        // SAFETY: sched_yield has no preconditions.
        unsafe {
            sched_yield();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rt_setup::{RTSetup, apply_rt_setup};
    use taskcycle_test_helpers::prelude::*;

    #[test]
    fn test_timespec_round_trip() {
        let ts = Timestamp::normalized(12, 345_678_901);
        assert_eq!(Timestamp::from_timespec(&ts.to_timespec()), ts);
    }

    #[test]
    fn test_online_cpus_at_least_one() {
        assert!(SystemThreadControl::new().online_cpus() >= 1);
    }

    #[test]
    fn test_max_priority_fifo_is_positive() {
        let max = must(SystemThreadControl::new().max_priority(SchedulingClass::Fifo));
        assert!(max > 0);
    }

    #[test]
    fn test_timer_slack_unprivileged() {
        must(SystemThreadControl::new().set_timer_slack(1));
    }

    #[test]
    fn test_timer_slack_accepts_full_u64_range() {
        let control = SystemThreadControl::new();
        must(control.set_timer_slack(u64::MAX));
        must(control.set_timer_slack(1));
    }

    #[test]
    fn test_affinity_out_of_range_rejected() {
        let err = SystemThreadControl::new().set_affinity(CPU_SET_CAPACITY);
        assert!(matches!(err, Err(RTError::InvalidConfig(_))));
    }

    #[test]
    fn test_testing_setup_applies_unprivileged() {
        let report = apply_rt_setup(&SystemThreadControl::new(), &RTSetup::testing());
        assert!(report.is_complete(), "{:?}", report.failed);
    }
}
