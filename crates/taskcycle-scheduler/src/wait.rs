//! Wait strategies.
//!
//! Both strategies measure from a reference start timestamp (the start of
//! the current cycle) and block until `start + wait_ns`. The deadline is
//! absolute, so time spent in the callback is absorbed instead of
//! accumulating as drift.

use crate::clock::{MonotonicClock, Timestamp};

/// Busy-wait tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyWait {
    /// Coarse sleep before spinning, measured from the cycle start.
    ///
    /// Ignored when not strictly shorter than the wait length.
    pub lazy_sleep_ns: Option<u64>,

    /// Spin iterations between forced micro-sleeps.
    pub step_sleep: u16,
}

impl Default for BusyWait {
    fn default() -> Self {
        Self {
            lazy_sleep_ns: None,
            step_sleep: 100,
        }
    }
}

impl BusyWait {
    /// Spin with a micro-sleep every `step_sleep` iterations.
    pub fn new(step_sleep: u16) -> Self {
        Self {
            lazy_sleep_ns: None,
            step_sleep,
        }
    }

    /// Set the lazy sleep.
    pub fn with_lazy_sleep_ns(mut self, lazy_sleep_ns: u64) -> Self {
        self.lazy_sleep_ns = Some(lazy_sleep_ns);
        self
    }

    /// Lazy sleep that applies to a wait of `wait_ns`, if any.
    pub fn effective_lazy_sleep(&self, wait_ns: i64) -> Option<i64> {
        self.lazy_sleep_ns
            .and_then(|lazy| i64::try_from(lazy).ok())
            .filter(|&lazy| lazy < wait_ns)
    }
}

/// Timing of one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOutcome {
    /// Time from the cycle start to entering the wait (callback run time).
    pub exec_time_ns: i64,
    /// Time from the cycle start to leaving the wait.
    pub cycle_time_ns: i64,
    /// Absolute deadline the wait targeted.
    pub deadline: Timestamp,
    /// Clock reading on leaving the wait.
    pub woke_at: Timestamp,
}

/// Block in the OS until `start + wait_ns`.
pub fn wait<C: MonotonicClock + ?Sized>(clock: &C, start: &Timestamp, wait_ns: i64) -> WaitOutcome {
    let entered = clock.now();
    let deadline = start.with_offset(wait_ns);

    clock.sleep_until(&deadline);

    let woke_at = clock.now();
    WaitOutcome {
        exec_time_ns: entered.diff_ns(start),
        cycle_time_ns: woke_at.diff_ns(start),
        deadline,
        woke_at,
    }
}

/// Spin until `start + wait_ns`.
///
/// When configured, first sleeps until `start + lazy_sleep_ns`. While
/// spinning, every `step_sleep` iterations sleeps until the current reading,
/// which yields the CPU for one timer tick at most. Never returns before the
/// deadline.
pub fn busy_wait<C: MonotonicClock + ?Sized>(
    clock: &C,
    start: &Timestamp,
    wait_ns: i64,
    params: &BusyWait,
) -> WaitOutcome {
    let entered = clock.now();
    let deadline = start.with_offset(wait_ns);

    if let Some(lazy) = params.effective_lazy_sleep(wait_ns) {
        clock.sleep_until(&start.with_offset(lazy));
    }

    let mut current = entered;
    let mut counter: u16 = 0;
    while current.before(&deadline) {
        std::hint::spin_loop();
        current = clock.now();

        counter = counter.saturating_add(1);
        if counter > params.step_sleep {
            counter = 0;
            clock.sleep_until(&current);
        }
    }

    WaitOutcome {
        exec_time_ns: entered.diff_ns(start),
        cycle_time_ns: current.diff_ns(start),
        deadline,
        woke_at: current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{SimulatedClock, SystemClock};

    #[test]
    fn test_wait_sleeps_to_absolute_deadline() {
        let clock = SimulatedClock::new(Timestamp::ZERO, 0);
        let start = clock.now();
        clock.advance(300_000);

        let outcome = wait(&clock, &start, 1_000_000);

        assert_eq!(outcome.exec_time_ns, 300_000);
        assert_eq!(outcome.cycle_time_ns, 1_000_000);
        assert_eq!(outcome.deadline, Timestamp::from_nanos(1_000_000));
        assert_eq!(clock.sleeps(), vec![Timestamp::from_nanos(1_000_000)]);
    }

    #[test]
    fn test_wait_overrun_returns_immediately() {
        let clock = SimulatedClock::new(Timestamp::ZERO, 0);
        let start = clock.now();
        clock.advance(1_500_000);

        let outcome = wait(&clock, &start, 1_000_000);

        assert_eq!(outcome.exec_time_ns, 1_500_000);
        assert_eq!(outcome.cycle_time_ns, 1_500_000);
    }

    #[test]
    fn test_busy_wait_lazy_sleep_then_spin() {
        let clock = SimulatedClock::new(Timestamp::ZERO, 1_000);
        let start = Timestamp::ZERO;
        let params = BusyWait::new(u16::MAX).with_lazy_sleep_ns(5_000);

        let outcome = busy_wait(&clock, &start, 10_000, &params);

        assert_eq!(clock.sleeps(), vec![Timestamp::from_nanos(5_000)]);
        assert!(!outcome.woke_at.before(&outcome.deadline));
        assert_eq!(outcome.cycle_time_ns, 10_000);
    }

    #[test]
    fn test_busy_wait_lazy_sleep_not_shorter_is_ignored() {
        let clock = SimulatedClock::new(Timestamp::ZERO, 1_000);
        let params = BusyWait::new(u16::MAX).with_lazy_sleep_ns(20_000);

        let outcome = busy_wait(&clock, &Timestamp::ZERO, 10_000, &params);

        assert!(clock.sleeps().is_empty());
        assert_eq!(outcome.cycle_time_ns, 10_000);

        let equal = BusyWait::new(u16::MAX).with_lazy_sleep_ns(10_000);
        assert_eq!(equal.effective_lazy_sleep(10_000), None);
    }

    #[test]
    fn test_busy_wait_step_sleep_yields() {
        let clock = SimulatedClock::new(Timestamp::ZERO, 1_000);
        let params = BusyWait::new(2);

        let _ = busy_wait(&clock, &Timestamp::ZERO, 10_000, &params);

        // Ten reads inside the loop, a micro-sleep after every third.
        let sleeps = clock.sleeps();
        assert_eq!(sleeps.len(), 3);
        assert!(sleeps.windows(2).all(|w| matches!(w, [a, b] if a < b)));
    }

    #[test]
    fn test_busy_wait_system_clock_never_early() {
        let clock = SystemClock;
        let params = BusyWait::new(50).with_lazy_sleep_ns(200_000);
        for _ in 0..20 {
            let start = clock.now();
            let outcome = busy_wait(&clock, &start, 500_000, &params);
            assert!(!outcome.woke_at.before(&outcome.deadline));
            assert!(outcome.cycle_time_ns >= 500_000);
        }
    }
}
