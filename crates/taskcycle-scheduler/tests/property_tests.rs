//! Property-based tests for the scheduler crate.

use proptest::prelude::*;
use quickcheck_macros::quickcheck;
use taskcycle_scheduler::clock::{
    MonotonicClock, NANOS_PER_SEC, SimulatedClock, Timestamp, before, diff,
};
use taskcycle_scheduler::engine::{CycleEngine, drift_correction};
use taskcycle_scheduler::rt_setup::affinity_cpu;
use taskcycle_scheduler::wait::{BusyWait, busy_wait, wait};

/// Keep seconds well inside the range where nanosecond totals fit in i64.
fn bounded_sec(sec: i64) -> i64 {
    sec % 1_000_000_000
}

#[quickcheck]
fn normalized_nsec_is_always_in_range(sec: i64, nsec: i64) -> bool {
    let ts = Timestamp::normalized(bounded_sec(sec), nsec);
    (0..NANOS_PER_SEC).contains(&ts.nsec())
}

#[quickcheck]
fn offset_then_diff_round_trips(sec: i64, nsec: i64, offset: i64) -> bool {
    let a = Timestamp::normalized(bounded_sec(sec), nsec % NANOS_PER_SEC);
    let offset = offset / 4;
    let b = a.with_offset(offset);
    diff(&b, &a) == offset && diff(&a, &b) == -offset
}

#[quickcheck]
fn before_matches_diff_sign(a: i64, b: i64) -> bool {
    let a = Timestamp::from_nanos(a / 2);
    let b = Timestamp::from_nanos(b / 2);
    before(&a, &b) == (diff(&a, &b) < 0)
}

#[quickcheck]
fn affinity_index_maps_onto_online_cpu(index: usize, online: u16) -> bool {
    let online = usize::from(online);
    match affinity_cpu(index, online) {
        Some(cpu) => cpu < online,
        None => online == 0,
    }
}

#[quickcheck]
fn negative_tolerance_disables_correction(tolerance: i32, average: u32) -> bool {
    let tolerance = -f64::from(tolerance.unsigned_abs().max(1));
    drift_correction(1_000_000, tolerance, f64::from(average)).is_none()
}

proptest! {
    #[test]
    fn busy_wait_never_returns_early(
        read_cost in 1i64..50_000,
        wait_ns in 0i64..5_000_000,
        lazy in proptest::option::of(0u64..6_000_000),
        step_sleep in 1u16..1_000,
        entry_delay in 0i64..2_000_000,
    ) {
        let clock = SimulatedClock::new(Timestamp::normalized(42, 0), read_cost);
        let start = clock.now();
        clock.advance(entry_delay);

        let params = BusyWait { lazy_sleep_ns: lazy, step_sleep };
        let outcome = busy_wait(&clock, &start, wait_ns, &params);

        prop_assert!(!outcome.woke_at.before(&outcome.deadline));
        prop_assert!(outcome.cycle_time_ns >= wait_ns);
        prop_assert!(outcome.exec_time_ns >= entry_delay);
    }

    #[test]
    fn sleep_wait_targets_absolute_deadline(
        wait_ns in 0i64..5_000_000,
        entry_delay in 0i64..2_000_000,
    ) {
        let clock = SimulatedClock::new(Timestamp::ZERO, 0);
        let start = clock.now();
        clock.advance(entry_delay);

        let outcome = wait(&clock, &start, wait_ns);

        prop_assert_eq!(outcome.deadline, start.with_offset(wait_ns));
        prop_assert_eq!(outcome.cycle_time_ns, wait_ns.max(entry_delay));
    }

    #[test]
    fn correction_only_fires_on_window_wrap(
        capacity in 1usize..64,
        cycles in prop::collection::vec(500_000i64..2_000_000, 1..256),
    ) {
        let mut engine = CycleEngine::new(1_000_000, 0, 0.0, capacity);
        for (i, cycle) in cycles.iter().enumerate() {
            let Ok(corrected) = engine.record_cycle(*cycle) else {
                return Err(TestCaseError::fail("record_cycle failed"));
            };
            if corrected.is_some() {
                prop_assert_eq!((i + 1) % capacity, 0);
            }
        }
        prop_assert!(engine.period_cmp_ns() >= 0);
    }

    #[test]
    fn correction_cancels_a_constant_bias(bias in -400_000i64..400_000) {
        prop_assume!(bias.abs() > 50_000);
        let mut engine = CycleEngine::new(1_000_000, 0, 0.05, 8);
        for _ in 0..8 {
            let Ok(_) = engine.record_cycle(1_000_000 + bias) else {
                return Err(TestCaseError::fail("record_cycle failed"));
            };
        }
        prop_assert_eq!(engine.period_cmp_ns(), 1_000_000 - bias);
    }
}
