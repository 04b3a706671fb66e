//! Benchmarks for the scheduler crate.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use taskcycle_scheduler::clock::{MonotonicClock, SimulatedClock, SystemClock, Timestamp};
use taskcycle_scheduler::engine::CycleEngine;
use taskcycle_scheduler::wait::{BusyWait, busy_wait};

fn bench_clock_now(c: &mut Criterion) {
    let clock = SystemClock;

    c.bench_function("clock_now", |b| {
        b.iter(|| black_box(clock.now()));
    });
}

fn bench_timestamp_arithmetic(c: &mut Criterion) {
    let base = Timestamp::normalized(1_000, 999_999_000);

    c.bench_function("timestamp_with_offset_diff", |b| {
        b.iter(|| {
            let next = black_box(base).with_offset(black_box(1_000_000));
            black_box(next.diff_ns(&base))
        });
    });
}

fn bench_record_cycle(c: &mut Criterion) {
    let mut engine = CycleEngine::new(1_000_000, 0, 0.005, 500);
    let mut cycle = 1_000_000i64;

    c.bench_function("engine_record_cycle", |b| {
        b.iter(|| {
            cycle = if cycle > 1_000_000 { 999_000 } else { 1_001_000 };
            black_box(engine.record_cycle(black_box(cycle)))
        });
    });
}

fn bench_busy_wait_simulated(c: &mut Criterion) {
    let params = BusyWait::new(100).with_lazy_sleep_ns(800_000);

    c.bench_function("busy_wait_simulated_1ms", |b| {
        b.iter(|| {
            let clock = SimulatedClock::new(Timestamp::ZERO, 1_000);
            let start = clock.now();
            black_box(busy_wait(&clock, &start, black_box(1_000_000), &params))
        });
    });
}

criterion_group!(
    benches,
    bench_clock_now,
    bench_timestamp_arithmetic,
    bench_record_cycle,
    bench_busy_wait_simulated,
);
criterion_main!(benches);
