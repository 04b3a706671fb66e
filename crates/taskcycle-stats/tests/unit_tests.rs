//! Unit tests for taskcycle-stats.
//!
//! These exercise the public API the task engine and callers rely on.

use taskcycle_stats::prelude::*;
use taskcycle_test_helpers::{assert_approx_eq, must};

#[test]
fn test_push_cadence_with_capacity_four() {
    let mut buffer = SampleBuffer::with_capacity(4);

    for round in 0..3 {
        for slot in 0..4 {
            let wrapped = must(buffer.push(1.0));
            assert_eq!(wrapped, slot == 3, "round {round}, slot {slot}");
        }
    }
    assert_eq!(buffer.total_pushes(), 12);
    assert_eq!(buffer.traversals(), 3);
}

#[test]
fn test_buffer_statistics_match_free_functions() {
    let values = [990_000.0, 1_010_000.0, 1_005_000.0, 995_000.0, 1_000_000.0];
    let mut buffer = SampleBuffer::with_capacity(values.len());
    for value in values {
        must(buffer.push(value));
    }

    assert_approx_eq!(must(buffer.average()), must(average(&values)), 1e-9);
    assert_approx_eq!(must(buffer.variance()), must(variance(&values)), 1e-6);
    assert_approx_eq!(
        must(buffer.standard_deviation()),
        must(standard_deviation(&values)),
        1e-9
    );
    let from_buffer = must(buffer.minmax());
    let from_slice = must(minmax(&values));
    assert_approx_eq!(from_buffer.min, from_slice.min, 0.0);
    assert_approx_eq!(from_buffer.max, from_slice.max, 0.0);
}

#[test]
fn test_summary_serializes_to_json() {
    let mut buffer = SampleBuffer::with_capacity(2);
    must(buffer.push(1_000_000.0));
    must(buffer.push(1_000_000.0));

    let summary = must(summarize(&buffer, 1_000_000));
    let json = must(serde_json::to_value(summary));

    assert_eq!(json["size"], 2);
    assert!(json.get("percent_periodic_deviation").is_some());

    let back: DistributionSummary = must(serde_json::from_value(json));
    assert_eq!(back.size, summary.size);
    assert_approx_eq!(back.mean, summary.mean, 0.0);
}

#[test]
fn test_summary_requires_samples_and_target() {
    let empty = SampleBuffer::with_capacity(8);
    assert!(matches!(
        summarize(&empty, 1_000_000),
        Err(StatsError::EmptyDistribution { .. })
    ));

    let mut one = SampleBuffer::with_capacity(8);
    must(one.push(5.0));
    assert_eq!(summarize(&one, 0), Err(StatsError::ZeroTarget));
}
