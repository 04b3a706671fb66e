//! Distribution summaries relative to a target period.

use serde::{Deserialize, Serialize};

use crate::NANOS_PER_SEC_F64;
use crate::buffer::SampleBuffer;
use crate::distribution::{self, mean_square_about};
use crate::error::{StatsError, StatsResult};

/// Read-only snapshot of a cycle-time distribution.
///
/// All values are in nanoseconds except the `percent_*` fields, which are
/// fractions of the target period (`0.01` = 1%). Every percent field uses the
/// target as its denominator:
///
/// - `percent_standard_deviation = standard_deviation / target`
/// - `percent_periodic_deviation = periodic_deviation / target`
/// - `percent_min = |min - target| / target`
/// - `percent_max = |max - target| / target`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    /// Target period.
    pub target: f64,
    /// Mean cycle time.
    pub mean: f64,
    /// Standard deviation about the mean.
    pub standard_deviation: f64,
    /// Root-mean-square deviation about the target period.
    pub periodic_deviation: f64,
    /// Shortest cycle.
    pub min: f64,
    /// Longest cycle.
    pub max: f64,
    /// `standard_deviation / target`.
    pub percent_standard_deviation: f64,
    /// `periodic_deviation / target`.
    pub percent_periodic_deviation: f64,
    /// `|min - target| / target`.
    pub percent_min: f64,
    /// `|max - target| / target`.
    pub percent_max: f64,
    /// Number of samples summarized.
    pub size: usize,
}

impl DistributionSummary {
    /// Summarize a slice of samples against `target_period_ns`.
    ///
    /// # Errors
    ///
    /// - [`StatsError::ZeroTarget`] if `target_period_ns` is zero
    /// - [`StatsError::EmptyDistribution`] if `samples` is empty
    #[allow(clippy::cast_precision_loss, reason = "periods are far below 2^52 ns")]
    pub fn from_samples(samples: &[f64], target_period_ns: u64) -> StatsResult<Self> {
        if target_period_ns == 0 {
            return Err(StatsError::ZeroTarget);
        }
        if samples.is_empty() {
            return Err(StatsError::EmptyDistribution { op: "summarize" });
        }

        let target = target_period_ns as f64;
        let mean = distribution::average(samples)?;
        let extremes = distribution::minmax(samples)?;
        let standard_deviation = mean_square_about(samples, mean).sqrt();
        let periodic_deviation = mean_square_about(samples, target).sqrt();

        Ok(Self {
            target,
            mean,
            standard_deviation,
            periodic_deviation,
            min: extremes.min,
            max: extremes.max,
            percent_standard_deviation: standard_deviation / target,
            percent_periodic_deviation: periodic_deviation / target,
            percent_min: (extremes.min - target).abs() / target,
            percent_max: (extremes.max - target).abs() / target,
            size: samples.len(),
        })
    }

    /// Frequency implied by the target period, in Hz.
    #[must_use]
    pub fn target_frequency_hz(&self) -> f64 {
        NANOS_PER_SEC_F64 / self.target
    }

    /// Frequency implied by the mean cycle time, in Hz.
    ///
    /// Returns 0 if the mean is not positive.
    #[must_use]
    pub fn mean_frequency_hz(&self) -> f64 {
        if self.mean <= 0.0 {
            return 0.0;
        }
        NANOS_PER_SEC_F64 / self.mean
    }

    /// Distance between the longest and shortest cycle.
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.max - self.min
    }

    /// Combined distance of both extremes from the target, as a fraction of it.
    #[must_use]
    pub fn spread_percent(&self) -> f64 {
        self.percent_min + self.percent_max
    }
}

/// Summarize the written samples of `buffer` against `target_period_ns`.
///
/// Callers should check [`SampleBuffer::is_empty`] first for tasks that may
/// not have run (for example a deadline task whose policy was refused).
///
/// # Errors
///
/// - [`StatsError::ZeroTarget`] if `target_period_ns` is zero
/// - [`StatsError::EmptyDistribution`] if the buffer holds no samples
pub fn summarize(buffer: &SampleBuffer, target_period_ns: u64) -> StatsResult<DistributionSummary> {
    DistributionSummary::from_samples(buffer.samples(), target_period_ns)
}
