//! Full-distribution statistics over a slice of samples.
//!
//! Every function fails with [`StatsError::EmptyDistribution`] on an empty
//! slice instead of returning zero or NaN.

use crate::error::{StatsError, StatsResult};

/// Smallest and largest sample of a distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMax {
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
}

impl MinMax {
    /// Distance between the largest and smallest sample.
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.max - self.min
    }
}

fn non_empty(samples: &[f64], op: &'static str) -> StatsResult<()> {
    if samples.is_empty() {
        return Err(StatsError::EmptyDistribution { op });
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss, reason = "sample counts are far below 2^52")]
fn len_f64(samples: &[f64]) -> f64 {
    samples.len() as f64
}

/// Arithmetic mean of the samples.
///
/// # Errors
///
/// Returns [`StatsError::EmptyDistribution`] if `samples` is empty.
pub fn average(samples: &[f64]) -> StatsResult<f64> {
    non_empty(samples, "average")?;
    Ok(samples.iter().sum::<f64>() / len_f64(samples))
}

/// Population variance of the samples about their mean.
///
/// # Errors
///
/// Returns [`StatsError::EmptyDistribution`] if `samples` is empty.
pub fn variance(samples: &[f64]) -> StatsResult<f64> {
    non_empty(samples, "variance")?;
    let mean = average(samples)?;
    Ok(mean_square_about(samples, mean))
}

/// Population standard deviation of the samples about their mean.
///
/// # Errors
///
/// Returns [`StatsError::EmptyDistribution`] if `samples` is empty.
pub fn standard_deviation(samples: &[f64]) -> StatsResult<f64> {
    non_empty(samples, "standard_deviation")?;
    Ok(variance(samples)?.sqrt())
}

/// Smallest and largest sample.
///
/// # Errors
///
/// Returns [`StatsError::EmptyDistribution`] if `samples` is empty.
pub fn minmax(samples: &[f64]) -> StatsResult<MinMax> {
    let Some((&first, rest)) = samples.split_first() else {
        return Err(StatsError::EmptyDistribution { op: "minmax" });
    };

    Ok(rest.iter().fold(
        MinMax {
            min: first,
            max: first,
        },
        |acc, &value| MinMax {
            min: acc.min.min(value),
            max: acc.max.max(value),
        },
    ))
}

/// Mean squared distance of the samples from `center`.
///
/// With `center` equal to the mean this is the variance; with `center` equal
/// to a target period it is the squared periodic deviation.
pub(crate) fn mean_square_about(samples: &[f64], center: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|&value| (value - center) * (value - center))
        .sum();
    sum / len_f64(samples)
}
