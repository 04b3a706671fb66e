//! Error types for the statistics crate.

use thiserror::Error;

/// Configuration errors raised by statistics operations.
///
/// These are never produced by a healthy task loop; they indicate that a
/// caller asked for statistics over an invalid distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatsError {
    /// A push was attempted on a buffer with no storage.
    #[error("sample buffer has zero capacity")]
    ZeroCapacity,

    /// A statistic was requested over a distribution with no samples.
    #[error("{op}: the distribution provided is empty")]
    EmptyDistribution {
        /// Name of the requested statistic.
        op: &'static str,
    },

    /// A summary was requested against a zero target period.
    #[error("target period must be non-zero")]
    ZeroTarget,
}

/// Result type for statistics operations.
pub type StatsResult<T> = Result<T, StatsError>;
