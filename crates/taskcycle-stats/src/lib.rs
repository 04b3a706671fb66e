//! Fixed-capacity sample ring buffer and distribution statistics for periodic tasks.
//!
//! Cycle-time measurements from a periodic task are pushed into a [`SampleBuffer`].
//! Every full traversal of the buffer is reported by [`SampleBuffer::push`], which is
//! the signal the task engine uses to run its drift correction.
//!
//! - **SampleBuffer**: ring buffer of `f64` samples with a wrap notification
//! - **distribution**: mean, variance, standard deviation and min/max over a slice
//! - **DistributionSummary**: snapshot relative to a target period
//!
//! # Example
//!
//! ```
//! use taskcycle_stats::{SampleBuffer, summarize};
//!
//! # fn main() -> Result<(), taskcycle_stats::StatsError> {
//! let mut buffer = SampleBuffer::with_capacity(4);
//! for sample in [1.10e6, 1.12e6, 1.08e6, 1.20e6] {
//!     buffer.push(sample)?;
//! }
//!
//! let summary = summarize(&buffer, 1_000_000)?;
//! assert!((summary.mean - 1.125e6).abs() < 1e-6);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(unused_must_use)]

pub mod buffer;
pub mod distribution;
pub mod error;
pub mod prelude;
pub mod summary;

pub use buffer::SampleBuffer;
pub use distribution::{MinMax, average, minmax, standard_deviation, variance};
pub use error::{StatsError, StatsResult};
pub use summary::{DistributionSummary, summarize};

/// Nanoseconds per second, as a float for frequency conversions.
pub const NANOS_PER_SEC_F64: f64 = 1e9;
