//! Prelude module for common statistics types.

pub use crate::buffer::SampleBuffer;
pub use crate::distribution::{MinMax, average, minmax, standard_deviation, variance};
pub use crate::error::{StatsError, StatsResult};
pub use crate::summary::{DistributionSummary, summarize};
