//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use taskcycle_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_some, must_with};
pub use crate::{assert_approx_eq, assert_in_range, assert_non_decreasing};

/// Result type for tests that propagate errors with `?`.
pub type TestResult = Result<(), Box<dyn std::error::Error>>;
