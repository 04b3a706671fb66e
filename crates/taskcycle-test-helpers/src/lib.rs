//! Shared test utilities for taskcycle.
//!
//! The workspace denies `unwrap`, `expect` and direct float comparison, in
//! tests as well as production code. This crate provides the replacements.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`assertions`] - Tolerance-based assertion macros for timing values
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! taskcycle-test-helpers = { workspace = true }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

pub mod assertions;
pub mod must;
pub mod prelude;

pub use must::*;
