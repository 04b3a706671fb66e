//! Custom assertion macros for timing tests.

use std::fmt::{self, Debug};

/// Assert that two `f64` values are within `tolerance` of each other.
///
/// # Example
///
/// ```rust
/// use taskcycle_test_helpers::assert_approx_eq;
///
/// assert_approx_eq!(1.125e6_f64, 1_125_000.0001, 0.001);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr $(,)?) => {
        $crate::assertions::check_approx_eq($left, $right, $tolerance, None)
    };
    ($left:expr, $right:expr, $tolerance:expr, $($arg:tt)+) => {
        $crate::assertions::check_approx_eq($left, $right, $tolerance, Some(format_args!($($arg)+)))
    };
}

/// Assert that a sequence never decreases.
///
/// Monotonic clock readings may repeat but must never go backwards.
///
/// # Example
///
/// ```rust
/// use taskcycle_test_helpers::assert_non_decreasing;
///
/// assert_non_decreasing!(&[1, 2, 2, 4]);
/// ```
#[macro_export]
macro_rules! assert_non_decreasing {
    ($collection:expr $(,)?) => {
        $crate::assertions::check_non_decreasing(($collection).iter())
    };
}

/// Assert that a value lies within a range.
///
/// # Example
///
/// ```rust
/// use taskcycle_test_helpers::assert_in_range;
///
/// assert_in_range!(999_999_999, 0..1_000_000_000);
/// ```
#[macro_export]
macro_rules! assert_in_range {
    ($value:expr, $range:expr $(,)?) => {
        $crate::assertions::check_in_range(&$value, &$range, None)
    };
    ($value:expr, $range:expr, $($arg:tt)+) => {
        $crate::assertions::check_in_range(&$value, &$range, Some(format_args!($($arg)+)))
    };
}

fn suffix(context: Option<fmt::Arguments<'_>>) -> String {
    context.map(|c| format!(": {c}")).unwrap_or_default()
}

#[doc(hidden)]
#[track_caller]
pub fn check_approx_eq(left: f64, right: f64, tolerance: f64, context: Option<fmt::Arguments<'_>>) {
    let diff = (left - right).abs();
    if diff.is_nan() || diff > tolerance {
        panic!(
            "assertion failed: `(left ≈ right)`\n  left: {left:?}\n right: {right:?}\n  diff: {diff:?} > {tolerance:?}{}",
            suffix(context)
        );
    }
}

#[doc(hidden)]
#[track_caller]
pub fn check_non_decreasing<'a, T, I>(items: I)
where
    T: PartialOrd + Debug + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut items = items.into_iter().enumerate();
    let Some((_, mut prev)) = items.next() else {
        return;
    };
    for (index, curr) in items {
        if prev > curr {
            panic!("assertion failed: sequence decreases at index {index}: {prev:?} > {curr:?}");
        }
        prev = curr;
    }
}

#[doc(hidden)]
#[track_caller]
pub fn check_in_range<T, R>(value: &T, range: &R, context: Option<fmt::Arguments<'_>>)
where
    T: PartialOrd + Debug,
    R: std::ops::RangeBounds<T> + Debug,
{
    if !range.contains(value) {
        panic!(
            "assertion failed: value {value:?} is not in range {range:?}{}",
            suffix(context)
        );
    }
}
