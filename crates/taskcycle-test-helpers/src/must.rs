//! Unwrap helpers with good error messages.
//!
//! These replace `unwrap()` and `expect()` in test code. `#[track_caller]`
//! keeps the panic location at the call site.

use std::fmt::Debug;

/// Unwrap a `Result`, panicking with the error value on `Err`.
///
/// # Example
///
/// ```rust
/// use taskcycle_test_helpers::must;
///
/// let result: Result<u64, &str> = Ok(1_000_000);
/// assert_eq!(must(result), 1_000_000);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`, with a message including the error value.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with `msg` on `None`.
///
/// # Panics
///
/// Panics if the option is `None`.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// Unwrap a `Result` with a context message.
///
/// # Panics
///
/// Panics if the result is `Err`, with the context and error value.
#[track_caller]
pub fn must_with<T, E: Debug>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must_with: {context}: {e:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_must_ok() {
        let result: Result<i64, &str> = Ok(-250_000);
        assert_eq!(must(result), -250_000);
    }

    #[test]
    #[should_panic(expected = "must: unexpected Err")]
    fn test_must_err() {
        let result: Result<i64, &str> = Err("sched_setattr refused");
        let _ = must(result);
    }

    #[test]
    fn test_must_some_present() {
        assert_eq!(must_some(Some(7u16), "step count"), 7);
    }

    #[test]
    #[should_panic(expected = "must_some: no cpu")]
    fn test_must_some_none() {
        let _ = must_some(None::<usize>, "no cpu");
    }

    #[test]
    #[should_panic(expected = "must_with: joining task")]
    fn test_must_with_err() {
        let result: Result<(), &str> = Err("panicked");
        must_with(result, "joining task");
    }
}
