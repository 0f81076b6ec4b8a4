//! Unwrap helpers with good error messages.
//!
//! These helpers replace `unwrap()` and `expect()` in test code, providing
//! better error messages with `#[track_caller]` for accurate panic
//! locations.

use std::fmt::Debug;

/// Unwrap a `Result`, panicking with context on error.
///
/// # Example
///
/// ```rust
/// use openlink_test_helpers::must;
///
/// let result: Result<i32, &str> = Ok(42);
/// let value = must(result);
/// assert_eq!(value, 42);
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

/// Unwrap an `Option`, panicking with a custom message if `None`.
///
/// # Panics
///
/// Panics if the option is `None`, with the provided message.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// Unwrap an `Err`, panicking if the result is `Ok`.
///
/// # Panics
///
/// Panics if the result is `Ok`.
#[track_caller]
pub fn must_err<T: Debug, E>(result: Result<T, E>) -> E {
    match result {
        Ok(v) => panic!("must_err: unexpected Ok: {v:?}"),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_must_passes_through() {
        let r: Result<u8, &str> = Ok(7);
        assert_eq!(must(r), 7);
    }

    #[test]
    #[should_panic(expected = "must: unexpected Err")]
    fn test_must_panics_on_err() {
        let r: Result<u8, &str> = Err("boom");
        must(r);
    }

    #[test]
    fn test_must_err() {
        let r: Result<u8, &str> = Err("boom");
        assert_eq!(must_err(r), "boom");
    }

    #[test]
    #[should_panic(expected = "must_some: missing")]
    fn test_must_some_panics_on_none() {
        must_some::<u8>(None, "missing");
    }
}
