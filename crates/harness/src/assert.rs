//! Assertion primitives used by probes.
//!
//! Every assertion returns an [`AssertionError`] on failure instead of panicking, recording the
//! location of the caller.

use memprobe_rt_core::{Classify, ErrorClass};
use std::panic::Location;

/// Error returned when an assertion fails.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssertionError {
    message: String,
    location: &'static Location<'static>,
}

impl AssertionError {
    /// Creates an assertion failure at the location of the caller.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: Location::caller(),
        }
    }

    /// Describes what went wrong.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The location of the failed assertion.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl std::fmt::Display for AssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AssertionError {}

/// Asserts that calling `thunk` fails with an error of the `expected` class.
///
/// # Errors
///
/// Fails if the `thunk` returns successfully, or if it returns an error of another class.
#[track_caller]
pub fn assert_throws<T, E, F>(thunk: F, expected: ErrorClass) -> Result<(), AssertionError>
where
    T: std::fmt::Debug,
    E: Classify,
    F: FnOnce() -> Result<T, E>,
{
    match thunk() {
        Err(error) if error.class() == expected => {
            log::debug!("caught expected {expected}: {error}");
            Ok(())
        }
        Err(error) => Err(AssertionError::new(format!(
            "expected {expected}, but {} was thrown: {error}",
            error.class()
        ))),
        Ok(value) => Err(AssertionError::new(format!(
            "expected {expected}, but nothing was thrown and {value:?} was returned"
        ))),
    }
}

/// Asserts that `actual` is equal to `expected`.
///
/// # Errors
///
/// Fails if the values are not equal, describing both of them.
#[track_caller]
pub fn assert_same<T>(expected: T, actual: T) -> Result<(), AssertionError>
where
    T: PartialEq + std::fmt::Debug,
{
    if expected == actual {
        Ok(())
    } else {
        Err(AssertionError::new(format!(
            "expected {expected:?}, but got {actual:?}"
        )))
    }
}

/// Asserts that a `condition` holds, where `what` describes the condition.
///
/// # Errors
///
/// Fails if the `condition` is `false`.
#[track_caller]
pub fn assert_true(condition: bool, what: &str) -> Result<(), AssertionError> {
    if condition {
        Ok(())
    } else {
        Err(AssertionError::new(format!("assertion failed: {what}")))
    }
}
