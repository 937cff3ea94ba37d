//! Input sanity checks shared by the builder, executor, and utilities.
//!
//! All helpers return [`Error::Validation`] and never panic. Unlike a web
//! server's path sanitizer, absolute paths are the normal case here: the
//! values being checked are editor executables and project files supplied
//! by the host, not untrusted request paths.

use std::time::Duration;

use tracing::warn;

use crate::constants::{MAX_PATH_LENGTH, MAX_TTL};
use crate::error::{Error, Result};

/// Validate a path argument: non-empty, no NUL bytes, bounded length.
///
/// `what` names the argument in the error message ("editor path",
/// "file path", ...).
pub fn non_empty_path(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{what} must not be empty")));
    }
    if value.contains('\0') {
        warn!(path = %value.replace('\0', "\\0"), "rejected path with NUL byte");
        return Err(Error::validation(format!("{what} contains a NUL byte")));
    }
    if value.len() > MAX_PATH_LENGTH {
        return Err(Error::validation(format!(
            "{what} exceeds {MAX_PATH_LENGTH} bytes"
        )));
    }
    Ok(())
}

/// Validate a 1-based line number.
pub fn line_number(line: u32) -> Result<()> {
    if line < 1 {
        return Err(Error::validation("line number must be >= 1"));
    }
    Ok(())
}

/// Validate a 1-based column number.
pub fn column_number(column: u32) -> Result<()> {
    if column < 1 {
        return Err(Error::validation("column number must be >= 1"));
    }
    Ok(())
}

/// Validate a caller-supplied TTL: non-zero and within [`MAX_TTL`].
pub fn ttl(value: Duration) -> Result<()> {
    if value.is_zero() {
        return Err(Error::validation("TTL must be greater than zero"));
    }
    if value > MAX_TTL {
        return Err(Error::validation(format!(
            "TTL exceeds maximum of {}s",
            MAX_TTL.as_secs()
        )));
    }
    Ok(())
}

/// Validate a time window or delay: non-zero.
pub fn window(value: Duration, what: &str) -> Result<()> {
    if value.is_zero() {
        return Err(Error::validation(format!("{what} must be greater than zero")));
    }
    Ok(())
}

/// Validate debounce parameters: non-zero wait, `max_wait >= wait`.
pub fn debounce_params(wait: Duration, max_wait: Option<Duration>) -> Result<()> {
    if wait.is_zero() {
        return Err(Error::validation("debounce wait must be greater than zero"));
    }
    if let Some(max) = max_wait {
        if max < wait {
            return Err(Error::validation(
                "debounce max_wait must be >= the wait window",
            ));
        }
    }
    Ok(())
}

/// Validate a count-style parameter (retry attempts, batch size, budgets).
pub fn positive(value: usize, what: &str) -> Result<()> {
    if value == 0 {
        return Err(Error::validation(format!("{what} must be greater than zero")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_blank_paths() {
        assert!(non_empty_path("", "editor path").is_err());
        assert!(non_empty_path("   ", "editor path").is_err());
        assert!(non_empty_path("/usr/bin/idea", "editor path").is_ok());
    }

    #[test]
    fn rejects_nul_bytes() {
        assert!(non_empty_path("/usr/bin/\0idea", "editor path").is_err());
    }

    #[test]
    fn rejects_oversized_paths() {
        let long = "a".repeat(MAX_PATH_LENGTH + 1);
        assert!(non_empty_path(&long, "file path").is_err());
    }

    #[test]
    fn line_and_column_are_one_based() {
        assert!(line_number(0).is_err());
        assert!(line_number(1).is_ok());
        assert!(column_number(0).is_err());
        assert!(column_number(42).is_ok());
    }

    #[test]
    fn ttl_bounds() {
        assert!(ttl(Duration::ZERO).is_err());
        assert!(ttl(Duration::from_millis(100)).is_ok());
        assert!(ttl(MAX_TTL + Duration::from_secs(1)).is_err());
    }

    #[test]
    fn debounce_window_relation() {
        let wait = Duration::from_millis(100);
        assert!(debounce_params(Duration::ZERO, None).is_err());
        assert!(debounce_params(wait, Some(Duration::from_millis(50))).is_err());
        assert!(debounce_params(wait, Some(Duration::from_millis(100))).is_ok());
        assert!(debounce_params(wait, None).is_ok());
    }
}
