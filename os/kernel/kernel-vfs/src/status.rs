//! # Signed Status ABI
//!
//! At the system-call and C-driver boundary every operation reports a single
//! `i64`: negative values are [`VfsError`] codes, non-negative values are a
//! byte count, a handle, or plain success (`0`).

use crate::VfsError;

/// Flattens a result into the signed status convention.
#[must_use]
pub fn into_status<T: Into<i64>>(result: Result<T, VfsError>) -> i64 {
    match result {
        Ok(v) => v.into(),
        Err(e) => e.code(),
    }
}

/// Converts a byte count to a status, saturating at `i64::MAX`.
#[must_use]
pub fn count_status(result: Result<usize, VfsError>) -> i64 {
    into_status(result.map(|n| i64::try_from(n).unwrap_or(i64::MAX)))
}

/// Splits a driver-style status into a byte count or an error.
///
/// # Errors
/// The decoded [`VfsError`] for negative statuses.
pub fn from_status(status: i64) -> Result<usize, VfsError> {
    match VfsError::from_code(status) {
        Some(e) => Err(e),
        None => Ok(usize::try_from(status).unwrap_or(usize::MAX)),
    }
}
