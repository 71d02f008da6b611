//! # Path Parsing
//!
//! Paths are `/`-separated. Leading, repeated and trailing separators are
//! ignored, as are `.` components; a relative path is resolved from the
//! root just like an absolute one. `..` is an ordinary name.

use crate::limits::{MAX_NAME_LEN, MAX_PATH_LEN};
use crate::VfsError;
use alloc::vec::Vec;

/// Splits `path` into its components.
///
/// An empty result names the root.
///
/// # Errors
/// [`VfsError::InvalidArgument`] if the path exceeds [`MAX_PATH_LEN`], a
/// component exceeds [`MAX_NAME_LEN`], or a component contains a NUL byte.
pub fn components(path: &str) -> Result<Vec<&str>, VfsError> {
    if path.len() > MAX_PATH_LEN {
        return Err(VfsError::InvalidArgument);
    }
    let mut parts = Vec::new();
    for part in path.split('/').filter(|p| !p.is_empty() && *p != ".") {
        if part.len() > MAX_NAME_LEN || part.contains('\0') {
            return Err(VfsError::InvalidArgument);
        }
        parts.try_reserve(1)?;
        parts.push(part);
    }
    Ok(parts)
}

/// Splits `path` into its parent components and final name.
///
/// Returns `None` for the root.
///
/// # Errors
/// See [`components`].
pub fn split_last(path: &str) -> Result<Option<(Vec<&str>, &str)>, VfsError> {
    let mut parts = components(path)?;
    Ok(parts.pop().map(|last| (parts, last)))
}
