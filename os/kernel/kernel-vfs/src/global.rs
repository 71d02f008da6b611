//! # Process-Wide Namespace
//!
//! The kernel's single [`Vfs`], installed once during boot. Every access
//! runs under the slot's spin lock, which serializes namespace mutations
//! against each other and against lookups.

use crate::vfs::Vfs;
use crate::VfsError;
use kernel_sync::{GlobalSlot, SlotError};

static VFS: GlobalSlot<Vfs> = GlobalSlot::new();

/// Creates the namespace root and installs the global instance.
///
/// # Errors
/// * [`VfsError::AlreadyExists`] if already installed.
/// * [`VfsError::NoSpace`] if the root cannot be allocated.
pub fn init() -> Result<(), VfsError> {
    if VFS.is_installed() {
        return Err(VfsError::AlreadyExists);
    }
    VFS.install(Vfs::new()?).map_err(|_| VfsError::AlreadyExists)
}

/// Runs `f` with exclusive access to the namespace.
///
/// `f` must not call back into this module.
///
/// # Errors
/// [`SlotError::NotInstalled`] before [`init`] or after [`teardown`].
pub fn with_vfs<R>(f: impl FnOnce(&mut Vfs) -> R) -> Result<R, SlotError> {
    VFS.with(f)
}

/// Removes the global instance.
///
/// # Errors
/// [`SlotError::NotInstalled`] if nothing is installed.
pub fn teardown() -> Result<Vfs, SlotError> {
    VFS.teardown()
}

#[must_use]
pub fn is_initialized() -> bool {
    VFS.is_installed()
}
