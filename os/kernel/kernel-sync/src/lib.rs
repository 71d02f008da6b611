//! # Kernel synchronization primitives
//!
//! * [`SpinLock`]: a test-and-test-and-set spin lock with an RAII guard.
//! * [`GlobalSlot`]: a spin-locked, explicitly installed process-wide
//!   instance (`install` / `with` / `teardown`), used for the frame
//!   allocator and the filesystem tree.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod global_slot;
mod spin_lock;

pub use global_slot::{GlobalSlot, SlotError};
pub use spin_lock::{SpinLock, SpinLockGuard};
