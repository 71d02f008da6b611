//! # Kernel Resource Bring-Up
//!
//! Boot code calls [`init_resources`] once the firmware memory map is known
//! and the higher-half direct map is live. It brings up, in order:
//!
//! 1. the physical frame allocator ([`kernel_pmm::global`]), which the heap
//!    and everything above it draw frames from;
//! 2. the virtual filesystem switch ([`kernel_vfs::global`]), with an empty
//!    root folder.
//!
//! Once nothing refers to bootloader data any more,
//! [`reclaim_boot_memory`] hands those frames to the allocator.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod init;

pub use init::{BootError, init_resources, reclaim_boot_memory, teardown_resources};
