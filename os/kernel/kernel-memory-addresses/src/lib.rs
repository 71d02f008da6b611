//! # Physical and Virtual Memory Address Types
//!
//! Strongly typed wrappers for raw memory addresses, plus the 4 KiB page
//! arithmetic used by the frame allocator.
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`PhysicalAddress`] | Physical memory (RAM frames, MMIO). |
//! | [`VirtualAddress`] | A pointer value in the current address space. |
//!
//! Both are `#[repr(transparent)]` over `u64`, so they cost nothing at runtime
//! but make it a compile error to hand a virtual pointer to code that expects
//! a physical frame (and vice versa).
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x0010_2042);
//! assert_eq!(pa.align_down().as_u64(), 0x0010_2000);
//! assert_eq!(pa.frame_index(), 0x102);
//! assert_eq!(pages_for(PAGE_SIZE + 1), 2);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod page;
mod physical_address;
mod virtual_address;

pub use page::{PAGE_SHIFT, PAGE_SIZE, align_down, align_up, pages_for};
pub use physical_address::PhysicalAddress;
pub use virtual_address::VirtualAddress;
