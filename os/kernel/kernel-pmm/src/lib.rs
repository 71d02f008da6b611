//! # Physical Frame Allocator
//!
//! This crate owns physical memory: which 4 KiB frames are free, which are
//! used, and how much memory that adds up to. Everything that needs RAM
//! (page tables, the kernel heap, and through it the filesystem tree) is
//! ultimately carved out of frames handed out here.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │        Global instance ([`global`])                 │
//! │    • install / teardown lifecycle                   │
//! │    • one spin lock around every operation           │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │        Bitmap allocator ([`frame_alloc`])           │
//! │    • next-fit search with wrap-around               │
//! │    • free-byte statistics + audit                   │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │        Physical Mapper ([`phys_mapper`])            │
//! │    • physical ↔ virtual translation for the bitmap  │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bitmap Encoding
//!
//! One bit per frame, least significant bit first within each byte.
//! A **set** bit means the frame is **free**. The bitmap covers
//! `[0, phys_limit)` where `phys_limit` is the highest end address in the
//! firmware memory map; frames past the bitmap are permanently "used".
//!
//! ## Failure Model
//!
//! Two kinds of failure exist and they are deliberately different types:
//!
//! * [`PmmError`] covers recoverable setup mistakes (empty memory map,
//!   uninitialized global instance).
//! * [`Fatal`] is raised through [`fatal::halt`] when the kernel cannot
//!   continue: no contiguous run left for [`BitmapFrameAlloc::acquire`], or a
//!   failed [`BitmapFrameAlloc::audit_consistency`]. There is no fallback at
//!   this layer; callers that need to degrade gracefully must keep headroom.
//!
//! ## Usage
//!
//! ```rust
//! use kernel_info::boot::{MemoryMapEntry, MemoryRegionKind};
//! use kernel_pmm::frame_alloc::BitmapFrameAlloc;
//! use kernel_pmm::phys_mapper::OffsetPhysMapper;
//!
//! // Pretend a host buffer is the first megabyte above the legacy region.
//! let ram: &'static mut [u8] = Box::leak(vec![0u8; 4096].into_boxed_slice());
//! let map: &'static [MemoryMapEntry] = Box::leak(Box::new([
//!     MemoryMapEntry::new(0x10_0000, 0x10_0000, MemoryRegionKind::Usable),
//! ]));
//! let mapper = OffsetPhysMapper::for_region(0x10_0000, ram.as_mut_ptr());
//!
//! let mut frames = unsafe { BitmapFrameAlloc::new(map, &mapper) }.unwrap();
//! let pa = frames.acquire(2);
//! assert!(!frames.is_free(pa, 2));
//! frames.mark_free(pa, 2);
//! frames.audit_consistency();
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod bitmap;
mod error;
pub mod fatal;
pub mod frame_alloc;
pub mod global;
pub mod phys_mapper;

pub use error::PmmError;
pub use fatal::Fatal;
pub use frame_alloc::{BitmapFrameAlloc, MemoryStats};
