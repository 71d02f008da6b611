//! # Kernel Boot Interface and Memory Layout
//!
//! This crate defines the data the bootloader hands to the kernel and the
//! memory layout constants every memory-management crate agrees on.
//!
//! ## Overview
//!
//! ### Boot Information ([`boot`])
//! * **Memory Map**: [`MemoryMapEntry`](boot::MemoryMapEntry) records as reported
//!   by firmware, tagged with a [`MemoryRegionKind`](boot::MemoryRegionKind).
//! * **ABI Stability**: `#[repr(C)]` / `#[repr(u32)]` so the loader and the
//!   kernel agree on the layout.
//!
//! ### Memory Layout ([`memory`])
//! * **Legacy Region**: Everything below [`LEGACY_MEMORY_END`](memory::LEGACY_MEMORY_END)
//!   (1 MiB) belongs to BIOS, VGA and DMA users and is never handed out.
//! * **Direct Map**: [`HHDM_BASE`](memory::HHDM_BASE) is where the kernel sees
//!   all of physical memory.
//!
//! ## Physical Memory Layout
//!
//! ```text
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │     Low Memory (< 1MiB)         │
//!             │  (BIOS, VGA, DMA buffers)       │
//! 0x0010_0000 ├─────────────────────────────────┤ LEGACY_MEMORY_END
//!             │  Kernel image, modules, RAM     │
//!             │  (Managed by the frame alloc.)  │
//!             └─────────────────────────────────┘
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod memory;
