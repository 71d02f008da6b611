//! # Memory Layout

/// A simple Higher Half Direct Map (HHDM) base.
/// Anything you map at [`HHDM_BASE`] + `pa` lets the kernel
/// access physical memory via a fixed offset.
pub const HHDM_BASE: u64 = 0xffff_8880_0000_0000;

/// Physical memory below this address is reserved for legacy use.
pub const LEGACY_MEMORY_END: u64 = 0x0010_0000; // 1 MiB

const _: () = {
    assert!(LEGACY_MEMORY_END.is_multiple_of(4096));
};
