//! # Process-Wide Frame Allocator
//!
//! The kernel has exactly one frame allocator. It is installed by
//! [`init`] during boot and every later operation runs with the slot's spin
//! lock held for the duration of the call, which makes the allocator's
//! check-then-mark sequences atomic with respect to other CPUs.
//!
//! The lock does not mask interrupts: an interrupt handler must not call into
//! this module while the interrupted context may hold the lock.

use crate::frame_alloc::{BitmapFrameAlloc, MemoryStats};
use crate::phys_mapper::PhysMapper;
use crate::PmmError;
use kernel_info::boot::MemoryMapEntry;
use kernel_memory_addresses::PhysicalAddress;
use kernel_sync::{GlobalSlot, SlotError};

static FRAMES: GlobalSlot<BitmapFrameAlloc> = GlobalSlot::new();

impl From<SlotError> for PmmError {
    fn from(value: SlotError) -> Self {
        match value {
            SlotError::AlreadyInstalled => Self::AlreadyInitialized,
            SlotError::NotInstalled => Self::NotInitialized,
        }
    }
}

/// Builds the global allocator from the firmware memory map.
///
/// Construction runs under the slot lock, so a racing second call cannot
/// touch the bitmap memory of the instance being installed.
///
/// A memory map without room for the bitmap halts with
/// [`Fatal::NoBitmapRegion`](crate::Fatal::NoBitmapRegion).
///
/// # Errors
/// * [`PmmError::AlreadyInitialized`] if called twice without [`teardown`].
/// * [`PmmError::EmptyMemoryMap`] if the map holds nothing above 1 MiB.
///
/// # Safety
/// See [`BitmapFrameAlloc::new`].
pub unsafe fn init(
    map: &'static [MemoryMapEntry],
    mapper: &impl PhysMapper,
) -> Result<(), PmmError> {
    // SAFETY: forwarded to the caller.
    FRAMES.install_with(|| unsafe { BitmapFrameAlloc::init_or_halt(map, mapper) })
}

/// Removes the global allocator, returning it to the caller.
///
/// # Errors
/// [`PmmError::NotInitialized`] if nothing is installed.
pub fn teardown() -> Result<BitmapFrameAlloc, PmmError> {
    Ok(FRAMES.teardown()?)
}

/// Runs `f` while holding the allocator lock.
///
/// # Errors
/// [`PmmError::NotInitialized`] if nothing is installed.
pub fn with_frames<R>(f: impl FnOnce(&mut BitmapFrameAlloc) -> R) -> Result<R, PmmError> {
    Ok(FRAMES.with(f)?)
}

/// See [`BitmapFrameAlloc::acquire`].
///
/// # Errors
/// [`PmmError::NotInitialized`] if nothing is installed.
pub fn acquire(pages: u64) -> Result<PhysicalAddress, PmmError> {
    with_frames(|frames| frames.acquire(pages))
}

/// See [`BitmapFrameAlloc::release`].
///
/// # Errors
/// [`PmmError::NotInitialized`] if nothing is installed.
pub fn release(addr: PhysicalAddress, pages: u64) -> Result<(), PmmError> {
    with_frames(|frames| frames.release(addr, pages))
}

/// See [`BitmapFrameAlloc::try_mark_used`].
///
/// # Errors
/// [`PmmError::NotInitialized`] if nothing is installed.
pub fn try_mark_used(addr: PhysicalAddress, pages: u64) -> Result<bool, PmmError> {
    with_frames(|frames| frames.try_mark_used(addr, pages))
}

/// See [`BitmapFrameAlloc::reclaim_bootloader_memory`].
///
/// # Errors
/// [`PmmError::NotInitialized`] if nothing is installed.
pub fn reclaim_bootloader_memory() -> Result<u64, PmmError> {
    with_frames(BitmapFrameAlloc::reclaim_bootloader_memory)
}

/// See [`BitmapFrameAlloc::audit_consistency`].
///
/// # Errors
/// [`PmmError::NotInitialized`] if nothing is installed.
pub fn audit_consistency() -> Result<(), PmmError> {
    with_frames(|frames| frames.audit_consistency())
}

/// Snapshot of the global statistics.
///
/// # Errors
/// [`PmmError::NotInitialized`] if nothing is installed.
pub fn stats() -> Result<MemoryStats, PmmError> {
    with_frames(|frames| frames.stats())
}
