//! # Bitmap Frame Allocator
//!
//! Tracks every 4 KiB frame below `phys_limit` in a bitmap stored inside the
//! first usable region large enough to hold it.
//!
//! ## Lifecycle
//! 1. [`BitmapFrameAlloc::new`] scans the firmware memory map, places and
//!    zeroes the bitmap, frees every usable range, then claims the bitmap's
//!    own frames.
//! 2. Frames are claimed with [`try_mark_used`](BitmapFrameAlloc::try_mark_used)
//!    or [`acquire`](BitmapFrameAlloc::acquire) and returned with
//!    [`mark_free`](BitmapFrameAlloc::mark_free).
//! 3. Once the bootloader's data is no longer needed,
//!    [`reclaim_bootloader_memory`](BitmapFrameAlloc::reclaim_bootloader_memory)
//!    returns its ranges to the pool.
//!
//! ## Concurrency
//! The allocator itself is a plain `&mut self` state machine: the
//! check-then-mark sequence in `try_mark_used` is only atomic because the
//! borrow checker guarantees exclusive access. The process-wide instance in
//! [`crate::global`] wraps it in a spin lock held for each whole call.

use crate::PmmError;
use crate::bitmap::{FrameBitmap, bytes_for};
use crate::fatal::{Fatal, halt};
use crate::phys_mapper::PhysMapper;
use kernel_info::boot::{MemoryMapEntry, MemoryRegionKind};
use kernel_info::memory::LEGACY_MEMORY_END;
use kernel_memory_addresses::{PAGE_SIZE, PhysicalAddress, align_down, align_up, pages_for};
use log::{debug, info, trace};

/// Aggregate memory statistics.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Highest `base + length` in the memory map.
    pub phys_limit: u64,
    /// Sum of the lengths of all usable entries, in bytes.
    pub total_mem: u64,
    /// Bytes currently marked free in the bitmap.
    pub free_mem: u64,
}

impl MemoryStats {
    /// Usable bytes that are not free.
    #[must_use]
    pub const fn used_mem(&self) -> u64 {
        self.total_mem.saturating_sub(self.free_mem)
    }
}

/// Next-fit bitmap allocator over physical frames.
pub struct BitmapFrameAlloc {
    bitmap: FrameBitmap,
    bitmap_base: PhysicalAddress,
    bitmap_len: u64,
    map: &'static [MemoryMapEntry],
    stats: MemoryStats,
    /// Frame index where the next search starts.
    cursor: u64,
    reclaimed: bool,
}

/// Entries wholly below 1 MiB are left to legacy users.
fn managed(map: &[MemoryMapEntry]) -> impl Iterator<Item = &MemoryMapEntry> {
    map.iter().filter(|e| !e.ends_at_or_below(LEGACY_MEMORY_END))
}

/// The whole frames inside `entry`, as `(base, pages)`.
fn whole_frames(entry: &MemoryMapEntry) -> (PhysicalAddress, u64) {
    let start = align_up(entry.base);
    let end = align_down(entry.end());
    if end <= start {
        (PhysicalAddress::new(start), 0)
    } else {
        (PhysicalAddress::new(start), (end - start) / PAGE_SIZE)
    }
}

impl BitmapFrameAlloc {
    /// Builds the allocator from the firmware memory map.
    ///
    /// # Errors
    /// * [`PmmError::EmptyMemoryMap`] if no entry lies above the legacy region.
    /// * [`PmmError::NoBitmapRegion`] if no usable entry can hold the bitmap.
    ///
    /// # Safety
    /// `mapper` must map the first usable region that fits the bitmap as
    /// writable memory that nothing else references; the bitmap is written
    /// through that mapping for as long as the allocator lives.
    pub unsafe fn new(
        map: &'static [MemoryMapEntry],
        mapper: &impl PhysMapper,
    ) -> Result<Self, PmmError> {
        info!("Memory map provided by bootloader:");
        let mut stats = MemoryStats::default();
        for entry in managed(map) {
            info!(
                "\tBase: {:#x}. Length: {:#x}. Type: {}",
                entry.base, entry.length, entry.kind
            );
            stats.phys_limit = stats.phys_limit.max(entry.end());
            if entry.kind == MemoryRegionKind::Usable {
                stats.total_mem += entry.length;
            }
        }
        if stats.phys_limit == 0 {
            return Err(PmmError::EmptyMemoryMap);
        }
        info!(
            "Physical Limit: {:#x}. Total Mem: {} MiB",
            stats.phys_limit,
            stats.total_mem / (1024 * 1024)
        );

        let frames = pages_for(stats.phys_limit);
        let bitmap_len = bytes_for(frames);
        let bitmap_base = managed(map)
            .filter(|e| e.kind == MemoryRegionKind::Usable)
            .map(whole_frames)
            .find(|&(_, pages)| pages * PAGE_SIZE >= bitmap_len)
            .map(|(base, _)| base)
            .ok_or(PmmError::NoBitmapRegion {
                required: bitmap_len,
            })?;

        let va = mapper.phys_to_virt(bitmap_base);
        #[allow(clippy::cast_possible_truncation)]
        // SAFETY: the caller guarantees the mapping; the region holds at least `bitmap_len` bytes.
        let storage = unsafe { core::slice::from_raw_parts_mut(va.as_mut_ptr::<u8>(), bitmap_len as usize) };
        info!("Keeping bitmap at {va} ({bitmap_base}), Size: {bitmap_len}");

        let mut this = Self {
            bitmap: FrameBitmap::new_all_used(storage, frames),
            bitmap_base,
            bitmap_len,
            map,
            stats,
            cursor: 0,
            reclaimed: false,
        };

        for entry in managed(map).filter(|e| e.kind == MemoryRegionKind::Usable) {
            let (base, pages) = whole_frames(entry);
            this.mark_free(base, pages);
        }

        let claimed = this.try_mark_used(bitmap_base, pages_for(bitmap_len));
        debug_assert!(claimed, "bitmap region must be free right after init");

        debug!(
            "Frame allocator ready: {} of {} bytes free",
            this.stats.free_mem, this.stats.total_mem
        );
        Ok(this)
    }

    /// Like [`new`](Self::new), but a missing bitmap region halts the kernel.
    ///
    /// # Errors
    /// [`PmmError::EmptyMemoryMap`] if no entry lies above the legacy region.
    ///
    /// # Safety
    /// See [`new`](Self::new).
    pub unsafe fn init_or_halt(
        map: &'static [MemoryMapEntry],
        mapper: &impl PhysMapper,
    ) -> Result<Self, PmmError> {
        // SAFETY: forwarded to the caller.
        match unsafe { Self::new(map, mapper) } {
            Err(PmmError::NoBitmapRegion { required }) => halt(Fatal::NoBitmapRegion { required }),
            other => other,
        }
    }

    /// Marks `pages` frames starting at `addr` free.
    ///
    /// Already free frames are left alone and not counted twice; frames past
    /// the end of the bitmap are ignored.
    pub fn mark_free(&mut self, addr: PhysicalAddress, pages: u64) {
        let first = addr.frame_index();
        let end = first.saturating_add(pages).min(self.bitmap.frames());
        for frame in first..end {
            if !self.bitmap.is_free(frame) {
                self.bitmap.set_free(frame);
                self.stats.free_mem += PAGE_SIZE;
            }
        }
        trace!("freed {pages} page(s) at {addr}");
    }

    /// Alias of [`mark_free`](Self::mark_free) for frames obtained from
    /// [`acquire`](Self::acquire).
    #[inline]
    pub fn release(&mut self, addr: PhysicalAddress, pages: u64) {
        self.mark_free(addr, pages);
    }

    /// Claims `pages` frames starting at `addr` if every one of them is free.
    ///
    /// Returns `false` and changes nothing otherwise.
    pub fn try_mark_used(&mut self, addr: PhysicalAddress, pages: u64) -> bool {
        let first = addr.frame_index();
        let Some(end) = first.checked_add(pages) else {
            return false;
        };
        if !self.bitmap.range_is_free(first, end) {
            return false;
        }
        for frame in first..end {
            self.bitmap.set_used(frame);
        }
        self.stats.free_mem -= pages * PAGE_SIZE;
        true
    }

    /// Finds and claims `pages` contiguous frames.
    ///
    /// The search starts at the frame after the previous successful
    /// acquisition, runs to the physical limit and then wraps to frame 0.
    ///
    /// # Panics
    /// Halts with [`Fatal::OutOfPhysicalMemory`] if no such run exists.
    /// Asserts that `pages` is not zero.
    pub fn acquire(&mut self, pages: u64) -> PhysicalAddress {
        assert!(pages > 0, "acquire of zero pages");

        let frames = self.bitmap.frames();
        let start = self.cursor.min(frames);
        let found = (start..frames)
            .chain(0..start)
            .find(|&frame| self.try_mark_used(PhysicalAddress::from_frame_index(frame), pages));

        let Some(frame) = found else {
            halt(Fatal::OutOfPhysicalMemory { pages });
        };
        self.cursor = frame + pages;
        PhysicalAddress::from_frame_index(frame)
    }

    /// Frees every bootloader-reclaimable range once.
    ///
    /// Returns the number of bytes that became free; later calls return 0.
    pub fn reclaim_bootloader_memory(&mut self) -> u64 {
        if self.reclaimed {
            return 0;
        }
        self.reclaimed = true;

        let before = self.stats.free_mem;
        let map = self.map;
        for entry in managed(map).filter(|e| e.kind == MemoryRegionKind::BootloaderReclaimable) {
            let (base, pages) = whole_frames(entry);
            self.mark_free(base, pages);
        }
        let gained = self.stats.free_mem - before;
        info!("Reclaimed {gained:#x} bytes of bootloader memory");
        gained
    }

    /// Recounts the bitmap and compares it with the free-memory statistic.
    ///
    /// # Panics
    /// Halts with [`Fatal::AuditMismatch`] on disagreement.
    pub fn audit_consistency(&self) {
        let actual = self.bitmap.count_free() * PAGE_SIZE;
        let expected = self.stats.free_mem;
        debug!("PMM audit: Actual = {actual:#x}, Expected = {expected:#x}");
        if actual != expected {
            halt(Fatal::AuditMismatch { actual, expected });
        }
    }

    /// [`audit_consistency`](Self::audit_consistency) when the `audit`
    /// feature is enabled, nothing otherwise.
    #[inline]
    pub fn debug_audit(&self) {
        #[cfg(feature = "audit")]
        self.audit_consistency();
    }

    /// Whether all `pages` frames starting at `addr` are free.
    #[must_use]
    pub fn is_free(&self, addr: PhysicalAddress, pages: u64) -> bool {
        let first = addr.frame_index();
        first
            .checked_add(pages)
            .is_some_and(|end| self.bitmap.range_is_free(first, end))
    }

    #[must_use]
    pub fn is_used(&self, addr: PhysicalAddress) -> bool {
        !self.bitmap.is_free(addr.frame_index())
    }

    #[must_use]
    pub const fn stats(&self) -> MemoryStats {
        self.stats
    }

    #[must_use]
    pub const fn free_pages(&self) -> u64 {
        self.stats.free_mem / PAGE_SIZE
    }

    /// Where the next search starts.
    #[must_use]
    pub const fn cursor(&self) -> PhysicalAddress {
        PhysicalAddress::from_frame_index(self.cursor)
    }

    /// Physical base and byte length of the bitmap.
    #[must_use]
    pub const fn bitmap_location(&self) -> (PhysicalAddress, u64) {
        (self.bitmap_base, self.bitmap_len)
    }

    /// The memory map the allocator was built from.
    #[must_use]
    pub const fn memory_map(&self) -> &'static [MemoryMapEntry] {
        self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phys_mapper::OffsetPhysMapper;
    use MemoryRegionKind::{BootloaderReclaimable, Usable};

    const MIB: u64 = 1024 * 1024;

    fn alloc_over(entries: Vec<MemoryMapEntry>, host_len: usize) -> BitmapFrameAlloc {
        let map: &'static [MemoryMapEntry] = Box::leak(entries.into_boxed_slice());
        let host: &'static mut [u8] = Box::leak(vec![0xFF; host_len].into_boxed_slice());
        let base = managed(map)
            .find(|e| e.kind == Usable)
            .map(|e| align_up(e.base))
            .unwrap();
        let mapper = OffsetPhysMapper::for_region(base, host.as_mut_ptr());
        unsafe { BitmapFrameAlloc::new(map, &mapper) }.unwrap()
    }

    #[test]
    fn partial_pages_at_region_edges_stay_used() {
        let a = alloc_over(
            vec![MemoryMapEntry::new(MIB + 0x800, 4 * PAGE_SIZE, Usable)],
            PAGE_SIZE as usize,
        );
        // [1 MiB + 0x800, 1 MiB + 0x4800) holds three whole frames; one is the bitmap.
        assert!(a.is_used(PhysicalAddress::new(MIB)));
        assert!(a.is_used(PhysicalAddress::new(MIB + PAGE_SIZE)));
        assert!(a.is_free(PhysicalAddress::new(MIB + 2 * PAGE_SIZE), 2));
        assert!(a.is_used(PhysicalAddress::new(MIB + 4 * PAGE_SIZE)));
        assert_eq!(a.stats().free_mem, 2 * PAGE_SIZE);
        a.audit_consistency();
    }

    #[test]
    #[should_panic(expected = "frame allocator audit failed")]
    fn audit_detects_a_drifted_statistic() {
        let mut a = alloc_over(
            vec![MemoryMapEntry::new(MIB, MIB, Usable)],
            PAGE_SIZE as usize,
        );
        a.stats.free_mem += PAGE_SIZE;
        a.audit_consistency();
    }

    #[test]
    fn reclaim_is_one_shot() {
        let mut a = alloc_over(
            vec![
                MemoryMapEntry::new(MIB, MIB, Usable),
                MemoryMapEntry::new(2 * MIB, MIB, BootloaderReclaimable),
            ],
            PAGE_SIZE as usize,
        );
        assert_eq!(a.reclaim_bootloader_memory(), MIB);
        // Claim a reclaimed frame, then reclaim again: it must stay claimed.
        assert!(a.try_mark_used(PhysicalAddress::new(2 * MIB), 1));
        assert_eq!(a.reclaim_bootloader_memory(), 0);
        assert!(a.is_used(PhysicalAddress::new(2 * MIB)));
        a.audit_consistency();
    }

    #[test]
    fn cursor_advances_past_each_acquisition() {
        let mut a = alloc_over(
            vec![MemoryMapEntry::new(MIB, MIB, Usable)],
            PAGE_SIZE as usize,
        );
        let first = a.acquire(3);
        assert_eq!(a.cursor(), first + 3 * PAGE_SIZE);
        let second = a.acquire(1);
        assert_eq!(second, first + 3 * PAGE_SIZE);
    }
}
