use kernel_info::boot::MemoryMapEntry;
use kernel_info::boot::MemoryRegionKind::{
    BootloaderReclaimable, KernelAndModules, Reserved, Usable,
};
use kernel_memory_addresses::{PAGE_SIZE, PhysicalAddress};
use kernel_pmm::phys_mapper::OffsetPhysMapper;
use kernel_pmm::{BitmapFrameAlloc, PmmError};

const MIB: u64 = 1024 * 1024;

fn pa(v: u64) -> PhysicalAddress {
    PhysicalAddress::new(v)
}

/// A 10 MiB machine: 1 MiB + 4 MiB usable, kernel image, bootloader data.
fn boot_map() -> &'static [MemoryMapEntry] {
    Box::leak(Box::new([
        MemoryMapEntry::new(0, 0x9_F000, Usable),
        MemoryMapEntry::new(MIB, MIB, Usable),
        MemoryMapEntry::new(2 * MIB, 2 * MIB, KernelAndModules),
        MemoryMapEntry::new(4 * MIB, 4 * MIB, Usable),
        MemoryMapEntry::new(8 * MIB, MIB, BootloaderReclaimable),
        MemoryMapEntry::new(9 * MIB, MIB, Reserved),
    ]))
}

/// Maps the bitmap's home (1 MiB) onto a leaked host page.
fn host_mapper() -> OffsetPhysMapper {
    let host: &'static mut [u8] = Box::leak(vec![0xA5; PAGE_SIZE as usize].into_boxed_slice());
    OffsetPhysMapper::for_region(MIB, host.as_mut_ptr())
}

fn allocator() -> BitmapFrameAlloc {
    unsafe { BitmapFrameAlloc::new(boot_map(), &host_mapper()) }.unwrap()
}

#[test]
fn init_computes_statistics_and_places_the_bitmap() {
    let a = allocator();
    let stats = a.stats();
    assert_eq!(stats.phys_limit, 10 * MIB);
    assert_eq!(stats.total_mem, 5 * MIB);
    // 10 MiB / 4 KiB = 2560 frames = 320 bytes of bitmap = one page.
    assert_eq!(a.bitmap_location(), (pa(MIB), 320));
    assert_eq!(stats.free_mem, 5 * MIB - PAGE_SIZE);
    assert_eq!(stats.used_mem(), PAGE_SIZE);

    assert!(a.is_used(pa(MIB)), "bitmap frame must be claimed");
    assert!(a.is_used(pa(0)), "legacy memory is never managed");
    assert!(a.is_used(pa(3 * MIB)), "kernel image stays used");
    assert!(a.is_used(pa(8 * MIB)), "bootloader memory is not reclaimed yet");
    assert!(a.is_free(pa(MIB + PAGE_SIZE), 255));
    assert!(a.is_free(pa(4 * MIB), 1024));
    a.audit_consistency();
}

#[test]
fn try_mark_used_and_mark_free_round_trip() {
    let mut a = allocator();
    for &(addr, pages) in &[
        (MIB + PAGE_SIZE, 1),
        (MIB + 0x8_0000, 16),
        (4 * MIB, 1024),
        (7 * MIB + 0x3_000, 5),
    ] {
        let before = a.stats().free_mem;
        assert!(a.try_mark_used(pa(addr), pages), "{addr:#x} x {pages}");
        for page in 0..pages {
            assert!(a.is_used(pa(addr + page * PAGE_SIZE)));
        }
        assert_eq!(a.stats().free_mem, before - pages * PAGE_SIZE);

        a.mark_free(pa(addr), pages);
        assert!(a.is_free(pa(addr), pages));
        assert_eq!(a.stats().free_mem, before);
        a.audit_consistency();
    }
}

#[test]
fn try_mark_used_on_a_partially_used_range_changes_nothing() {
    let mut a = allocator();
    let before = a.stats();

    // Starts on the last free frame of the first region, runs into the kernel image.
    assert!(!a.try_mark_used(pa(2 * MIB - PAGE_SIZE), 2));
    // Overlaps the bitmap's own frame.
    assert!(!a.try_mark_used(pa(MIB), 4));

    assert_eq!(a.stats(), before);
    assert!(a.is_free(pa(2 * MIB - PAGE_SIZE), 1));
    assert!(a.is_free(pa(MIB + PAGE_SIZE), 3));
    a.audit_consistency();
}

#[test]
fn mark_free_is_idempotent() {
    let mut a = allocator();
    let before = a.stats().free_mem;
    a.mark_free(pa(4 * MIB), 64);
    a.mark_free(pa(4 * MIB), 64);
    assert_eq!(a.stats().free_mem, before);

    assert!(a.try_mark_used(pa(4 * MIB), 8));
    a.mark_free(pa(4 * MIB), 64);
    a.mark_free(pa(4 * MIB), 64);
    assert_eq!(a.stats().free_mem, before);
    a.audit_consistency();
}

#[test]
fn frames_past_the_physical_limit_are_ignored() {
    let mut a = allocator();
    let before = a.stats();
    a.mark_free(pa(10 * MIB), 16);
    assert_eq!(a.stats(), before);
    assert!(!a.try_mark_used(pa(10 * MIB), 1));
    assert!(!a.try_mark_used(pa(10 * MIB - PAGE_SIZE), 2));
    a.audit_consistency();
}

#[test]
fn acquisitions_never_overlap() {
    let mut a = allocator();
    let mut ranges = Vec::new();
    for pages in [1, 3, 8, 1, 64, 2, 255, 7] {
        let base = a.acquire(pages);
        assert!(base.is_page_aligned());
        ranges.push((base.as_u64(), base.as_u64() + pages * PAGE_SIZE));
    }
    for (i, &(s1, e1)) in ranges.iter().enumerate() {
        for &(s2, e2) in &ranges[i + 1..] {
            assert!(e1 <= s2 || e2 <= s1, "{s1:#x}..{e1:#x} overlaps {s2:#x}..{e2:#x}");
        }
        assert!(!a.is_free(pa(s1), (e1 - s1) / PAGE_SIZE));
    }
    a.audit_consistency();
}

#[test]
fn acquire_wraps_to_low_memory_after_exhaustion() {
    let mut a = allocator();
    let first = a.acquire(1);
    assert_eq!(first, pa(MIB + PAGE_SIZE));

    while a.free_pages() > 0 {
        a.acquire(1);
    }
    assert_eq!(a.stats().free_mem, 0);
    a.audit_consistency();

    // The cursor now sits at the top of memory; the next search must wrap.
    a.release(first, 1);
    assert_eq!(a.acquire(1), first);
    a.audit_consistency();
}

#[test]
#[should_panic(expected = "out of physical memory")]
fn acquire_halts_when_memory_is_exhausted() {
    let mut a = allocator();
    while a.free_pages() > 0 {
        a.acquire(1);
    }
    a.acquire(1);
}

#[test]
#[should_panic(expected = "out of physical memory (requested 2000 contiguous pages)")]
fn acquire_halts_without_a_long_enough_run() {
    let mut a = allocator();
    // Plenty of free memory in total, but no run this long.
    assert!(a.free_pages() > 1024);
    a.acquire(2000);
}

#[test]
fn reclaiming_bootloader_memory_frees_only_reclaimable_ranges() {
    let mut a = allocator();
    let before = a.stats().free_mem;
    assert_eq!(a.reclaim_bootloader_memory(), MIB);
    assert_eq!(a.stats().free_mem, before + MIB);
    assert!(a.is_free(pa(8 * MIB), 256));
    assert!(a.is_used(pa(9 * MIB)));
    assert!(a.is_used(pa(2 * MIB)));
    a.audit_consistency();
}

#[test]
fn statistics_survive_a_long_mixed_workload() {
    // Holding at most 128 pages in at most 128 blocks leaves some free run
    // of more than 8 pages, so no acquisition below can halt.
    const MAX_HELD_PAGES: u64 = 128;

    let mut a = allocator();
    let mut held: Vec<(PhysicalAddress, u64)> = Vec::new();
    let mut held_pages = 0;
    let mut seed = 0x2545_F491_u64;
    for _ in 0..2_000 {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let roll = seed >> 33;
        let pages = roll % 8 + 1;
        if roll % 3 == 0 && !held.is_empty() {
            #[allow(clippy::cast_possible_truncation)]
            let (base, pages) = held.swap_remove(roll as usize % held.len());
            a.release(base, pages);
            held_pages -= pages;
        } else if held_pages + pages <= MAX_HELD_PAGES {
            held.push((a.acquire(pages), pages));
            held_pages += pages;
        }
        a.audit_consistency();
    }
    assert_eq!(a.stats().free_mem, 5 * MIB - PAGE_SIZE - held_pages * PAGE_SIZE);
}

#[test]
fn missing_bitmap_region_is_reported() {
    let map: &'static [MemoryMapEntry] = Box::leak(Box::new([
        MemoryMapEntry::new(MIB, PAGE_SIZE, Usable),
        MemoryMapEntry::new(2 * MIB, 4096 * MIB, Reserved),
    ]));
    let err = unsafe { BitmapFrameAlloc::new(map, &OffsetPhysMapper::new(0)) }.err();
    // (4 GiB + 2 MiB) / 4 KiB / 8 = 131136 bytes.
    assert_eq!(err, Some(PmmError::NoBitmapRegion { required: 131_136 }));
}

#[test]
#[should_panic(expected = "no usable region can hold the 131136-byte frame bitmap")]
fn missing_bitmap_region_halts_on_the_boot_path() {
    let map: &'static [MemoryMapEntry] = Box::leak(Box::new([
        MemoryMapEntry::new(MIB, PAGE_SIZE, Usable),
        MemoryMapEntry::new(2 * MIB, 4096 * MIB, Reserved),
    ]));
    let _ = unsafe { BitmapFrameAlloc::init_or_halt(map, &OffsetPhysMapper::new(0)) };
}

#[test]
fn legacy_only_map_is_empty() {
    let map: &'static [MemoryMapEntry] =
        Box::leak(Box::new([MemoryMapEntry::new(0, 0x9_F000, Usable)]));
    let err = unsafe { BitmapFrameAlloc::new(map, &OffsetPhysMapper::new(0)) }.err();
    assert_eq!(err, Some(PmmError::EmptyMemoryMap));
}
