//! # Physical ↔ Virtual Translation
//!
//! The frame allocator speaks physical addresses but has to *touch* its
//! bitmap, which lives in a physical range. A [`PhysMapper`] supplies the
//! bijection between the two address spaces; it is owned by the virtual
//! memory manager and only borrowed here.
//!
//! * [`HhdmPhysMapper`] is the kernel's mapping: every physical address is
//!   visible at `HHDM_BASE + pa`.
//! * [`OffsetPhysMapper`] is the same idea with an arbitrary offset, which is
//!   how tests map a host buffer in place of RAM.

use kernel_info::memory::HHDM_BASE;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

/// A bijective physical ↔ virtual translation.
///
/// # Safety
/// Implementors promise that for every physical range the kernel asks about,
/// the returned virtual range is mapped, writable, and not aliased by any
/// other live Rust reference, and that `virt_to_phys` inverts `phys_to_virt`.
pub unsafe trait PhysMapper {
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress;

    fn virt_to_phys(&self, va: VirtualAddress) -> PhysicalAddress;
}

/// Translation by a constant (wrapping) offset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OffsetPhysMapper {
    offset: u64,
}

impl OffsetPhysMapper {
    #[must_use]
    pub const fn new(offset: u64) -> Self {
        Self { offset }
    }

    /// Maps the physical range starting at `phys_base` onto `host`.
    #[must_use]
    pub fn for_region(phys_base: u64, host: *mut u8) -> Self {
        Self::new(VirtualAddress::from_ptr(host).as_u64().wrapping_sub(phys_base))
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

// SAFETY: the caller of `for_region` / `new` vouches for the mapped range.
unsafe impl PhysMapper for OffsetPhysMapper {
    #[inline]
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress {
        VirtualAddress::new(pa.as_u64().wrapping_add(self.offset))
    }

    #[inline]
    fn virt_to_phys(&self, va: VirtualAddress) -> PhysicalAddress {
        PhysicalAddress::new(va.as_u64().wrapping_sub(self.offset))
    }
}

/// [`PhysMapper`] for kernels with a higher-half direct map (HHDM).
///
/// # Safety
/// - The HHDM mapping must be present and cover the referenced physical range.
#[derive(Debug, Copy, Clone, Default)]
pub struct HhdmPhysMapper;

// SAFETY: the loader maps all of physical memory at `HHDM_BASE`.
unsafe impl PhysMapper for HhdmPhysMapper {
    #[inline]
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress {
        OffsetPhysMapper::new(HHDM_BASE).phys_to_virt(pa)
    }

    #[inline]
    fn virt_to_phys(&self, va: VirtualAddress) -> PhysicalAddress {
        OffsetPhysMapper::new(HHDM_BASE).virt_to_phys(va)
    }
}
