//! # Kernel Boot Information

use core::fmt;

/// Type tag of a memory map entry.
///
/// The discriminants follow the boot protocol's numbering so the raw
/// tag can be passed through unchanged.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MemoryRegionKind {
    /// Free RAM the kernel may use.
    Usable = 1,
    Reserved = 2,
    AcpiReclaimable = 3,
    AcpiNvs = 4,
    BadMemory = 5,
    /// Used by the bootloader; becomes usable once the kernel no longer
    /// needs anything the bootloader left behind.
    BootloaderReclaimable = 0x1000,
    KernelAndModules = 0x1001,
}

impl MemoryRegionKind {
    /// Decodes a raw boot protocol tag.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            1 => Self::Usable,
            2 => Self::Reserved,
            3 => Self::AcpiReclaimable,
            4 => Self::AcpiNvs,
            5 => Self::BadMemory,
            0x1000 => Self::BootloaderReclaimable,
            0x1001 => Self::KernelAndModules,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usable => "Usable",
            Self::Reserved => "Reserved",
            Self::AcpiReclaimable => "ACPI (Reclaimable)",
            Self::AcpiNvs => "ACPI Non-Volatile Storage",
            Self::BadMemory => "Faulty Memory",
            Self::BootloaderReclaimable => "Bootloader (Reclaimable)",
            Self::KernelAndModules => "Kernel and/or Modules",
        }
    }
}

impl fmt::Display for MemoryRegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One physical memory range reported by the firmware.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryMapEntry {
    /// Physical base address of the range.
    pub base: u64,

    /// Length of the range in **bytes**.
    pub length: u64,

    /// What the range is used for.
    pub kind: MemoryRegionKind,
}

impl MemoryMapEntry {
    #[must_use]
    pub const fn new(base: u64, length: u64, kind: MemoryRegionKind) -> Self {
        Self { base, length, kind }
    }

    /// One past the last byte of the range, saturating at `u64::MAX`.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.base.saturating_add(self.length)
    }

    /// Whether the range lies wholly below `limit`.
    #[must_use]
    pub const fn ends_at_or_below(&self, limit: u64) -> bool {
        self.end() <= limit
    }
}
