/// Size of a physical frame / virtual page in bytes.
pub const PAGE_SIZE: u64 = 4096;

/// `log2(PAGE_SIZE)`.
pub const PAGE_SHIFT: u32 = 12;

const _: () = assert!(1 << PAGE_SHIFT == PAGE_SIZE);

/// Rounds `value` down to the previous page boundary.
#[inline]
#[must_use]
pub const fn align_down(value: u64) -> u64 {
    value & !(PAGE_SIZE - 1)
}

/// Rounds `value` up to the next page boundary.
///
/// Saturates at the last page boundary below `u64::MAX`.
#[inline]
#[must_use]
pub const fn align_up(value: u64) -> u64 {
    match value.checked_add(PAGE_SIZE - 1) {
        Some(v) => align_down(v),
        None => align_down(u64::MAX),
    }
}

/// Number of pages required to hold `len` bytes.
#[inline]
#[must_use]
pub const fn pages_for(len: u64) -> u64 {
    len.div_ceil(PAGE_SIZE)
}
