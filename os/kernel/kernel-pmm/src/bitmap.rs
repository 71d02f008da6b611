const BITS_PER_BYTE: u64 = 8;

/// Number of bytes needed to track `frames` frames.
#[inline]
pub const fn bytes_for(frames: u64) -> u64 {
    frames.div_ceil(BITS_PER_BYTE)
}

/// One bit per frame; a set bit marks a **free** frame.
pub struct FrameBitmap {
    bits: &'static mut [u8],
    frames: u64,
}

impl FrameBitmap {
    /// Wraps `bits` and marks every frame used.
    pub fn new_all_used(bits: &'static mut [u8], frames: u64) -> Self {
        debug_assert!(bits.len() as u64 >= bytes_for(frames));
        bits.fill(0);
        Self { bits, frames }
    }

    /// Number of frames covered.
    #[inline]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    const fn locate(frame: u64) -> (usize, u8) {
        ((frame / BITS_PER_BYTE) as usize, 1 << (frame % BITS_PER_BYTE))
    }

    /// Frames outside the bitmap are never free.
    #[inline]
    pub fn is_free(&self, frame: u64) -> bool {
        if frame >= self.frames {
            return false;
        }
        let (byte, mask) = Self::locate(frame);
        self.bits[byte] & mask != 0
    }

    /// Whether every frame in `[first, end)` is free. An empty range is free.
    pub fn range_is_free(&self, first: u64, end: u64) -> bool {
        end <= self.frames && (first..end).all(|f| self.is_free(f))
    }

    #[inline]
    pub fn set_free(&mut self, frame: u64) {
        debug_assert!(frame < self.frames);
        let (byte, mask) = Self::locate(frame);
        self.bits[byte] |= mask;
    }

    #[inline]
    pub fn set_used(&mut self, frame: u64) {
        debug_assert!(frame < self.frames);
        let (byte, mask) = Self::locate(frame);
        self.bits[byte] &= !mask;
    }

    /// Full rescan; counts free frames.
    pub fn count_free(&self) -> u64 {
        (0..self.frames).filter(|&f| self.is_free(f)).count() as u64
    }
}
