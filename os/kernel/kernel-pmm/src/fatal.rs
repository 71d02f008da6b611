//! # Unrecoverable Allocator Faults
//!
//! A [`Fatal`] is never returned; it is handed to [`halt`], which reports it
//! and stops the current execution context through the kernel's panic
//! handler. Host tests observe it as a panic carrying the fault's message.

use log::error;

/// A condition the frame allocator cannot recover from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fatal {
    /// No run of `pages` contiguous free frames exists anywhere.
    #[error("out of physical memory (requested {pages} contiguous pages)")]
    OutOfPhysicalMemory { pages: u64 },

    /// The bitmap and the free-memory statistic disagree.
    #[error("frame allocator audit failed: bitmap holds {actual:#x} free bytes, statistics claim {expected:#x}")]
    AuditMismatch { actual: u64, expected: u64 },

    /// No usable region is large enough to host the bitmap.
    #[error("no usable region can hold the {required}-byte frame bitmap")]
    NoBitmapRegion { required: u64 },
}

/// Reports `fault` and halts.
#[cold]
#[track_caller]
pub fn halt(fault: Fatal) -> ! {
    error!("FATAL: {fault}");
    panic!("{fault}");
}
