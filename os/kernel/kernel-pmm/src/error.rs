/// Recoverable frame allocator errors.
///
/// Conditions the kernel cannot survive are [`Fatal`](crate::Fatal) instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PmmError {
    #[error("memory map holds no entries above the legacy region")]
    EmptyMemoryMap,
    #[error("no usable region can hold the {required}-byte frame bitmap")]
    NoBitmapRegion { required: u64 },
    #[error("frame allocator already initialized")]
    AlreadyInitialized,
    #[error("frame allocator not initialized")]
    NotInitialized,
}
