use kernel_info::boot::MemoryMapEntry;
use kernel_pmm::phys_mapper::PhysMapper;
use kernel_pmm::{MemoryStats, PmmError};
use kernel_sync::SlotError;
use kernel_vfs::{Credentials, VfsError};
use log::info;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootError {
    #[error("physical memory: {0}")]
    Memory(#[from] PmmError),
    #[error("filesystem: {0}")]
    Filesystem(#[from] VfsError),
    #[error("filesystem instance: {0}")]
    FilesystemSlot(#[from] SlotError),
}

/// Brings up the frame allocator, then the filesystem switch.
///
/// VFS operations will be checked against `identity`. Returns the memory
/// statistics right after allocator setup.
///
/// # Errors
/// Either subsystem's initialization error; in particular
/// [`PmmError::AlreadyInitialized`] / [`VfsError::AlreadyExists`] on a second call.
///
/// # Safety
/// `map` must describe the machine's physical memory, and `mapper` must
/// translate every usable physical range to writable memory.
pub unsafe fn init_resources(
    map: &'static [MemoryMapEntry],
    mapper: &impl PhysMapper,
    identity: Credentials,
) -> Result<MemoryStats, BootError> {
    info!("Initializing physical memory ...");
    // SAFETY: forwarded to the caller.
    unsafe { kernel_pmm::global::init(map, mapper) }?;
    kernel_pmm::global::audit_consistency()?;
    let stats = kernel_pmm::global::stats()?;
    info!(
        "Physical memory ready: {} MiB free of {} MiB usable",
        stats.free_mem / MIB,
        stats.total_mem / MIB
    );

    info!("Initializing virtual filesystem ...");
    kernel_vfs::global::init()?;
    kernel_vfs::global::with_vfs(|vfs| vfs.set_identity(identity))?;
    info!("Virtual filesystem ready (uid {})", identity.uid);

    Ok(stats)
}

/// Returns bootloader-reclaimable memory to the allocator, returning the byte count.
///
/// # Errors
/// [`PmmError::NotInitialized`] before [`init_resources`].
pub fn reclaim_boot_memory() -> Result<u64, BootError> {
    let bytes = kernel_pmm::global::reclaim_bootloader_memory()?;
    kernel_pmm::global::audit_consistency()?;
    info!("Reclaimed {} KiB of bootloader memory", bytes / 1024);
    Ok(bytes)
}

/// Removes both global instances again, filesystem first.
///
/// # Errors
/// The first subsystem that was not initialized.
pub fn teardown_resources() -> Result<(), BootError> {
    kernel_vfs::global::teardown()?;
    kernel_pmm::global::teardown()?;
    info!("Kernel resources torn down");
    Ok(())
}
