//! # Filesystem Format Registry
//!
//! A fixed table of [`MAX_FILESYSTEMS`] slots. Ids are slot indices; a slot
//! cannot be vacated while any tree of its format is mounted, so an
//! [`FsId`] held by a live inode always names the driver that created it.

use crate::driver::{Filesystem, FilesystemInfo, FsName};
use crate::limits::MAX_FILESYSTEMS;
use crate::VfsError;
use alloc::sync::Arc;

/// Index of a registered filesystem format.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FsId(u8);

impl FsId {
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

struct Registered {
    info: FilesystemInfo,
    mounts: usize,
}

pub struct Registry {
    slots: [Option<Registered>; MAX_FILESYSTEMS],
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }

    /// # Errors
    /// * [`VfsError::AlreadyExists`] if the name is taken.
    /// * [`VfsError::RegistryFull`] if every slot is in use.
    #[allow(clippy::cast_possible_truncation)]
    pub fn register(&mut self, info: FilesystemInfo) -> Result<FsId, VfsError> {
        if self.lookup(info.name.as_str()).is_some() {
            return Err(VfsError::AlreadyExists);
        }
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(VfsError::RegistryFull)?;
        self.slots[index] = Some(Registered { info, mounts: 0 });
        Ok(FsId(index as u8))
    }

    /// # Errors
    /// * [`VfsError::NotFound`] if no format has this name.
    /// * [`VfsError::InvalidArgument`] while a tree of this format is mounted.
    pub fn unregister(&mut self, name: &str) -> Result<FilesystemInfo, VfsError> {
        let id = self.lookup(name).ok_or(VfsError::NotFound)?;
        let slot = &mut self.slots[id.index()];
        if slot.as_ref().is_some_and(|r| r.mounts > 0) {
            return Err(VfsError::InvalidArgument);
        }
        slot.take().map(|r| r.info).ok_or(VfsError::NotFound)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn lookup(&self, name: &str) -> Option<FsId> {
        let name = FsName::new(name).ok()?;
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|r| r.info.name == name))
            .map(|i| FsId(i as u8))
    }

    #[must_use]
    pub fn get(&self, id: FsId) -> Option<&FilesystemInfo> {
        self.slots.get(id.index())?.as_ref().map(|r| &r.info)
    }

    /// The driver of `id`, detached from the registry borrow.
    #[must_use]
    pub fn driver(&self, id: FsId) -> Option<Arc<dyn Filesystem>> {
        self.get(id).map(|info| Arc::clone(&info.driver))
    }

    pub(crate) fn note_mounted(&mut self, id: FsId) {
        if let Some(Some(r)) = self.slots.get_mut(id.index()) {
            r.mounts += 1;
        }
    }

    #[must_use]
    pub fn mount_count(&self, id: FsId) -> usize {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .map_or(0, |r| r.mounts)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = (FsId, &FilesystemInfo)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|r| (FsId(i as u8), &r.info)))
    }
}
