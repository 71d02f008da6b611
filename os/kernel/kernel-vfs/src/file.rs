//! # Open File Descriptors
//!
//! Descriptors live in a table indexed by [`Handle`]. Closing frees the slot
//! and the next `open` reuses the lowest free one.

use crate::entry::{EntryId, InodeRef};
use crate::limits::MAX_OPEN_FILES;
use crate::node::OpenMode;
use crate::VfsError;
use alloc::vec::Vec;
use core::fmt;

/// Small non-negative integer naming an open descriptor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    /// Interprets a raw status value as a handle; negative values are errors, not handles.
    #[must_use]
    pub fn from_raw(raw: i64) -> Option<Self> {
        u32::try_from(raw).ok().map(Self)
    }

    #[must_use]
    pub fn as_raw(self) -> i64 {
        i64::from(self.0)
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<Handle> for i64 {
    fn from(value: Handle) -> Self {
        value.as_raw()
    }
}

/// Where a folder listing resumes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Listing {
    /// Nothing listed yet; begins at the folder's first child at that time.
    Start,
    /// The next child to list.
    At(EntryId),
    /// Every child was listed.
    Done,
}

impl Listing {
    pub(crate) fn resume_at(next: Option<EntryId>) -> Self {
        next.map_or(Self::Done, Self::At)
    }
}

#[derive(Debug)]
pub struct OpenFile {
    /// The entry `open` resolved to, after following mounts.
    pub(crate) entry: EntryId,
    pub(crate) inode: InodeRef,
    pub(crate) mode: OpenMode,
    /// Byte offset for files; number of children already listed for folders.
    pub(crate) pos: u64,
    pub(crate) listing: Listing,
}

impl OpenFile {
    #[must_use]
    pub const fn entry(&self) -> EntryId {
        self.entry
    }

    #[must_use]
    pub const fn mode(&self) -> OpenMode {
        self.mode
    }

    #[must_use]
    pub const fn position(&self) -> u64 {
        self.pos
    }
}

#[derive(Debug, Default)]
pub struct FileTable {
    slots: Vec<Option<OpenFile>>,
}

impl FileTable {
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Stores `file` in the lowest free slot.
    ///
    /// # Errors
    /// [`VfsError::NoSpace`] if [`MAX_OPEN_FILES`] descriptors are open or
    /// the table cannot grow; `file` is handed back so its inode reference
    /// can be released.
    #[allow(clippy::cast_possible_truncation)]
    pub fn insert(&mut self, file: OpenFile) -> Result<Handle, (VfsError, OpenFile)> {
        let index = match self.slots.iter().position(Option::is_none) {
            Some(index) => index,
            None if self.slots.len() >= MAX_OPEN_FILES => return Err((VfsError::NoSpace, file)),
            None => {
                if self.slots.try_reserve(1).is_err() {
                    return Err((VfsError::NoSpace, file));
                }
                self.slots.push(None);
                self.slots.len() - 1
            }
        };
        self.slots[index] = Some(file);
        Ok(Handle(index as u32))
    }

    /// # Errors
    /// [`VfsError::InvalidHandle`] if `handle` is out of range or closed.
    pub fn get(&self, handle: Handle) -> Result<&OpenFile, VfsError> {
        self.slots
            .get(handle.index())
            .and_then(Option::as_ref)
            .ok_or(VfsError::InvalidHandle)
    }

    /// # Errors
    /// [`VfsError::InvalidHandle`] if `handle` is out of range or closed.
    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut OpenFile, VfsError> {
        self.slots
            .get_mut(handle.index())
            .and_then(Option::as_mut)
            .ok_or(VfsError::InvalidHandle)
    }

    /// # Errors
    /// [`VfsError::InvalidHandle`] if `handle` is out of range or closed.
    pub fn remove(&mut self, handle: Handle) -> Result<OpenFile, VfsError> {
        self.slots
            .get_mut(handle.index())
            .and_then(Option::take)
            .ok_or(VfsError::InvalidHandle)
    }

    /// Moves listings about to resume at `removed` on to its successor.
    pub(crate) fn skip_removed(&mut self, removed: EntryId, next: Option<EntryId>) {
        for file in self.slots.iter_mut().flatten() {
            if file.listing == Listing::At(removed) {
                file.listing = Listing::resume_at(next);
            }
        }
    }

    #[must_use]
    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
