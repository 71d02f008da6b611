//! # Directory Entries and Inode References

use crate::arena::arena_id;
use crate::inode::InodeId;
use alloc::string::String;

arena_id!(
    /// Stable id of a directory entry in the switch's arena.
    EntryId
);

/// An owned share of an inode's reference count.
///
/// Obtained from the switch when a name or an open descriptor starts
/// referring to an inode and handed back exactly once when it stops. The
/// token is neither `Clone` nor `Copy`, so a reference cannot be released
/// twice.
#[must_use = "an InodeRef must be handed back to the Vfs or the inode leaks"]
#[derive(Debug, PartialEq, Eq)]
pub struct InodeRef {
    id: InodeId,
}

impl InodeRef {
    pub(crate) const fn new(id: InodeId) -> Self {
        Self { id }
    }

    #[must_use]
    pub const fn id(&self) -> InodeId {
        self.id
    }
}

/// A named link from a parent folder to an inode.
///
/// Siblings form a singly linked list through [`sibling`](Self::sibling),
/// newest first.
#[derive(Debug)]
pub struct DirEntry {
    pub(crate) name: String,
    pub(crate) inode: InodeRef,
    /// `None` only for the namespace root.
    pub(crate) parent: Option<InodeId>,
    pub(crate) sibling: Option<EntryId>,
}

impl DirEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn inode(&self) -> InodeId {
        self.inode.id()
    }

    #[must_use]
    pub const fn parent(&self) -> Option<InodeId> {
        self.parent
    }

    #[must_use]
    pub const fn sibling(&self) -> Option<EntryId> {
        self.sibling
    }
}
