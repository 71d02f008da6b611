//! # The Filesystem Switch
//!
//! [`Vfs`] owns the whole namespace: an arena of inodes, an arena of
//! directory entries linking them into a tree, the registry of filesystem
//! formats and the table of open descriptors. Nothing outside holds a
//! pointer into the tree; callers see ids and handles.
//!
//! ```text
//!  entries                       inodes
//! ┌──────────┐  inode   ┌──────────────────────┐
//! │ "/"      │ ───────► │ Folder    child ─────┼──► "mnt" ─sibling─► "etc"
//! └──────────┘          └──────────────────────┘      │
//!                                                       ▼ inode
//!                                        ┌──────────────────────────┐
//!                                        │ Mountpoint  mount ───────┼──► mounted root entry
//!                                        └──────────────────────────┘
//! ```
//!
//! Namespace mutations (`create`, `link`, `unlink`, `mount`) live in the
//! `namespace` submodule; descriptor operations in `io`.

mod io;
mod namespace;

use crate::arena::Arena;
use crate::driver::{Filesystem, FilesystemInfo};
use crate::entry::{DirEntry, EntryId, InodeRef};
use crate::file::FileTable;
use crate::inode::{Inode, InodeId, NodeStat};
use crate::limits::ROOT_UID;
use crate::node::{Credentials, NodeType};
use crate::path;
use crate::registry::{FsId, Registry};
use crate::VfsError;
use alloc::string::String;
use alloc::sync::Arc;
use log::{debug, info, warn};

/// Where a path leads: the folder holding the final component and the
/// entry of that name, if present.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub parent: InodeId,
    /// The named entry, with mounts already followed.
    pub entry: Option<EntryId>,
}

pub struct Vfs {
    inodes: Arena<InodeId, Inode>,
    entries: Arena<EntryId, DirEntry>,
    root: EntryId,
    registry: Registry,
    files: FileTable,
    identity: Credentials,
}

impl Vfs {
    /// Creates a namespace holding only the root folder, owned by uid 0.
    ///
    /// # Errors
    /// [`VfsError::NoSpace`] if the root cannot be allocated.
    pub fn new() -> Result<Self, VfsError> {
        let mut inodes = Arena::new();
        let mut root_inode = Inode::new(NodeType::Folder).with_uid(ROOT_UID);
        root_inode.refcount = 1;
        let root_id = inodes.insert(root_inode).map_err(|_| VfsError::NoSpace)?;

        let mut entries = Arena::new();
        let root = entries
            .insert(DirEntry {
                name: String::from("/"),
                inode: InodeRef::new(root_id),
                parent: None,
                sibling: None,
            })
            .map_err(|_| VfsError::NoSpace)?;

        info!("vfs: namespace initialized");
        Ok(Self {
            inodes,
            entries,
            root,
            registry: Registry::new(),
            files: FileTable::new(),
            identity: Credentials::ROOT,
        })
    }

    /// Sets the identity subsequent operations are checked against.
    pub const fn set_identity(&mut self, identity: Credentials) {
        self.identity = identity;
    }

    #[must_use]
    pub const fn identity(&self) -> Credentials {
        self.identity
    }

    /// Makes a filesystem format available to [`mount`](Self::mount).
    ///
    /// # Errors
    /// * [`VfsError::AlreadyExists`] if the name is taken.
    /// * [`VfsError::RegistryFull`] if every registry slot is in use.
    pub fn register_filesystem(&mut self, info: FilesystemInfo) -> Result<FsId, VfsError> {
        let name = info.name;
        match self.registry.register(info) {
            Ok(id) => {
                info!("vfs: registered filesystem {name} as {id:?}");
                Ok(id)
            }
            Err(e) => {
                warn!("vfs: cannot register filesystem {name}: {e}");
                Err(e)
            }
        }
    }

    /// # Errors
    /// * [`VfsError::NotFound`] if no format has this name.
    /// * [`VfsError::InvalidArgument`] while a tree of this format is mounted.
    pub fn unregister_filesystem(&mut self, name: &str) -> Result<FilesystemInfo, VfsError> {
        let info = self.registry.unregister(name)?;
        info!("vfs: unregistered filesystem {}", info.name);
        Ok(info)
    }

    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub const fn root(&self) -> EntryId {
        self.root
    }

    #[must_use]
    pub fn inode(&self, id: InodeId) -> Option<&Inode> {
        self.inodes.get(id)
    }

    #[must_use]
    pub fn entry(&self, id: EntryId) -> Option<&DirEntry> {
        self.entries.get(id)
    }

    #[must_use]
    pub const fn inode_count(&self) -> usize {
        self.inodes.len()
    }

    #[must_use]
    pub const fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn open_files(&self) -> usize {
        self.files.open_count()
    }

    /// Takes one more reference to `id`.
    ///
    /// # Errors
    /// [`VfsError::NotFound`] if the inode no longer exists.
    pub fn retain(&mut self, id: InodeId) -> Result<InodeRef, VfsError> {
        let inode = self.inodes.get_mut(id).ok_or(VfsError::NotFound)?;
        inode.refcount += 1;
        Ok(InodeRef::new(id))
    }

    /// Gives a reference back, freeing the inode when it was the last one.
    #[allow(clippy::needless_pass_by_value)]
    pub fn release(&mut self, reference: InodeRef) {
        let id = reference.id();
        let Some(inode) = self.inodes.get_mut(id) else {
            warn!("vfs: release of vanished inode {id:?}");
            return;
        };
        debug_assert!(inode.refcount > 0);
        inode.refcount = inode.refcount.saturating_sub(1);
        if inode.refcount == 0
            && let Some(inode) = self.inodes.remove(id)
        {
            debug!("vfs: freed {} inode {id:?}", inode.kind);
        }
    }

    /// Resolves `path` to its parent folder and the entry it names.
    ///
    /// Every mountpoint on the way, the final one included, is crossed into
    /// the tree mounted there. The root resolves to itself as its own parent.
    ///
    /// # Errors
    /// * [`VfsError::NotFound`] if an intermediate component is missing.
    /// * [`VfsError::NotADirectory`] if an intermediate component is not a folder.
    /// * [`VfsError::InvalidArgument`] for malformed paths.
    pub fn resolve(&self, path: &str) -> Result<Resolved, VfsError> {
        match path::split_last(path)? {
            None => {
                let root = self.follow(self.root)?;
                Ok(Resolved {
                    parent: self.entry_inode(root)?,
                    entry: Some(root),
                })
            }
            Some((parents, name)) => {
                let dir = self.walk(&parents)?;
                let parent = self.folder_of(dir)?;
                let entry = self.find_child(parent, name)?.map(|e| self.follow(e)).transpose()?;
                Ok(Resolved { parent, entry })
            }
        }
    }

    /// Metadata of the node at `path`.
    ///
    /// # Errors
    /// As [`resolve`](Self::resolve), plus [`VfsError::NotFound`] if the final component is missing.
    pub fn stat(&self, path: &str) -> Result<NodeStat, VfsError> {
        let entry = self.lookup(path)?;
        Ok(self.node(self.entry_inode(entry)?)?.stat())
    }

    /// The entry `path` names, mounts followed.
    fn lookup(&self, path: &str) -> Result<EntryId, VfsError> {
        self.resolve(path)?.entry.ok_or(VfsError::NotFound)
    }

    /// Walks `components` from the root, returning the entry reached.
    fn walk(&self, components: &[&str]) -> Result<EntryId, VfsError> {
        let mut current = self.follow(self.root)?;
        for name in components {
            let dir = self.folder_of(current)?;
            let next = self.find_child(dir, name)?.ok_or(VfsError::NotFound)?;
            current = self.follow(next)?;
        }
        Ok(current)
    }

    /// Crosses mountpoints until an entry that is not one is reached.
    fn follow(&self, mut entry: EntryId) -> Result<EntryId, VfsError> {
        loop {
            let inode = self.node(self.entry_inode(entry)?)?;
            match (inode.kind, inode.mount) {
                (NodeType::Mountpoint, Some(mounted)) => entry = mounted,
                _ => return Ok(entry),
            }
        }
    }

    /// The folder inode of `entry`, or [`VfsError::NotADirectory`].
    fn folder_of(&self, entry: EntryId) -> Result<InodeId, VfsError> {
        let id = self.entry_inode(entry)?;
        if self.node(id)?.is_folder() {
            Ok(id)
        } else {
            Err(VfsError::NotADirectory)
        }
    }

    fn find_child(&self, dir: InodeId, name: &str) -> Result<Option<EntryId>, VfsError> {
        let mut cursor = self.node(dir)?.child;
        while let Some(id) = cursor {
            let entry = self.entries.get(id).ok_or(VfsError::IoError)?;
            if entry.name == name {
                return Ok(Some(id));
            }
            cursor = entry.sibling;
        }
        Ok(None)
    }

    /// Children of `dir` in list order.
    pub(crate) fn children(&self, dir: InodeId) -> impl Iterator<Item = (EntryId, &DirEntry)> {
        let mut cursor = self.inodes.get(dir).and_then(|i| i.child);
        core::iter::from_fn(move || {
            let id = cursor?;
            let entry = self.entries.get(id)?;
            cursor = entry.sibling;
            Some((id, entry))
        })
    }

    fn entry_inode(&self, entry: EntryId) -> Result<InodeId, VfsError> {
        self.entries
            .get(entry)
            .map(DirEntry::inode)
            .ok_or(VfsError::IoError)
    }

    fn node(&self, id: InodeId) -> Result<&Inode, VfsError> {
        self.inodes.get(id).ok_or(VfsError::IoError)
    }

    fn node_mut(&mut self, id: InodeId) -> Result<&mut Inode, VfsError> {
        self.inodes.get_mut(id).ok_or(VfsError::IoError)
    }

    fn driver_of(&self, id: InodeId) -> Result<Option<Arc<dyn Filesystem>>, VfsError> {
        Ok(self.node(id)?.fs.and_then(|fs| self.registry.driver(fs)))
    }

    /// Stores a new inode holding one reference, returned to the caller.
    fn adopt(&mut self, mut inode: Inode) -> Result<InodeRef, VfsError> {
        inode.refcount = 1;
        let id = self.inodes.insert(inode).map_err(|_| VfsError::NoSpace)?;
        Ok(InodeRef::new(id))
    }

    /// Links a new entry `name` → `inode` at the head of `parent`'s children.
    ///
    /// On failure the reference is released.
    fn attach(&mut self, parent: InodeId, name: &str, inode: InodeRef) -> Result<EntryId, VfsError> {
        let head = match self.node(parent) {
            Ok(p) => p.child,
            Err(e) => {
                self.release(inode);
                return Err(e);
            }
        };
        let mut owned = String::new();
        if owned.try_reserve_exact(name.len()).is_err() {
            self.release(inode);
            return Err(VfsError::NoSpace);
        }
        owned.push_str(name);
        let entry = DirEntry {
            name: owned,
            inode,
            parent: Some(parent),
            sibling: head,
        };
        match self.entries.insert(entry) {
            Ok(id) => {
                self.node_mut(parent)?.child = Some(id);
                Ok(id)
            }
            Err(entry) => {
                self.release(entry.inode);
                Err(VfsError::NoSpace)
            }
        }
    }

    /// Unlinks `entry` from its parent's child list and drops it, releasing its inode.
    fn detach(&mut self, entry: EntryId) -> Result<(), VfsError> {
        let (parent, next) = {
            let e = self.entries.get(entry).ok_or(VfsError::IoError)?;
            (e.parent.ok_or(VfsError::InvalidArgument)?, e.sibling)
        };
        let head = self.node(parent)?.child;
        if head == Some(entry) {
            self.node_mut(parent)?.child = next;
        } else {
            let mut cursor = head;
            loop {
                let id = cursor.ok_or(VfsError::IoError)?;
                let e = self.entries.get_mut(id).ok_or(VfsError::IoError)?;
                if e.sibling == Some(entry) {
                    e.sibling = next;
                    break;
                }
                cursor = e.sibling;
            }
        }
        self.files.skip_removed(entry, next);
        let removed = self.entries.remove(entry).ok_or(VfsError::IoError)?;
        self.release(removed.inode);
        Ok(())
    }
}
