//! # Inodes
//!
//! An [`Inode`] is the object a name points at: its type, size, permission
//! bits, owner and an opaque payload that only the owning driver interprets.
//! Structural fields (reference count, owning filesystem, children, mount
//! override) are maintained by the switch and are read-only to drivers.

use crate::arena::arena_id;
use crate::entry::EntryId;
use crate::limits::{DEFAULT_FOLDER_PERMS, DEFAULT_NODE_PERMS};
use crate::node::{NodeType, Permissions};
use crate::registry::FsId;
use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

arena_id!(
    /// Stable id of an inode in the switch's arena.
    InodeId
);

/// Driver-private data carried by an inode.
///
/// The switch never looks inside; drivers downcast it back to their own type.
#[derive(Default)]
pub struct DriverData(Option<Box<dyn Any + Send + Sync>>);

impl DriverData {
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.as_deref_mut().and_then(|v| v.downcast_mut())
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for DriverData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_some() { "DriverData(..)" } else { "DriverData(-)" })
    }
}

#[derive(Debug)]
pub struct Inode {
    pub(crate) kind: NodeType,
    size: u64,
    perms: Permissions,
    uid: u32,
    pub(crate) refcount: usize,
    pub(crate) fs: Option<FsId>,
    payload: DriverData,
    /// Root entry of the tree mounted here (`kind == Mountpoint` only).
    pub(crate) mount: Option<EntryId>,
    /// Head of the child list (folders only).
    pub(crate) child: Option<EntryId>,
}

impl Inode {
    /// A fresh, unowned node with the default permissions for `kind`.
    #[must_use]
    pub fn new(kind: NodeType) -> Self {
        let mode = if kind == NodeType::Folder {
            DEFAULT_FOLDER_PERMS
        } else {
            DEFAULT_NODE_PERMS
        };
        Self {
            kind,
            size: 0,
            perms: Permissions::from_mode(mode),
            uid: 0,
            refcount: 0,
            fs: None,
            payload: DriverData::default(),
            mount: None,
            child: None,
        }
    }

    #[must_use]
    pub fn with_perms(mut self, perms: Permissions) -> Self {
        self.perms = perms;
        self
    }

    #[must_use]
    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = uid;
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn with_payload<T: Any + Send + Sync>(mut self, payload: T) -> Self {
        self.payload = DriverData::new(payload);
        self
    }

    #[must_use]
    pub const fn kind(&self) -> NodeType {
        self.kind
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    pub const fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    #[must_use]
    pub const fn perms(&self) -> Permissions {
        self.perms
    }

    pub(crate) const fn set_perms(&mut self, perms: Permissions) {
        self.perms = perms;
    }

    #[must_use]
    pub const fn uid(&self) -> u32 {
        self.uid
    }

    /// Number of directory entries and open descriptors referring to this node.
    #[must_use]
    pub const fn refcount(&self) -> usize {
        self.refcount
    }

    #[must_use]
    pub const fn fs(&self) -> Option<FsId> {
        self.fs
    }

    #[must_use]
    pub const fn is_folder(&self) -> bool {
        matches!(self.kind, NodeType::Folder)
    }

    /// Whether the node carries a child list: folders, and mountpoints for
    /// descriptors opened before the mount covered them.
    #[must_use]
    pub const fn is_listable(&self) -> bool {
        matches!(self.kind, NodeType::Folder | NodeType::Mountpoint)
    }

    #[must_use]
    pub const fn payload(&self) -> &DriverData {
        &self.payload
    }

    pub const fn payload_mut(&mut self) -> &mut DriverData {
        &mut self.payload
    }

    pub fn set_payload<T: Any + Send + Sync>(&mut self, payload: T) {
        self.payload = DriverData::new(payload);
    }

    pub(crate) fn stat(&self) -> NodeStat {
        NodeStat {
            kind: self.kind,
            size: self.size,
            perms: self.perms,
            uid: self.uid,
            refcount: self.refcount,
            fs: self.fs,
        }
    }
}

/// Metadata snapshot returned by `stat` / `fstat`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NodeStat {
    pub kind: NodeType,
    pub size: u64,
    pub perms: Permissions,
    pub uid: u32,
    pub refcount: usize,
    pub fs: Option<FsId>,
}
