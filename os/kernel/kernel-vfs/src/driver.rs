//! # Filesystem Driver Contract
//!
//! A filesystem format plugs into the switch by implementing [`Filesystem`]
//! and registering a [`FilesystemInfo`] under a short name. The switch picks
//! the driver by name at mount time and from then on calls it for every
//! inode of the mounted tree.
//!
//! Callbacks run while the caller holds the switch exclusively; a driver
//! must not call back into the global instance.

use crate::inode::Inode;
use crate::VfsError;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

/// Operations a filesystem format provides.
///
/// Errors returned here reach the caller of the switch unchanged.
pub trait Filesystem: Send + Sync {
    /// Produces the root of a new mounted tree.
    ///
    /// `device` is the inode named by the mount's device path, or `None`
    /// for temporary filesystems, which have no backing device.
    fn mount(&self, device: Option<&Inode>) -> Result<MountedTree, VfsError>;

    /// Called after a node named `name` was created in this filesystem.
    fn mknode(&self, name: &str, node: &mut Inode) -> Result<(), VfsError>;

    /// Reads up to `buf.len()` bytes at `offset`, returning the count read.
    fn read(&self, node: &mut Inode, offset: u64, buf: &mut [u8]) -> Result<usize, VfsError>;

    /// Writes `buf` at `offset`, returning the count written.
    fn write(&self, node: &mut Inode, offset: u64, buf: &[u8]) -> Result<usize, VfsError>;

    fn sync(&self, _node: &mut Inode) -> Result<(), VfsError> {
        Ok(())
    }

    fn refresh(&self, _node: &mut Inode) -> Result<(), VfsError> {
        Ok(())
    }

    /// Called after a new name `name` was linked to `target`.
    fn setlink(&self, _name: &str, _target: &mut Inode) -> Result<(), VfsError> {
        Ok(())
    }

    fn ioctl(&self, _node: &mut Inode, _request: u64, _data: &mut [u8]) -> Result<i64, VfsError> {
        Err(VfsError::InvalidArgument)
    }
}

/// What a driver hands back from [`Filesystem::mount`]: the root inode and
/// any nodes that already exist on the device.
#[derive(Debug)]
pub struct MountedTree {
    pub(crate) root: Inode,
    pub(crate) nodes: Vec<(String, Inode)>,
}

impl MountedTree {
    #[must_use]
    pub const fn new(root: Inode) -> Self {
        Self {
            root,
            nodes: Vec::new(),
        }
    }

    /// Adds a pre-existing node at `path`, relative to the mounted root.
    ///
    /// Parents must be added before their children.
    #[must_use]
    pub fn with_node(mut self, path: impl Into<String>, node: Inode) -> Self {
        self.nodes.push((path.into(), node));
        self
    }
}

/// A validated filesystem format name of 1 to 16 bytes.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FsName {
    bytes: [u8; crate::limits::MAX_FS_NAME_LEN],
    len: u8,
}

impl FsName {
    /// # Errors
    /// [`VfsError::InvalidArgument`] if `name` is empty or too long.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(name: &str) -> Result<Self, VfsError> {
        let src = name.as_bytes();
        if src.is_empty() || src.len() > crate::limits::MAX_FS_NAME_LEN {
            return Err(VfsError::InvalidArgument);
        }
        let mut bytes = [0; crate::limits::MAX_FS_NAME_LEN];
        bytes[..src.len()].copy_from_slice(src);
        Ok(Self {
            bytes,
            len: src.len() as u8,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..usize::from(self.len)]).unwrap_or_default()
    }
}

impl fmt::Debug for FsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for FsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registrable filesystem format.
#[derive(Clone)]
pub struct FilesystemInfo {
    pub name: FsName,
    /// Temporary filesystems live in memory only and mount without a device.
    pub temporary: bool,
    pub driver: Arc<dyn Filesystem>,
}

impl FilesystemInfo {
    /// # Errors
    /// [`VfsError::InvalidArgument`] if `name` is not a valid [`FsName`].
    pub fn new(name: &str, temporary: bool, driver: Arc<dyn Filesystem>) -> Result<Self, VfsError> {
        Ok(Self {
            name: FsName::new(name)?,
            temporary,
            driver,
        })
    }
}

impl fmt::Debug for FilesystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilesystemInfo")
            .field("name", &self.name)
            .field("temporary", &self.temporary)
            .finish_non_exhaustive()
    }
}
