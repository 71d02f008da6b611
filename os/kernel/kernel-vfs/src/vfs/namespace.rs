//! Operations that change the shape of the tree.

use super::Vfs;
use crate::driver::MountedTree;
use crate::entry::{DirEntry, EntryId};
use crate::inode::{Inode, InodeId};
use crate::node::NodeType;
use crate::path;
use crate::registry::FsId;
use crate::VfsError;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use log::{debug, info};

impl Vfs {
    /// Creates an empty node of type `kind` at `path`, owned by the current identity.
    ///
    /// The new entry becomes the first child of its folder, then the
    /// folder's driver initializes it through `mknode`. If the driver fails,
    /// the entry is removed again and the driver's error is returned.
    ///
    /// # Errors
    /// * [`VfsError::AlreadyExists`] if `path` exists (the root always does).
    /// * [`VfsError::NotFound`] / [`VfsError::NotADirectory`] if the parent cannot be reached.
    /// * [`VfsError::InvalidArgument`] for `Mountpoint` (only `mount` makes those) or a malformed path.
    pub fn create(&mut self, path: &str, kind: NodeType) -> Result<(), VfsError> {
        if kind == NodeType::Mountpoint {
            return Err(VfsError::InvalidArgument);
        }
        let (parents, name) = path::split_last(path)?.ok_or(VfsError::AlreadyExists)?;
        let parent = self.folder_of(self.walk(&parents)?)?;
        self.create_in(parent, name, kind)?;
        debug!("vfs: created {kind} {path}");
        Ok(())
    }

    pub(super) fn create_in(
        &mut self,
        parent: InodeId,
        name: &str,
        kind: NodeType,
    ) -> Result<EntryId, VfsError> {
        if self.find_child(parent, name)?.is_some() {
            return Err(VfsError::AlreadyExists);
        }
        let fs = self.node(parent)?.fs;
        let mut inode = Inode::new(kind).with_uid(self.identity.uid);
        inode.fs = fs;
        let reference = self.adopt(inode)?;
        let id = reference.id();
        let entry = self.attach(parent, name, reference)?;

        if let Some(driver) = self.driver_of(id)?
            && let Err(e) = driver.mknode(name, self.node_mut(id)?)
        {
            debug!("vfs: mknode {name} failed: {e}");
            self.detach(entry)?;
            return Err(e);
        }
        Ok(entry)
    }

    /// Adds the name `new_path` for the node at `old_path`.
    ///
    /// # Errors
    /// * [`VfsError::NotFound`] if `old_path` does not exist.
    /// * [`VfsError::AlreadyExists`] if `new_path` does.
    /// * [`VfsError::InvalidArgument`] for folders and links across filesystems.
    /// * Any error of the driver's `setlink`, after which the new name is gone again.
    pub fn link(&mut self, old_path: &str, new_path: &str) -> Result<(), VfsError> {
        let target = self.entry_inode(self.lookup(old_path)?)?;
        let target_node = self.node(target)?;
        if target_node.is_folder() {
            return Err(VfsError::InvalidArgument);
        }
        let target_fs = target_node.fs;

        let (parents, name) = path::split_last(new_path)?.ok_or(VfsError::AlreadyExists)?;
        let parent = self.folder_of(self.walk(&parents)?)?;
        if self.find_child(parent, name)?.is_some() {
            return Err(VfsError::AlreadyExists);
        }
        if self.node(parent)?.fs != target_fs {
            return Err(VfsError::InvalidArgument);
        }

        let reference = self.retain(target)?;
        let entry = self.attach(parent, name, reference)?;
        if let Some(driver) = self.driver_of(target)?
            && let Err(e) = driver.setlink(name, self.node_mut(target)?)
        {
            self.detach(entry)?;
            return Err(e);
        }
        debug!("vfs: linked {new_path} -> {old_path}");
        Ok(())
    }

    /// Removes the name `path`. The node itself is freed once no other name
    /// or open descriptor refers to it.
    ///
    /// # Errors
    /// * [`VfsError::NotFound`] if `path` does not exist.
    /// * [`VfsError::InvalidArgument`] for the root, non-empty folders and mountpoints.
    pub fn unlink(&mut self, path: &str) -> Result<(), VfsError> {
        let (parents, name) = path::split_last(path)?.ok_or(VfsError::InvalidArgument)?;
        let parent = self.folder_of(self.walk(&parents)?)?;
        let entry = self.find_child(parent, name)?.ok_or(VfsError::NotFound)?;
        let inode = self.node(self.entry_inode(entry)?)?;
        if inode.kind == NodeType::Mountpoint || inode.child.is_some() {
            return Err(VfsError::InvalidArgument);
        }
        self.detach(entry)?;
        debug!("vfs: unlinked {path}");
        Ok(())
    }

    /// Mounts a tree of format `fs_name` at `path`.
    ///
    /// A missing final component is created as a folder first. Temporary
    /// formats ignore `device`; all others receive the node it names. The
    /// driver's `mount` runs exactly once per successful call.
    ///
    /// Descriptors opened on the folder before the mount keep referring to
    /// it: they still list its original, now covered, children, and reads
    /// and writes on them fail as on any folder.
    ///
    /// # Errors
    /// * [`VfsError::NotFound`] if the format is not registered, the device
    ///   does not exist, or the parent of `path` is missing.
    /// * [`VfsError::NotADirectory`] if `path` names something other than a folder.
    /// * [`VfsError::AlreadyExists`] if something is already mounted there.
    /// * Any error of the driver's `mount`.
    pub fn mount(&mut self, device: &str, path: &str, fs_name: &str) -> Result<(), VfsError> {
        let fs = self.registry.lookup(fs_name).ok_or(VfsError::NotFound)?;
        let info = self.registry.get(fs).ok_or(VfsError::NotFound)?;
        let (temporary, driver) = (info.temporary, Arc::clone(&info.driver));

        let device = if temporary {
            None
        } else {
            Some(self.entry_inode(self.lookup(device)?)?)
        };

        let (at, created) = self.mount_target(path)?;
        let at_inode = self.entry_inode(at)?;

        let tree = match device {
            None => driver.mount(None),
            Some(id) => driver.mount(Some(self.node(id)?)),
        };
        let result = tree.and_then(|tree| self.graft(at, fs, tree));
        let mounted = match result {
            Ok(mounted) => mounted,
            Err(e) => {
                if created {
                    self.detach(at)?;
                }
                return Err(e);
            }
        };

        let mountpoint = self.node_mut(at_inode)?;
        mountpoint.kind = NodeType::Mountpoint;
        mountpoint.mount = Some(mounted);
        self.registry.note_mounted(fs);
        info!("vfs: mounted {fs_name} at {path}");
        Ok(())
    }

    /// The folder entry `path` names, creating it if only the last component is missing.
    fn mount_target(&mut self, path: &str) -> Result<(EntryId, bool), VfsError> {
        let Some((parents, name)) = path::split_last(path)? else {
            let root = self.root;
            return self.check_mount_target(root).map(|()| (root, false));
        };
        let parent = self.folder_of(self.walk(&parents)?)?;
        match self.find_child(parent, name)? {
            Some(entry) => self.check_mount_target(entry).map(|()| (entry, false)),
            None => Ok((self.create_in(parent, name, NodeType::Folder)?, true)),
        }
    }

    fn check_mount_target(&self, entry: EntryId) -> Result<(), VfsError> {
        match self.node(self.entry_inode(entry)?)?.kind {
            NodeType::Folder => Ok(()),
            NodeType::Mountpoint => Err(VfsError::AlreadyExists),
            _ => Err(VfsError::NotADirectory),
        }
    }

    /// Builds the mounted tree beside `at`, returning its root entry.
    fn graft(&mut self, at: EntryId, fs: FsId, tree: MountedTree) -> Result<EntryId, VfsError> {
        let MountedTree { mut root, nodes } = tree;
        root.kind = NodeType::Folder;
        root.fs = Some(fs);
        let (name, parent) = {
            let e = self.entries.get(at).ok_or(VfsError::IoError)?;
            let mut name = String::new();
            name.try_reserve_exact(e.name.len())?;
            name.push_str(&e.name);
            (name, e.parent)
        };
        let reference = self.adopt(root)?;
        let root_inode = reference.id();
        let entry = match self.entries.insert(DirEntry {
            name,
            inode: reference,
            parent,
            sibling: None,
        }) {
            Ok(entry) => entry,
            Err(e) => {
                self.release(e.inode);
                return Err(VfsError::NoSpace);
            }
        };

        for (path, mut node) in nodes {
            node.fs = Some(fs);
            if let Err(e) = self.graft_node(root_inode, &path, node) {
                self.prune(entry);
                return Err(e);
            }
        }
        Ok(entry)
    }

    fn graft_node(&mut self, root: InodeId, path: &str, node: Inode) -> Result<(), VfsError> {
        let (parents, name) = path::split_last(path)?.ok_or(VfsError::InvalidArgument)?;
        let mut dir = root;
        for component in parents {
            let next = self.find_child(dir, component)?.ok_or(VfsError::NotFound)?;
            dir = self.folder_of(next)?;
        }
        if self.find_child(dir, name)?.is_some() {
            return Err(VfsError::AlreadyExists);
        }
        let reference = self.adopt(node)?;
        self.attach(dir, name, reference)?;
        Ok(())
    }

    /// Frees a detached subtree rooted at `entry`.
    fn prune(&mut self, entry: EntryId) {
        let mut stack = Vec::new();
        stack.push(entry);
        while let Some(id) = stack.pop() {
            let Some(removed) = self.entries.remove(id) else {
                continue;
            };
            let mut child = self.inodes.get(removed.inode()).and_then(|i| i.child);
            while let Some(c) = child {
                stack.push(c);
                child = self.entries.get(c).and_then(|e| e.sibling);
            }
            self.release(removed.inode);
        }
    }
}
