//! Operations on open descriptors.

use super::Vfs;
use crate::dirent;
use crate::file::{Handle, Listing, OpenFile};
use crate::inode::{InodeId, NodeStat};
use crate::limits::MAX_PERMS;
use crate::node::{NodeType, OpenMode, Permissions};
use crate::VfsError;
use log::{debug, warn};

impl Vfs {
    /// Opens the node at `path` with the cursor at 0.
    ///
    /// # Errors
    /// * [`VfsError::NotFound`] / [`VfsError::NotADirectory`] if the path does not resolve.
    /// * [`VfsError::PermissionDenied`] if the permission bits do not grant `mode` to the caller.
    /// * [`VfsError::NoSpace`] if the descriptor table is full.
    pub fn open(&mut self, path: &str, mode: OpenMode) -> Result<Handle, VfsError> {
        let entry = self.lookup(path)?;
        let id = self.entry_inode(entry)?;
        let node = self.node(id)?;
        if !self.identity.may_open(node.uid(), node.perms(), mode) {
            debug!("vfs: open {path} {mode:?} denied for uid {}", self.identity.uid);
            return Err(VfsError::PermissionDenied);
        }

        let inode = self.retain(id)?;
        let file = OpenFile {
            entry,
            inode,
            mode,
            pos: 0,
            listing: Listing::Start,
        };
        match self.files.insert(file) {
            Ok(handle) => {
                debug!("vfs: opened {path} as {handle}");
                Ok(handle)
            }
            Err((e, file)) => {
                self.release(file.inode);
                Err(e)
            }
        }
    }

    /// Closes `handle`, freeing its slot for reuse.
    ///
    /// # Errors
    /// [`VfsError::InvalidHandle`] if `handle` is not open.
    pub fn close(&mut self, handle: Handle) -> Result<(), VfsError> {
        let file = self.files.remove(handle).inspect_err(|_| {
            warn!("vfs: close of invalid handle {handle}");
        })?;
        self.release(file.inode);
        debug!("vfs: closed {handle}");
        Ok(())
    }

    /// Moves the cursor. Positions past the end are allowed.
    ///
    /// For folders the position counts children: [`getdents`](Self::getdents)
    /// continues with the child at that index of the current listing, and
    /// seeking to 0 rewinds it.
    ///
    /// # Errors
    /// [`VfsError::InvalidHandle`] if `handle` is not open.
    pub fn seek(&mut self, handle: Handle, pos: u64) -> Result<u64, VfsError> {
        let file = self.files.get(handle)?;
        let id = file.inode.id();
        let listing = match (self.node(id)?.is_listable(), pos) {
            (false, _) => file.listing,
            (true, 0) => Listing::Start,
            (true, _) => {
                let skip = usize::try_from(pos).unwrap_or(usize::MAX);
                Listing::resume_at(self.children(id).nth(skip).map(|(child, _)| child))
            }
        };
        let file = self.files.get_mut(handle)?;
        file.pos = pos;
        file.listing = listing;
        Ok(pos)
    }

    /// Reads into `buf` at the cursor and advances it by the count read.
    ///
    /// Reads of a file stop at its size; at or past the end they return 0.
    ///
    /// # Errors
    /// * [`VfsError::InvalidHandle`] if `handle` is not open.
    /// * [`VfsError::PermissionDenied`] if it was not opened for reading.
    /// * [`VfsError::InvalidArgument`] for folders.
    /// * [`VfsError::IoError`] if no driver backs the node, or any driver error.
    pub fn read(&mut self, handle: Handle, buf: &mut [u8]) -> Result<usize, VfsError> {
        let (id, pos) = self.transfer_target(handle, OpenMode::Read)?;
        let node = self.node(id)?;
        let len = if node.kind() == NodeType::File {
            let available = node.size().saturating_sub(pos);
            usize::try_from(available).map_or(buf.len(), |a| a.min(buf.len()))
        } else {
            buf.len()
        };
        if len == 0 {
            return Ok(0);
        }

        let driver = self.driver_of(id)?.ok_or(VfsError::IoError)?;
        let n = driver.read(self.node_mut(id)?, pos, &mut buf[..len])?.min(len);
        self.files.get_mut(handle)?.pos = pos.saturating_add(n as u64);
        Ok(n)
    }

    /// Writes `buf` at the cursor and advances it by the count written,
    /// growing the node's size when writing past its end.
    ///
    /// # Errors
    /// * [`VfsError::InvalidHandle`] if `handle` is not open.
    /// * [`VfsError::PermissionDenied`] if it was not opened for writing.
    /// * [`VfsError::InvalidArgument`] for folders.
    /// * [`VfsError::IoError`] if no driver backs the node, or any driver error.
    pub fn write(&mut self, handle: Handle, buf: &[u8]) -> Result<usize, VfsError> {
        let (id, pos) = self.transfer_target(handle, OpenMode::Write)?;
        let driver = self.driver_of(id)?.ok_or(VfsError::IoError)?;
        let node = self.node_mut(id)?;
        let n = driver.write(node, pos, buf)?.min(buf.len());
        let end = pos.saturating_add(n as u64);
        if end > node.size() {
            node.set_size(end);
        }
        self.files.get_mut(handle)?.pos = end;
        Ok(n)
    }

    fn transfer_target(&self, handle: Handle, direction: OpenMode) -> Result<(InodeId, u64), VfsError> {
        let file = self.files.get(handle)?;
        let allowed = match direction {
            OpenMode::Read => file.mode.allows_read(),
            _ => file.mode.allows_write(),
        };
        if !allowed {
            return Err(VfsError::PermissionDenied);
        }
        let id = file.inode.id();
        if self.node(id)?.is_listable() {
            return Err(VfsError::InvalidArgument);
        }
        Ok((id, file.pos))
    }

    /// Changes the permission bits of the open node.
    ///
    /// # Errors
    /// * [`VfsError::InvalidHandle`] if `handle` is not open.
    /// * [`VfsError::InvalidArgument`] if `mode` has bits above `0o7777`.
    /// * [`VfsError::PermissionDenied`] unless the caller owns the node or is privileged.
    pub fn chmod(&mut self, handle: Handle, mode: u32) -> Result<(), VfsError> {
        let id = self.files.get(handle)?.inode.id();
        let mode = u16::try_from(mode)
            .ok()
            .filter(|m| u32::from(*m) <= MAX_PERMS)
            .ok_or(VfsError::InvalidArgument)?;
        let identity = self.identity;
        let node = self.node_mut(id)?;
        if !identity.is_privileged() && identity.uid != node.uid() {
            return Err(VfsError::PermissionDenied);
        }
        node.set_perms(Permissions::from_mode(mode));
        debug!("vfs: chmod {handle} to {mode:04o}");
        Ok(())
    }

    /// Lists up to `max_count` children of an open folder into `buf`.
    ///
    /// Listing continues with the child after the last one returned on the
    /// same descriptor and returns 0 once every child was listed. Children
    /// created in between are not listed in this pass; unlinking the child
    /// the listing would resume at moves it on to the next one, so no
    /// remaining child is skipped or repeated. Records use the layout
    /// described in [`dirent`](crate::dirent).
    ///
    /// # Errors
    /// * [`VfsError::InvalidHandle`] if `handle` is not open.
    /// * [`VfsError::PermissionDenied`] if it was not opened for reading.
    /// * [`VfsError::NotADirectory`] if it does not name a folder.
    /// * [`VfsError::InvalidArgument`] if `buf` cannot hold the next record.
    pub fn getdents(&mut self, handle: Handle, buf: &mut [u8], max_count: usize) -> Result<usize, VfsError> {
        let file = self.files.get(handle)?;
        if !file.mode.allows_read() {
            return Err(VfsError::PermissionDenied);
        }
        let dir = file.inode.id();
        let node = self.node(dir)?;
        if !node.is_listable() {
            return Err(VfsError::NotADirectory);
        }
        let mut cursor = match file.listing {
            Listing::Start => node.child,
            Listing::At(next) => Some(next),
            Listing::Done => None,
        };

        let mut written = 0;
        let mut offset = 0;
        while let Some(id) = cursor {
            if written == max_count {
                break;
            }
            let entry = self.entries.get(id).ok_or(VfsError::IoError)?;
            let kind = self.node(entry.inode())?.kind();
            match dirent::encode(&mut buf[offset..], kind, entry.name()) {
                Some(len) => {
                    offset += len;
                    written += 1;
                    cursor = entry.sibling;
                }
                None if written == 0 => return Err(VfsError::InvalidArgument),
                None => break,
            }
        }

        if written > 0 {
            let file = self.files.get_mut(handle)?;
            file.listing = Listing::resume_at(cursor);
            file.pos += written as u64;
        }
        Ok(written)
    }

    /// Asks the driver to write back the open node.
    ///
    /// # Errors
    /// [`VfsError::InvalidHandle`] if `handle` is not open, or any driver error.
    pub fn sync(&mut self, handle: Handle) -> Result<(), VfsError> {
        let id = self.files.get(handle)?.inode.id();
        match self.driver_of(id)? {
            Some(driver) => driver.sync(self.node_mut(id)?),
            None => Ok(()),
        }
    }

    /// Asks the driver to reload the open node from its backing store.
    ///
    /// # Errors
    /// [`VfsError::InvalidHandle`] if `handle` is not open, or any driver error.
    pub fn refresh(&mut self, handle: Handle) -> Result<(), VfsError> {
        let id = self.files.get(handle)?.inode.id();
        match self.driver_of(id)? {
            Some(driver) => driver.refresh(self.node_mut(id)?),
            None => Ok(()),
        }
    }

    /// Passes a device-specific request to the driver.
    ///
    /// # Errors
    /// * [`VfsError::InvalidHandle`] if `handle` is not open.
    /// * [`VfsError::InvalidArgument`] if no driver backs the node or it does not
    ///   understand `request`, or any other driver error.
    pub fn ioctl(&mut self, handle: Handle, request: u64, data: &mut [u8]) -> Result<i64, VfsError> {
        let id = self.files.get(handle)?.inode.id();
        let driver = self.driver_of(id)?.ok_or(VfsError::InvalidArgument)?;
        driver.ioctl(self.node_mut(id)?, request, data)
    }

    /// Metadata of the open node.
    ///
    /// # Errors
    /// [`VfsError::InvalidHandle`] if `handle` is not open.
    pub fn fstat(&self, handle: Handle) -> Result<NodeStat, VfsError> {
        let id = self.files.get(handle)?.inode.id();
        Ok(self.node(id)?.stat())
    }
}
