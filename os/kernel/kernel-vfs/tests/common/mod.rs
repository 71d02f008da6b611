//! Test drivers shared by the integration tests.

#![allow(dead_code)]

use kernel_vfs::{Filesystem, FilesystemInfo, Inode, MountedTree, NodeType, Vfs, VfsError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Keeps file contents in the inode payload.
pub struct MemFs;

fn contents(node: &mut Inode) -> &mut Vec<u8> {
    if node.payload().get::<Vec<u8>>().is_none() {
        node.set_payload(Vec::<u8>::new());
    }
    node.payload_mut().get_mut::<Vec<u8>>().expect("payload was just set")
}

impl Filesystem for MemFs {
    fn mount(&self, _device: Option<&Inode>) -> Result<MountedTree, VfsError> {
        Ok(MountedTree::new(Inode::new(NodeType::Folder)))
    }

    fn mknode(&self, _name: &str, node: &mut Inode) -> Result<(), VfsError> {
        if node.kind() == NodeType::File {
            node.set_payload(Vec::<u8>::new());
        }
        Ok(())
    }

    fn read(&self, node: &mut Inode, offset: u64, buf: &mut [u8]) -> Result<usize, VfsError> {
        let data = contents(node);
        let start = usize::try_from(offset).unwrap().min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn write(&self, node: &mut Inode, offset: u64, buf: &[u8]) -> Result<usize, VfsError> {
        let data = contents(node);
        let start = usize::try_from(offset).unwrap();
        if data.len() < start + buf.len() {
            data.resize(start + buf.len(), 0);
        }
        data[start..start + buf.len()].copy_from_slice(buf);
        Ok(buf.len())
    }

    fn ioctl(&self, node: &mut Inode, request: u64, _data: &mut [u8]) -> Result<i64, VfsError> {
        // Request 1 reports the stored length.
        match request {
            1 => Ok(i64::try_from(contents(node).len()).unwrap()),
            _ => Err(VfsError::InvalidArgument),
        }
    }
}

pub fn memfs() -> FilesystemInfo {
    FilesystemInfo::new("memfs", true, Arc::new(MemFs)).unwrap()
}

/// Counts `mount` calls and ships a pre-existing `file.txt`.
#[derive(Default)]
pub struct CountingFs {
    pub mounts: AtomicUsize,
    pub synced: AtomicUsize,
}

impl CountingFs {
    pub fn mount_calls(&self) -> usize {
        self.mounts.load(Ordering::SeqCst)
    }
}

impl Filesystem for CountingFs {
    fn mount(&self, device: Option<&Inode>) -> Result<MountedTree, VfsError> {
        self.mounts.fetch_add(1, Ordering::SeqCst);
        if let Some(device) = device
            && device.kind() != NodeType::BlockDevice
        {
            return Err(VfsError::InvalidArgument);
        }
        Ok(MountedTree::new(Inode::new(NodeType::Folder))
            .with_node("file.txt", Inode::new(NodeType::File).with_size(3).with_payload(b"abc".to_vec()))
            .with_node("sub", Inode::new(NodeType::Folder))
            .with_node("sub/inner", Inode::new(NodeType::File)))
    }

    fn mknode(&self, name: &str, node: &mut Inode) -> Result<(), VfsError> {
        MemFs.mknode(name, node)
    }

    fn read(&self, node: &mut Inode, offset: u64, buf: &mut [u8]) -> Result<usize, VfsError> {
        MemFs.read(node, offset, buf)
    }

    fn write(&self, node: &mut Inode, offset: u64, buf: &[u8]) -> Result<usize, VfsError> {
        MemFs.write(node, offset, buf)
    }

    fn sync(&self, _node: &mut Inode) -> Result<(), VfsError> {
        self.synced.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Ships one 10-byte `data` file, then rejects every node creation and
/// every transfer with a fixed error.
pub struct BrokenFs(pub VfsError);

impl Filesystem for BrokenFs {
    fn mount(&self, _device: Option<&Inode>) -> Result<MountedTree, VfsError> {
        Ok(MountedTree::new(Inode::new(NodeType::Folder))
            .with_node("data", Inode::new(NodeType::File).with_size(10)))
    }

    fn mknode(&self, _name: &str, _node: &mut Inode) -> Result<(), VfsError> {
        Err(self.0)
    }

    fn read(&self, _node: &mut Inode, _offset: u64, _buf: &mut [u8]) -> Result<usize, VfsError> {
        Err(self.0)
    }

    fn write(&self, _node: &mut Inode, _offset: u64, _buf: &[u8]) -> Result<usize, VfsError> {
        Err(self.0)
    }
}

/// A namespace with `memfs` registered and mounted at `/mnt`.
pub fn mounted_memfs() -> Vfs {
    let mut vfs = Vfs::new().unwrap();
    vfs.register_filesystem(memfs()).unwrap();
    vfs.mount("memdev", "/mnt", "memfs").unwrap();
    vfs
}
