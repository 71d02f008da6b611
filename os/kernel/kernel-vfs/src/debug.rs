//! # Namespace Dump

use crate::entry::EntryId;
use crate::inode::Inode;
use crate::node::NodeType;
use crate::vfs::Vfs;
use alloc::vec::Vec;
use core::fmt;
use log::info;

/// Displays the namespace as an indented tree, crossing mountpoints.
///
/// ```text
/// / (folder 0755 uid=0)
///   mnt (mountpoint 0755 uid=0) -> memfs
///     file.txt (file 0644 uid=0 size=5)
/// ```
pub struct TreeDump<'a> {
    vfs: &'a Vfs,
}

impl fmt::Display for TreeDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vfs = self.vfs;
        let mut stack: Vec<(EntryId, usize)> = Vec::new();
        stack.push((vfs.root(), 0));

        while let Some((id, depth)) = stack.pop() {
            let Some(entry) = vfs.entry(id) else { continue };
            let Some(inode) = vfs.inode(entry.inode()) else { continue };
            write!(
                f,
                "{:indent$}{} ({} {} uid={}",
                "",
                entry.name(),
                inode.kind(),
                inode.perms(),
                inode.uid(),
                indent = depth * 2
            )?;
            if inode.kind() == NodeType::File {
                write!(f, " size={}", inode.size())?;
            }
            f.write_str(")")?;

            let mut dir = entry.inode();
            if let Some(root) = inode.mount.and_then(|m| vfs.entry(m)) {
                dir = root.inode();
                let fs = vfs.inode(dir).and_then(Inode::fs);
                if let Some(info) = fs.and_then(|fs| vfs.registry().get(fs)) {
                    write!(f, " -> {}", info.name)?;
                }
            }
            writeln!(f)?;

            let first = stack.len();
            stack.extend(vfs.children(dir).map(|(child, _)| (child, depth + 1)));
            stack[first..].reverse();
        }
        Ok(())
    }
}

impl Vfs {
    #[must_use]
    pub const fn tree(&self) -> TreeDump<'_> {
        TreeDump { vfs: self }
    }

    /// Logs the namespace at `info` level.
    pub fn log_tree(&self) {
        info!("vfs: namespace\n{}", self.tree());
    }
}
