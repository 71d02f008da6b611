//! # Virtual Filesystem Switch
//!
//! One namespace rooted at `/`, independent of where the bytes live.
//! Filesystem formats register a driver under a short name; mounting one
//! grafts the driver's tree onto a folder, and from then on every operation
//! below that folder is dispatched to the driver.
//!
//! ## Layout
//!
//! * [`vfs`] – the [`Vfs`] itself: path resolution, namespace mutation and
//!   descriptor I/O.
//! * [`driver`] – the [`Filesystem`] trait drivers implement.
//! * [`registry`] – the bounded table of registered formats.
//! * [`inode`], [`entry`], [`node`] – the objects making up the tree.
//! * [`file`] – open descriptors and their [`Handle`]s.
//! * [`dirent`] – the record format `getdents` writes.
//! * [`status`] – the signed `i64` status convention of the system-call boundary.
//! * [`global`] – the kernel's single instance.
//!
//! ## Ownership
//!
//! Inodes and entries are stored in generation-checked arenas and refer to
//! each other by id. An inode's reference count is the number of
//! [`InodeRef`] tokens outstanding: one per name and one per open
//! descriptor. The inode is freed when the last token is released, so a file
//! unlinked while open lives until it is closed.
//!
//! ## Usage
//!
//! ```rust
//! use kernel_vfs::{NodeType, OpenMode, Vfs, VfsError};
//!
//! let mut vfs = Vfs::new().unwrap();
//! vfs.create("/etc", NodeType::Folder).unwrap();
//! vfs.create("/etc/motd", NodeType::File).unwrap();
//!
//! let h = vfs.open("/etc/motd", OpenMode::Read).unwrap();
//! vfs.close(h).unwrap();
//!
//! vfs.unlink("/etc/motd").unwrap();
//! assert_eq!(vfs.open("/etc/motd", OpenMode::Read), Err(VfsError::NotFound));
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

mod arena;
pub mod debug;
pub mod dirent;
pub mod driver;
pub mod entry;
mod error;
pub mod file;
pub mod global;
pub mod inode;
pub mod limits;
pub mod node;
pub mod path;
pub mod registry;
pub mod status;
pub mod vfs;

pub use arena::ArenaId;
pub use driver::{Filesystem, FilesystemInfo, FsName, MountedTree};
pub use entry::{DirEntry, EntryId, InodeRef};
pub use error::VfsError;
pub use file::Handle;
pub use inode::{DriverData, Inode, InodeId, NodeStat};
pub use node::{Credentials, NodeType, OpenMode, Permissions};
pub use registry::FsId;
pub use vfs::{Resolved, Vfs};
