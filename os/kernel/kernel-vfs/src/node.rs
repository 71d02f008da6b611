//! # Node Types, Access Modes and Permission Bits

use crate::limits::ROOT_UID;
use bitfield_struct::bitfield;
use core::fmt;

/// What an inode is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum NodeType {
    File = 0,
    Folder = 1,
    Link = 2,
    Pipe = 3,
    BlockDevice = 4,
    CharDevice = 5,
    /// A folder whose resolution is redirected into a mounted tree.
    Mountpoint = 6,
}

impl NodeType {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::File,
            1 => Self::Folder,
            2 => Self::Link,
            3 => Self::Pipe,
            4 => Self::BlockDevice,
            5 => Self::CharDevice,
            6 => Self::Mountpoint,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
            Self::Link => "link",
            Self::Pipe => "pipe",
            Self::BlockDevice => "block device",
            Self::CharDevice => "char device",
            Self::Mountpoint => "mountpoint",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction(s) an open descriptor may transfer data in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    ReadWrite,
}

impl OpenMode {
    #[must_use]
    pub const fn allows_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    #[must_use]
    pub const fn allows_write(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// Unix-style permission bits.
///
/// Layout (LSB→MSB):
/// - bits 0..2: other `x`, `w`, `r`
/// - bits 3..5: group `x`, `w`, `r`
/// - bits 6..8: owner `x`, `w`, `r`
/// - bit 9: sticky
/// - bit 10: setgid
/// - bit 11: setuid
/// - bits 12..15: reserved (always zero)
#[bitfield(u16)]
#[derive(PartialEq, Eq)]
pub struct Permissions {
    pub other_exec: bool,
    pub other_write: bool,
    pub other_read: bool,
    pub group_exec: bool,
    pub group_write: bool,
    pub group_read: bool,
    pub owner_exec: bool,
    pub owner_write: bool,
    pub owner_read: bool,
    pub sticky: bool,
    pub setgid: bool,
    pub setuid: bool,
    #[bits(4)]
    __: u8,
}

impl Permissions {
    /// Builds permissions from an octal mode, dropping bits above `0o7777`.
    #[inline]
    #[must_use]
    pub const fn from_mode(mode: u16) -> Self {
        Self::from_bits(mode & 0o7777)
    }

    #[inline]
    #[must_use]
    pub const fn mode(self) -> u16 {
        self.into_bits()
    }

    /// Whether `mode` is granted to the owner (`is_owner`) or to everyone else.
    #[must_use]
    pub const fn permits(self, mode: OpenMode, is_owner: bool) -> bool {
        let (read, write) = if is_owner {
            (self.owner_read(), self.owner_write())
        } else {
            (self.other_read(), self.other_write())
        };
        (!mode.allows_read() || read) && (!mode.allows_write() || write)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.mode())
    }
}

/// Identity operations are checked against.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub uid: u32,
}

impl Credentials {
    pub const ROOT: Self = Self { uid: ROOT_UID };

    #[must_use]
    pub const fn user(uid: u32) -> Self {
        Self { uid }
    }

    /// Privileged callers bypass permission and ownership checks.
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        self.uid == ROOT_UID
    }

    /// Whether this identity may open a node owned by `owner` with `perms` in `mode`.
    #[must_use]
    pub const fn may_open(self, owner: u32, perms: Permissions, mode: OpenMode) -> bool {
        self.is_privileged() || perms.permits(mode, self.uid == owner)
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::ROOT
    }
}
