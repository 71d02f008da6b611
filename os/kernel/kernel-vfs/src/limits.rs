//! # Namespace Limits and Defaults

/// Longest accepted path, in bytes.
pub const MAX_PATH_LEN: usize = 4096;

/// Longest accepted path component / entry name, in bytes.
pub const MAX_NAME_LEN: usize = 256;

/// Longest filesystem format name, in bytes.
pub const MAX_FS_NAME_LEN: usize = 16;

/// Number of filesystem formats that can be registered at once.
pub const MAX_FILESYSTEMS: usize = 32;

/// User id that bypasses permission checks.
pub const ROOT_UID: u32 = 0;

/// Permission bits of newly created folders.
pub const DEFAULT_FOLDER_PERMS: u16 = 0o755;

/// Permission bits of every other newly created node.
pub const DEFAULT_NODE_PERMS: u16 = 0o644;

/// Largest value `chmod` accepts (`rwx` for all classes plus setuid/setgid/sticky).
pub const MAX_PERMS: u32 = 0o7777;

/// Number of descriptors that can be open at once.
pub const MAX_OPEN_FILES: usize = 256;
