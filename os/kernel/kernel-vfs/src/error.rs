/// Errors reported by the filesystem switch.
///
/// Driver callbacks report the same type; the switch hands their errors to
/// the caller unchanged.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VfsError {
    #[error("no such file or directory")]
    NotFound,
    #[error("not a directory")]
    NotADirectory,
    #[error("already exists")]
    AlreadyExists,
    #[error("permission denied")]
    PermissionDenied,
    #[error("no space left")]
    NoSpace,
    #[error("filesystem registry is full")]
    RegistryFull,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("invalid handle")]
    InvalidHandle,
    #[error("I/O error")]
    IoError,
}

impl VfsError {
    /// The negative status code of this error.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::NotFound => -2,
            Self::IoError => -5,
            Self::InvalidHandle => -9,
            Self::PermissionDenied => -13,
            Self::AlreadyExists => -17,
            Self::NotADirectory => -20,
            Self::InvalidArgument => -22,
            Self::NoSpace | Self::RegistryFull => -28,
        }
    }

    /// Decodes a negative status code; unknown codes become [`IoError`](Self::IoError).
    ///
    /// Returns `None` for non-negative values, which are not errors.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            0.. => return None,
            -2 => Self::NotFound,
            -9 => Self::InvalidHandle,
            -13 => Self::PermissionDenied,
            -17 => Self::AlreadyExists,
            -20 => Self::NotADirectory,
            -22 => Self::InvalidArgument,
            -28 => Self::NoSpace,
            _ => Self::IoError,
        })
    }
}

impl From<alloc::collections::TryReserveError> for VfsError {
    fn from(_: alloc::collections::TryReserveError) -> Self {
        Self::NoSpace
    }
}
