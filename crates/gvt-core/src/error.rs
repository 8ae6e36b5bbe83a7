//! Error types for gvt operations.

use std::io;

use thiserror::Error;

use crate::version::VersionId;

/// All possible gvt errors.
///
/// Domain errors are detected before anything on disk is touched. Only the
/// system group (`Io`, `CorruptPointer`, `MissingMessage`) can surface in the
/// middle of a mutation.
#[derive(Debug, Error)]
pub enum GvtError {
    /// A `.gvt/` directory already exists here.
    #[error("current directory is already initialized")]
    AlreadyInitialized,
    /// The working area has no `.gvt/` directory.
    #[error("current directory is not initialized")]
    NotInitialized,
    /// A version argument does not name an existing version.
    #[error("invalid version number: {0}")]
    NoSuchVersion(String),
    /// The file to add or commit is missing or not a regular file.
    #[error("file not found: {0}")]
    SourceFileMissing(String),
    /// Commit or detach of a file absent from the latest version.
    #[error("file is not added to gvt: {0}")]
    NotTracked(String),
    /// Add of a file already present in the latest version.
    #[error("file already added: {0}")]
    AlreadyTracked(String),
    /// The file name cannot be tracked (absolute, escapes the root, or reserved).
    #[error("invalid file path: {0}")]
    InvalidPath(String),
    /// A pointer file holds something other than a decimal version id.
    #[error("corrupt pointer file `{name}`: {content:?}")]
    CorruptPointer { name: &'static str, content: String },
    /// A version directory exists without its message file.
    #[error("version {0} has no message")]
    MissingMessage(VersionId),
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl GvtError {
    /// True for the no-op outcomes of add, commit and detach.
    pub fn is_benign(&self) -> bool {
        matches!(self, GvtError::NotTracked(_) | GvtError::AlreadyTracked(_))
    }

    /// True for underlying filesystem or metadata failures.
    pub fn is_system(&self) -> bool {
        matches!(
            self,
            GvtError::Io(_) | GvtError::CorruptPointer { .. } | GvtError::MissingMessage(_)
        )
    }
}

/// Convenience alias for Results in gvt.
pub type GvtResult<T> = Result<T, GvtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benign_kinds() {
        assert!(GvtError::NotTracked("a.txt".into()).is_benign());
        assert!(GvtError::AlreadyTracked("a.txt".into()).is_benign());
        assert!(!GvtError::SourceFileMissing("a.txt".into()).is_benign());
        assert!(!GvtError::NotInitialized.is_benign());
    }

    #[test]
    fn test_system_kinds() {
        let io = GvtError::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(io.is_system());
        assert!(GvtError::MissingMessage(VersionId::ZERO).is_system());
        assert!(GvtError::CorruptPointer {
            name: "latest",
            content: "x".into()
        }
        .is_system());
        assert!(!GvtError::NoSuchVersion("9".into()).is_system());
        assert!(!GvtError::AlreadyInitialized.is_system());
    }
}
