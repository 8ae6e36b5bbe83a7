//! The `latest` and `active` pointer files.
//!
//! Each holds a single decimal version id as text. They are the only
//! mutable state in a repository; versions themselves are append-only.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GvtError, GvtResult};
use crate::fsutil::atomic_write;
use crate::version::VersionId;

/// Which pointer a [`Pointer`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// Highest existing version; the append point.
    Latest,
    /// Version currently reflected in the working area.
    Active,
}

impl PointerKind {
    /// File name inside `.gvt/`.
    pub fn file_name(self) -> &'static str {
        match self {
            PointerKind::Latest => "latest",
            PointerKind::Active => "active",
        }
    }
}

/// A pointer file on disk.
#[derive(Debug, Clone)]
pub struct Pointer {
    kind: PointerKind,
    path: PathBuf,
}

impl Pointer {
    pub fn new(gvt_dir: &Path, kind: PointerKind) -> Self {
        Self {
            kind,
            path: gvt_dir.join(kind.file_name()),
        }
    }

    /// Read the pointer. Surrounding whitespace is ignored.
    pub fn load(&self) -> GvtResult<VersionId> {
        let content = fs::read_to_string(&self.path)?;
        content
            .trim()
            .parse::<VersionId>()
            .map_err(|_| GvtError::CorruptPointer {
                name: self.kind.file_name(),
                content,
            })
    }

    /// Overwrite the pointer atomically.
    pub fn store(&self, id: VersionId) -> GvtResult<()> {
        atomic_write(&self.path, id.to_string().as_bytes())
    }
}
