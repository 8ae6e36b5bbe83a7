//! Repository — the main entry point for gvt operations.
//!
//! A Repository ties the pointer files and the version directories into
//! the operations of the version store: init, add, commit, detach,
//! checkout, history and version description.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{GvtError, GvtResult};
use crate::fsutil::{self, copy_file, remove_if_exists};
use crate::manifest::{self, MESSAGE_FILE};
use crate::pointer::{Pointer, PointerKind};
use crate::version::{first_line, Mutation, VersionId, VersionInfo, VersionSummary, INIT_MESSAGE};

/// The `.gvt` directory name.
pub const GVT_DIR: &str = ".gvt";

/// Directory under `.gvt/` holding one subdirectory per version.
const VERSIONS_DIR: &str = "versions";

/// A gvt repository.
pub struct Repository {
    /// Root of the working area (where `.gvt/` lives).
    root: PathBuf,
    /// Path to `.gvt/versions/`.
    versions_dir: PathBuf,
    /// Highest existing version.
    latest: Pointer,
    /// Version reflected in the working area.
    active: Pointer,
}

/// What a checkout did to the working area.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReport {
    /// The version now active.
    pub version: VersionId,
    /// Names materialized from the target version.
    pub written: Vec<String>,
    /// Names deleted because the target does not track them.
    pub removed: Vec<String>,
}

impl Repository {
    /// Initialize a new gvt repository in the given directory.
    ///
    /// Creates `.gvt/`, version 0 with an empty file set, and both
    /// pointers set to 0.
    pub fn init(root: &Path) -> GvtResult<Self> {
        let gvt_dir = root.join(GVT_DIR);

        if gvt_dir.exists() {
            return Err(GvtError::AlreadyInitialized);
        }

        let versions_dir = gvt_dir.join(VERSIONS_DIR);
        fs::create_dir(&gvt_dir)?;
        fs::create_dir(&versions_dir)?;
        let zero_dir = versions_dir.join(VersionId::ZERO.to_string());
        fs::create_dir(&zero_dir)?;
        fs::write(zero_dir.join(MESSAGE_FILE), INIT_MESSAGE)?;

        Pointer::new(&gvt_dir, PointerKind::Latest).store(VersionId::ZERO)?;
        Pointer::new(&gvt_dir, PointerKind::Active).store(VersionId::ZERO)?;

        info!(root = %root.display(), "initialized repository");
        Self::open(root)
    }

    /// Open an existing gvt repository rooted at `root`.
    pub fn open(root: &Path) -> GvtResult<Self> {
        let gvt_dir = root.join(GVT_DIR);

        if !gvt_dir.is_dir() {
            return Err(GvtError::NotInitialized);
        }

        Ok(Self {
            root: root.to_path_buf(),
            versions_dir: gvt_dir.join(VERSIONS_DIR),
            latest: Pointer::new(&gvt_dir, PointerKind::Latest),
            active: Pointer::new(&gvt_dir, PointerKind::Active),
        })
    }

    /// Root of the working area.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The highest existing version.
    pub fn latest(&self) -> GvtResult<VersionId> {
        self.latest.load()
    }

    /// The version currently reflected in the working area.
    pub fn active(&self) -> GvtResult<VersionId> {
        self.active.load()
    }

    /// Parse a user-supplied version argument and check that it exists.
    pub fn resolve_version(&self, arg: &str) -> GvtResult<VersionId> {
        let id = arg
            .trim()
            .parse::<VersionId>()
            .map_err(|_| GvtError::NoSuchVersion(arg.to_string()))?;
        self.ensure_exists(id)
    }

    /// Names tracked in version `id`.
    pub fn tracked_files(&self, id: VersionId) -> GvtResult<BTreeSet<String>> {
        let id = self.ensure_exists(id)?;
        manifest::tracked_files(&self.version_dir(id))
    }

    /// Start tracking `name` as of a new version.
    ///
    /// Returns `AlreadyTracked` without creating a version if the latest
    /// version already tracks `name`.
    pub fn add(&self, name: &str, message: Option<&str>) -> GvtResult<VersionId> {
        let name = Self::normalize_name(name)?;
        let latest = self.latest()?;

        // Any stored entry counts, including a directory holding tracked files.
        if self.version_dir(latest).join(&name).exists() {
            return Err(GvtError::AlreadyTracked(name));
        }
        let source = self.root.join(&name);
        if !source.is_file() {
            return Err(GvtError::SourceFileMissing(name));
        }

        let message = message
            .map(String::from)
            .unwrap_or_else(|| format!("File added successfully. File: {name}"));
        self.stage_new_version(&message, &Mutation::Add { name, source })
    }

    /// Record the working-area content of an already tracked file.
    pub fn commit(&self, name: &str, message: Option<&str>) -> GvtResult<VersionId> {
        let name = Self::normalize_name(name)?;

        let source = self.root.join(&name);
        if !source.is_file() {
            return Err(GvtError::SourceFileMissing(name));
        }
        let latest = self.latest()?;
        if !self.version_dir(latest).join(&name).is_file() {
            return Err(GvtError::NotTracked(name));
        }

        let message = message
            .map(String::from)
            .unwrap_or_else(|| format!("File committed successfully. File: {name}"));
        self.stage_new_version(&message, &Mutation::Replace { name, source })
    }

    /// Stop tracking `name` as of a new version. The working file is untouched.
    pub fn detach(&self, name: &str, message: Option<&str>) -> GvtResult<VersionId> {
        let name = Self::normalize_name(name)?;
        let latest = self.latest()?;

        if !self.version_dir(latest).join(&name).is_file() {
            return Err(GvtError::NotTracked(name));
        }

        let message = message
            .map(String::from)
            .unwrap_or_else(|| format!("File detached successfully. File: {name}"));
        self.stage_new_version(&message, &Mutation::Remove { name })
    }

    /// Create version `latest + 1` from a full copy of `latest` with
    /// `mutation` applied, then point both `latest` and `active` at it.
    ///
    /// New versions always build on `latest`, even when an older version is
    /// checked out. Preconditions of the mutation are the caller's job. On
    /// an I/O failure the partially written version directory is left in
    /// place and the pointers keep their previous values.
    pub fn stage_new_version(&self, message: &str, mutation: &Mutation) -> GvtResult<VersionId> {
        let target = Self::normalize_name(mutation.name())?;
        let base = self.latest()?;
        let new_id = base.next().ok_or_else(|| GvtError::CorruptPointer {
            name: PointerKind::Latest.file_name(),
            content: base.to_string(),
        })?;
        let base_dir = self.version_dir(base);
        let new_dir = self.version_dir(new_id);

        let inherited = manifest::tracked_files(&base_dir)?;

        // Non-recursive: a leftover directory from an interrupted run is an error.
        fs::create_dir(&new_dir)?;

        for name in &inherited {
            if matches!(mutation, Mutation::Remove { .. }) && *name == target {
                continue;
            }
            copy_file(&base_dir.join(name), &new_dir.join(name))?;
        }

        match mutation {
            Mutation::Add { source, .. } | Mutation::Replace { source, .. } => {
                copy_file(source, &new_dir.join(&target))?;
            }
            Mutation::Remove { .. } => {}
        }

        fs::write(new_dir.join(MESSAGE_FILE), message)?;

        self.latest.store(new_id)?;
        self.active.store(new_id)?;

        info!(version = %new_id, file = %target, op = mutation_label(mutation), "created version");
        Ok(new_id)
    }

    /// Make the working area match version `id` and mark it active.
    ///
    /// Names tracked by the previously active version but not by `id` are
    /// deleted first, so a name can switch between file and directory. Then
    /// every name tracked by `id` is rewritten from storage, even if the
    /// working copy already matches. `latest` is unchanged.
    pub fn checkout(&self, id: VersionId) -> GvtResult<CheckoutReport> {
        let id = self.ensure_exists(id)?;
        let target_dir = self.version_dir(id);
        let target = manifest::tracked_files(&target_dir)?;
        let current = manifest::tracked_files(&self.version_dir(self.active()?))?;

        let mut removed = Vec::new();
        for name in current.difference(&target) {
            let path = self.root.join(name);
            if remove_if_exists(&path)? {
                removed.push(name.clone());
            } else {
                warn!(file = %name, "tracked file already missing from working area");
            }
            if let Some(parent) = path.parent() {
                if let Err(e) = fsutil::remove_empty_dirs(parent, &self.root) {
                    debug!(dir = %parent.display(), error = %e, "left directory in place");
                }
            }
        }

        let mut written = Vec::with_capacity(target.len());
        for name in &target {
            copy_file(&target_dir.join(name), &self.root.join(name))?;
            written.push(name.clone());
        }

        self.active.store(id)?;

        info!(version = %id, written = written.len(), removed = removed.len(), "checked out");
        Ok(CheckoutReport {
            version: id,
            written,
            removed,
        })
    }

    /// Versions from `latest` downwards, at most `limit` of them.
    ///
    /// The returned iterator reads one message per step. Clone it to walk
    /// the same range again.
    pub fn history(&self, limit: Option<usize>) -> GvtResult<History> {
        let latest = self.latest()?;
        let (next, floor) = match limit {
            None => (Some(latest), VersionId::ZERO),
            Some(0) => (None, VersionId::ZERO),
            Some(n) => {
                let span = u32::try_from(n - 1).unwrap_or(u32::MAX);
                (Some(latest), VersionId(latest.get().saturating_sub(span)))
            }
        };
        Ok(History {
            versions_dir: self.versions_dir.clone(),
            next,
            floor,
        })
    }

    /// Id and full message of `id`, or of the active version when `None`.
    pub fn describe_version(&self, id: Option<VersionId>) -> GvtResult<VersionInfo> {
        let id = match id {
            Some(id) => self.ensure_exists(id)?,
            None => self.active()?,
        };
        let message = read_message(&self.versions_dir, id)?;
        Ok(VersionInfo { id, message })
    }

    // --- Internal helpers ---

    fn version_dir(&self, id: VersionId) -> PathBuf {
        self.versions_dir.join(id.to_string())
    }

    /// Reject ids outside `[0, latest]`.
    fn ensure_exists(&self, id: VersionId) -> GvtResult<VersionId> {
        if id > self.latest()? {
            return Err(GvtError::NoSuchVersion(id.to_string()));
        }
        Ok(id)
    }

    /// Validate a tracked name and return its `/`-separated form.
    ///
    /// Rejects absolute paths, `..` components, anything under `.gvt/`, and
    /// the top-level message file name.
    fn normalize_name(name: &str) -> GvtResult<String> {
        let invalid = || GvtError::InvalidPath(name.to_string());

        if name.starts_with('/') || name.starts_with('\\') {
            return Err(invalid());
        }

        let mut parts = Vec::new();
        for component in Path::new(name).components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return Err(invalid()),
            }
        }

        match parts.first().map(String::as_str) {
            None | Some(GVT_DIR) => Err(invalid()),
            Some(MESSAGE_FILE) if parts.len() == 1 => Err(invalid()),
            _ => Ok(parts.join("/")),
        }
    }
}

/// Lazy walk over version summaries, newest first.
#[derive(Debug, Clone)]
pub struct History {
    versions_dir: PathBuf,
    next: Option<VersionId>,
    floor: VersionId,
}

impl Iterator for History {
    type Item = GvtResult<VersionSummary>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = if id > self.floor {
            Some(VersionId(id.get() - 1))
        } else {
            None
        };

        Some(read_message(&self.versions_dir, id).map(|message| VersionSummary {
            id,
            summary: first_line(&message).to_string(),
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .next
            .map(|id| (id.get() - self.floor.get()) as usize + 1)
            .unwrap_or(0);
        (remaining, Some(remaining))
    }
}

fn read_message(versions_dir: &Path, id: VersionId) -> GvtResult<String> {
    let path = versions_dir.join(id.to_string()).join(MESSAGE_FILE);
    match fs::read_to_string(&path) {
        Ok(message) => Ok(message),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(GvtError::MissingMessage(id)),
        Err(e) => Err(e.into()),
    }
}

fn mutation_label(mutation: &Mutation) -> &'static str {
    match mutation {
        Mutation::Add { .. } => "add",
        Mutation::Replace { .. } => "commit",
        Mutation::Remove { .. } => "detach",
    }
}
