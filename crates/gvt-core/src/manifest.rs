//! Tracked-file listing for a version directory.
//!
//! The files stored under `.gvt/versions/<n>/` are the version's file set;
//! the `.message` file is metadata and never tracked.

use std::collections::BTreeSet;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::GvtResult;

/// Name of the per-version message file.
pub const MESSAGE_FILE: &str = ".message";

/// The set of tracked names (relative, `/`-separated) stored in `version_dir`.
pub fn tracked_files(version_dir: &Path) -> GvtResult<BTreeSet<String>> {
    let mut names = BTreeSet::new();

    for entry in WalkDir::new(version_dir).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = match entry.path().strip_prefix(version_dir) {
            Ok(p) => p,
            Err(_) => continue,
        };
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if name == MESSAGE_FILE {
            continue;
        }
        names.insert(name);
    }

    Ok(names)
}
