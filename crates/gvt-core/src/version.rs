//! Versions — numbered, immutable, full snapshots of the tracked files.
//!
//! Version ids start at 0 and grow by exactly one per mutating operation.
//! Every version after 0 equals its predecessor with a single [`Mutation`]
//! applied.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

/// Message recorded for version 0.
pub const INIT_MESSAGE: &str = "GVT initialized.";

/// A version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct VersionId(pub u32);

impl VersionId {
    /// The version created by `init`.
    pub const ZERO: VersionId = VersionId(0);

    /// The id allocated after this one, or `None` once the id space is exhausted.
    pub fn next(self) -> Option<VersionId> {
        self.0.checked_add(1).map(VersionId)
    }

    /// Numeric value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VersionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(VersionId)
    }
}

/// The single change a new version applies on top of the latest one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Start tracking `name`, copying its content from `source`.
    Add { name: String, source: PathBuf },
    /// Replace the stored content of `name` with the content of `source`.
    Replace { name: String, source: PathBuf },
    /// Stop tracking `name`.
    Remove { name: String },
}

impl Mutation {
    /// The tracked name this mutation touches.
    pub fn name(&self) -> &str {
        match self {
            Mutation::Add { name, .. }
            | Mutation::Replace { name, .. }
            | Mutation::Remove { name } => name,
        }
    }
}

/// One line of history: a version id and the first line of its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionSummary {
    pub id: VersionId,
    pub summary: String,
}

/// A version id with its full message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub id: VersionId,
    pub message: String,
}

/// Text before the first line terminator (`\r\n`, `\n` or `\r`).
pub fn first_line(message: &str) -> &str {
    match message.find(['\n', '\r']) {
        Some(end) => &message[..end],
        None => message,
    }
}
