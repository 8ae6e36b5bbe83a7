//! gvt-core — the version store behind the `gvt` command.
//!
//! gvt snapshots individual files into numbered, full-copy **versions**
//! kept under `.gvt/`. Two pointers track the tip of the chain (`latest`)
//! and the version reflected in the working area (`active`). Every add,
//! commit and detach appends exactly one version; checkout reconciles the
//! working area against an existing one.

pub mod error;
pub mod fsutil;
pub mod manifest;
pub mod pointer;
pub mod repo;
pub mod version;

pub use error::{GvtError, GvtResult};
pub use repo::{CheckoutReport, History, Repository};
pub use version::{Mutation, VersionId, VersionInfo, VersionSummary};
