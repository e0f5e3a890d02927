//! # Common Types
//!
//! This module contains the data model shared by the mining pipeline: commits and
//! their file changes as read from history, the per-file statistics computed for
//! them, and the record emitted to the output sink.

use git2::Oid;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Language tag written when a change has no new content or no language was detected.
pub const NO_LANGUAGE: &str = "None";

/// A commit as read from history.
///
/// Immutable once loaded. Commits with two or more parents are merge commits and
/// never reach the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Hex object id of the commit
    pub sha: String,
    /// Hex object ids of the parents, in stored order
    pub parents: Vec<String>,
    /// Author in `Name <email>` form
    pub author: String,
    /// Full commit message
    pub message: String,
}

impl CommitInfo {
    /// Whether this commit joins two or more lines of history.
    pub fn is_merge(&self) -> bool {
        self.parents.len() >= 2
    }
}

/// One side of a change: where the file lived and which blob held its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVersion {
    pub path: PathBuf,
    pub id: Oid,
}

/// How a file changed between a commit and its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
}

/// A single file change inside a commit.
///
/// Encoded so that a change with neither an old nor a new side cannot exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Added(FileVersion),
    Deleted(FileVersion),
    Modified { old: FileVersion, new: FileVersion },
}

impl Change {
    /// Build a change from the two sides of a tree diff entry.
    ///
    /// Returns `None` when both sides are absent.
    pub fn from_sides(old: Option<FileVersion>, new: Option<FileVersion>) -> Option<Self> {
        match (old, new) {
            (None, Some(new)) => Some(Self::Added(new)),
            (Some(old), None) => Some(Self::Deleted(old)),
            (Some(old), Some(new)) => Some(Self::Modified { old, new }),
            (None, None) => None,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Added(_) => ChangeKind::Added,
            Self::Deleted(_) => ChangeKind::Deleted,
            Self::Modified { .. } => ChangeKind::Modified,
        }
    }

    pub fn old(&self) -> Option<&FileVersion> {
        match self {
            Self::Added(_) => None,
            Self::Deleted(old) | Self::Modified { old, .. } => Some(old),
        }
    }

    /// The version present after the commit, absent for deletions.
    pub fn new_version(&self) -> Option<&FileVersion> {
        match self {
            Self::Deleted(_) => None,
            Self::Added(new) | Self::Modified { new, .. } => Some(new),
        }
    }

    /// Path used to label the change: the new path, or the old one for deletions.
    pub fn path(&self) -> &Path {
        match self {
            Self::Deleted(old) => &old.path,
            Self::Added(new) | Self::Modified { new, .. } => &new.path,
        }
    }
}

/// Lines added and deleted by a single file change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStat {
    pub added: usize,
    pub deleted: usize,
}

impl DiffStat {
    /// Stat for a newly created file with `lines` lines.
    pub fn addition(lines: usize) -> Self {
        Self { added: lines, deleted: 0 }
    }

    /// Stat for a removed file that had `lines` lines.
    pub fn deletion(lines: usize) -> Self {
        Self { added: 0, deleted: lines }
    }
}

/// Structural identifiers found in a file, in query-engine order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierSet {
    pub classes: Vec<String>,
    pub functions: Vec<String>,
    pub variables: Vec<String>,
}

impl IdentifierSet {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.functions.is_empty() && self.variables.is_empty()
    }
}

/// The unit written to the output sink, one per (commit, changed file).
///
/// Serialises flat, matching the JSON-lines layout consumers expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningRecord {
    pub repository: String,
    pub sha: String,
    pub file: String,
    pub author: String,
    pub language: String,
    #[serde(flatten)]
    pub stat: DiffStat,
    #[serde(flatten)]
    pub identifiers: IdentifierSet,
}
