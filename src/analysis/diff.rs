//! Line-level diff classification.
//!
//! The unified diff is produced by libgit2 from in-memory buffers, then scanned
//! line by line. File headers (`--- a/...`, `+++ b/...`) share their first
//! character with content lines, so a line only counts when its second
//! character is not the same marker.

use git2::{DiffOptions, Patch};
use std::path::Path;

use crate::error::MineError;
use crate::types::DiffStat;

/// Count the lines added and deleted between two versions of a file.
pub fn classify<S: AsRef<str>>(old_lines: &[S], new_lines: &[S]) -> Result<DiffStat, MineError> {
    let old = join_lines(old_lines);
    let new = join_lines(new_lines);

    let mut opts = DiffOptions::new();
    opts.minimal(true).force_text(true).context_lines(3);

    let mut patch = Patch::from_buffers(
        old.as_bytes(),
        Some(Path::new("a")),
        new.as_bytes(),
        Some(Path::new("b")),
        Some(&mut opts),
    )
    .map_err(MineError::Diff)?;

    let buf = patch.to_buf().map_err(MineError::Diff)?;
    Ok(count_unified(&String::from_utf8_lossy(&buf)))
}

/// Scan unified diff text and count single-marker `+` and `-` lines.
pub fn count_unified(diff: &str) -> DiffStat {
    let mut stat = DiffStat::default();
    for line in diff.lines() {
        let mut chars = line.chars();
        match (chars.next(), chars.next()) {
            (Some('+'), second) if second != Some('+') => stat.added += 1,
            (Some('-'), second) if second != Some('-') => stat.deleted += 1,
            _ => {}
        }
    }
    stat
}

/// Number of lines in a text blob, counted the way `str::lines` splits them.
pub fn line_count(text: &str) -> usize {
    text.lines().count()
}

fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.as_ref().len() + 1).sum());
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out
}
