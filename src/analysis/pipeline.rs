//! Mining pipeline: walks a repository and emits one record per changed file.

use git2::Repository;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Instant;

use crate::analysis::diff::{classify, line_count};
use crate::analysis::git::{decode_text, read_blob, read_text, CommitWalker};
use crate::analysis::identifiers::IdentifierExtractor;
use crate::analysis::language::{ExtensionDetector, LanguageDetector};
use crate::analysis::sink::RecordSink;
use crate::error::MineError;
use crate::types::{Change, CommitInfo, DiffStat, IdentifierSet, MiningRecord, NO_LANGUAGE};

/// Counters for one mining run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MineSummary {
    /// Non-merge commits visited
    pub commits: usize,
    /// Records written to the sink
    pub records: usize,
    /// Changes skipped because of a per-file failure
    pub skipped: usize,
}

pub struct MiningPipeline {
    extractor: &'static IdentifierExtractor,
    detector: Arc<dyn LanguageDetector>,
    sink: Arc<dyn RecordSink>,
}

impl MiningPipeline {
    pub fn new(
        extractor: &'static IdentifierExtractor,
        detector: Arc<dyn LanguageDetector>,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        Self {
            extractor,
            detector,
            sink,
        }
    }

    /// Pipeline with the built-in grammars and extension-based language detection.
    pub fn with_defaults(sink: Arc<dyn RecordSink>) -> Result<Self, crate::error::ParseError> {
        Ok(Self::new(
            IdentifierExtractor::builtin()?,
            Arc::new(ExtensionDetector),
            sink,
        ))
    }

    /// Mine every non-merge commit of `repo`, labelling records with `repository`.
    ///
    /// Records are appended as they are produced, so an interrupted run leaves a
    /// valid prefix. Only repository and sink failures abort the run.
    pub fn mine(&self, repo: &Repository, repository: &str) -> Result<MineSummary, MineError> {
        let start_time = Instant::now();
        let mut summary = MineSummary::default();
        info!("Started processing {}", repository);

        for walked in CommitWalker::new(repo)? {
            let walked = walked?;
            summary.commits += 1;
            debug!(
                "{}: commit {} with {} changes",
                repository,
                walked.commit.sha,
                walked.changes.len()
            );

            for change in &walked.changes {
                let file = change.path().to_string_lossy();
                match self.mine_change(repo, repository, &walked.commit, change) {
                    Ok(record) => {
                        self.sink.append(&record)?;
                        summary.records += 1;
                    }
                    Err(e) if e.is_per_file() => {
                        summary.skipped += 1;
                        error!(
                            "Error in repo: {}, commit: {}, file: {}: {}",
                            repository, walked.commit.sha, file, e
                        );
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        info!(
            "Finished {}: {} commits, {} records, {} skipped in {:.2}s",
            repository,
            summary.commits,
            summary.records,
            summary.skipped,
            start_time.elapsed().as_secs_f64()
        );
        Ok(summary)
    }

    /// Build the record for one change. Identifiers are left empty when
    /// extraction fails.
    fn mine_change(
        &self,
        repo: &Repository,
        repository: &str,
        commit: &CommitInfo,
        change: &Change,
    ) -> Result<MiningRecord, MineError> {
        let file = change.path().to_string_lossy().into_owned();

        // New content is read once for both the line counts and the extractor
        let (stat, new_content) = match change {
            Change::Added(new) => {
                let bytes = read_blob(repo, new.id)?;
                let stat = DiffStat::addition(line_count(decode_text(new.id, &bytes)?));
                (stat, Some((new, bytes)))
            }
            Change::Deleted(old) => (DiffStat::deletion(line_count(&read_text(repo, old.id)?)), None),
            Change::Modified { old, new } => {
                let old_text = read_text(repo, old.id)?;
                let bytes = read_blob(repo, new.id)?;
                let old_lines: Vec<&str> = old_text.lines().collect();
                let new_lines: Vec<&str> = decode_text(new.id, &bytes)?.lines().collect();
                let stat = classify(&old_lines, &new_lines)?;
                (stat, Some((new, bytes)))
            }
        };

        let (language, identifiers) = match new_content {
            None => (None, IdentifierSet::default()),
            Some((new, content)) => {
                let language = self.detector.detect(&new.path, &content);
                match self.extractor.extract(&content, language.as_deref()) {
                    Ok(identifiers) => (language, identifiers),
                    Err(e) => {
                        warn!(
                            "Could not extract identifiers in repo: {}, commit: {}, file: {}: {}",
                            repository, commit.sha, file, e
                        );
                        (language, IdentifierSet::default())
                    }
                }
            }
        };

        let record = MiningRecord {
            repository: repository.to_string(),
            sha: commit.sha.clone(),
            file,
            author: commit.author.clone(),
            language: language.unwrap_or_else(|| NO_LANGUAGE.to_string()),
            stat,
            identifiers,
        };
        Ok(record)
    }
}
