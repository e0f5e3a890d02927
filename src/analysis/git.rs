use git2::{Delta, DiffOptions, Oid, Repository, Revwalk, Sort};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::spawn_blocking;

use crate::analysis::pipeline::{MineSummary, MiningPipeline};
use crate::error::{ContentError, MineError};
use crate::types::{Change, CommitInfo, FileVersion};

/// A non-merge commit together with the files it touched.
#[derive(Debug, Clone)]
pub struct WalkedCommit {
    pub commit: CommitInfo,
    pub changes: Vec<Change>,
}

/// Lazily walks history from `HEAD`, newest first, skipping merge commits.
///
/// Each walk re-reads the repository; the iterator cannot be rewound.
pub struct CommitWalker<'repo> {
    repo: &'repo Repository,
    revwalk: Revwalk<'repo>,
}

impl<'repo> CommitWalker<'repo> {
    pub fn new(repo: &'repo Repository) -> Result<Self, git2::Error> {
        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;

        // An unborn HEAD has no history to walk
        match repo.head() {
            Ok(_) => revwalk.push_head()?,
            Err(e) if is_unborn(&e) => debug!("repository has no commits yet"),
            Err(e) => return Err(e),
        }

        Ok(Self { repo, revwalk })
    }

    fn load(&self, oid: Oid) -> Result<Option<WalkedCommit>, git2::Error> {
        let commit = self.repo.find_commit(oid)?;
        if commit.parent_count() >= 2 {
            return Ok(None);
        }

        let author = commit.author();
        let info = CommitInfo {
            sha: oid.to_string(),
            parents: commit.parent_ids().map(|id| id.to_string()).collect(),
            author: format!(
                "{} <{}>",
                String::from_utf8_lossy(author.name_bytes()),
                String::from_utf8_lossy(author.email_bytes())
            ),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        };

        let tree = commit.tree()?;
        let parent_tree = match commit.parent_count() {
            0 => None,
            _ => Some(commit.parent(0)?.tree()?),
        };

        let mut opts = DiffOptions::new();
        opts.include_untracked(false);
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;

        let changes = diff
            .deltas()
            .filter_map(|delta| {
                let side = |file: git2::DiffFile<'_>| {
                    file.path().map(|path| FileVersion {
                        path: path.to_path_buf(),
                        id: file.id(),
                    })
                };
                let (old, new) = match delta.status() {
                    Delta::Added => (None, side(delta.new_file())),
                    Delta::Deleted => (side(delta.old_file()), None),
                    _ => (side(delta.old_file()), side(delta.new_file())),
                };
                Change::from_sides(old, new)
            })
            .collect();

        Ok(Some(WalkedCommit {
            commit: info,
            changes,
        }))
    }
}

impl Iterator for CommitWalker<'_> {
    type Item = Result<WalkedCommit, git2::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let oid = match self.revwalk.next()? {
                Ok(oid) => oid,
                Err(e) => return Some(Err(e)),
            };
            match self.load(oid) {
                Ok(Some(walked)) => return Some(Ok(walked)),
                Ok(None) => debug!("skipping merge commit {}", oid),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn is_unborn(e: &git2::Error) -> bool {
    matches!(e.code(), git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound)
}

/// Raw bytes of a blob.
pub fn read_blob(repo: &Repository, id: Oid) -> Result<Vec<u8>, ContentError> {
    repo.find_blob(id)
        .map(|blob| blob.content().to_vec())
        .map_err(|source| ContentError::Missing {
            id: id.to_string(),
            source,
        })
}

/// A blob decoded as UTF-8 text.
pub fn read_text(repo: &Repository, id: Oid) -> Result<String, ContentError> {
    let bytes = read_blob(repo, id)?;
    String::from_utf8(bytes).map_err(|e| ContentError::Undecodable {
        id: id.to_string(),
        source: e.utf8_error(),
    })
}

/// Blob bytes already in hand, viewed as UTF-8 text.
pub fn decode_text(id: Oid, bytes: &[u8]) -> Result<&str, ContentError> {
    std::str::from_utf8(bytes).map_err(|source| ContentError::Undecodable {
        id: id.to_string(),
        source,
    })
}

/// URL of the `origin` remote, if the working copy has one.
pub fn remote_url(repo: &Repository) -> Option<String> {
    repo.find_remote("origin")
        .ok()
        .and_then(|remote| remote.url().map(str::to_string))
}

/// Directory a clone of `url` lands in: the last URL segment without `.git`.
pub fn clone_path(clone_dir: &Path, url: &str) -> PathBuf {
    let name = url
        .trim_end_matches('/')
        .rsplit(|c| c == '/' || c == ':')
        .next()
        .unwrap_or(url);
    let name = name.strip_suffix(".git").unwrap_or(name);
    clone_dir.join(name)
}

/// Open the working copy at `path`, cloning `url` into it first if it does not exist.
pub fn clone_or_open(url: Option<&str>, path: &Path) -> Result<Repository, git2::Error> {
    match url {
        Some(url) if !path.is_dir() => {
            info!("Cloning {} into {}", url, path.display());
            Repository::clone(url, path)
        }
        _ => Repository::open(path),
    }
}

/// Mine a repository on a blocking thread, cloning it first when `url` is given.
///
/// `identity` labels the records when the working copy has no `origin` remote.
pub async fn mine_repo_async(
    path: PathBuf,
    url: Option<String>,
    identity: String,
    pipeline: Arc<MiningPipeline>,
) -> Result<MineSummary, MineError> {
    // git2 operations are blocking
    spawn_blocking(move || {
        let repo = clone_or_open(url.as_deref(), &path)?;
        let label = remote_url(&repo).unwrap_or(identity);
        pipeline.mine(&repo, &label)
    })
    .await
    .map_err(|e| MineError::Task(e.to_string()))?
}
