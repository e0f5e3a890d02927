use super::*;
use crate::types::{ChangeKind, DiffStat, MiningRecord};
use git2::{IndexAddOption, ObjectType, Oid, Repository, Signature, Time};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

struct TestRepo {
    dir: TempDir,
    repo: Repository,
    clock: Cell<i64>,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self {
            dir,
            repo,
            clock: Cell::new(1_700_000_000),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, content: &[u8]) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn remove(&self, name: &str) {
        std::fs::remove_file(self.dir.path().join(name)).unwrap();
    }

    fn signature(&self) -> Signature<'static> {
        let now = self.clock.get() + 60;
        self.clock.set(now);
        Signature::new("Test User", "test@example.com", &Time::new(now, 0)).unwrap()
    }

    /// Stage the whole working tree and commit it on top of `parents`.
    fn commit_onto(&self, message: &str, parents: &[Oid], update_head: bool) -> Oid {
        let mut index = self.repo.index().unwrap();
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None).unwrap();
        index.update_all(["*"].iter(), None).unwrap();
        index.write().unwrap();

        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let parents: Vec<_> = parents.iter().map(|id| self.repo.find_commit(*id).unwrap()).collect();
        let parent_refs: Vec<_> = parents.iter().collect();
        let signature = self.signature();
        self.repo
            .commit(
                update_head.then_some("HEAD"),
                &signature,
                &signature,
                message,
                &tree,
                &parent_refs,
            )
            .unwrap()
    }

    fn commit(&self, message: &str) -> Oid {
        let parents: Vec<Oid> = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.target())
            .into_iter()
            .collect();
        self.commit_onto(message, &parents, true)
    }

    fn mine(&self) -> (MineSummary, Vec<MiningRecord>) {
        let sink = Arc::new(MemorySink::new());
        let pipeline = MiningPipeline::with_defaults(sink.clone()).unwrap();
        let summary = pipeline.mine(&self.repo, "test-repo").unwrap();
        (summary, sink.records())
    }
}

fn record_for<'a>(records: &'a [MiningRecord], sha: Oid, file: &str) -> &'a MiningRecord {
    records
        .iter()
        .find(|r| r.sha == sha.to_string() && r.file == file)
        .unwrap_or_else(|| panic!("no record for {} in {}", file, sha))
}

#[test]
fn test_empty_repository() {
    let repo = TestRepo::new();
    let (summary, records) = repo.mine();
    assert_eq!(summary, MineSummary::default());
    assert!(records.is_empty());
}

#[test]
fn test_walker_reports_change_kinds() {
    let repo = TestRepo::new();
    repo.write("keep.txt", b"one\n");
    repo.write("drop.txt", b"gone\n");
    repo.commit("Initial commit");
    repo.write("keep.txt", b"one\ntwo\n");
    repo.remove("drop.txt");
    repo.write("new.txt", b"fresh\n");
    repo.commit("Second commit");

    let walked: Vec<WalkedCommit> = CommitWalker::new(&repo.repo)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(walked.len(), 2);

    let latest = &walked[0];
    assert_eq!(latest.commit.message, "Second commit");
    assert_eq!(latest.commit.author, "Test User <test@example.com>");
    assert_eq!(latest.commit.parents, vec![walked[1].commit.sha.clone()]);

    let mut kinds: Vec<(String, ChangeKind)> = latest
        .changes
        .iter()
        .map(|c| (c.path().display().to_string(), c.kind()))
        .collect();
    kinds.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        kinds,
        vec![
            ("drop.txt".to_string(), ChangeKind::Deleted),
            ("keep.txt".to_string(), ChangeKind::Modified),
            ("new.txt".to_string(), ChangeKind::Added),
        ]
    );

    // The root commit diffs against the empty tree
    assert!(walked[1].changes.iter().all(|c| c.kind() == ChangeKind::Added));
}

#[test]
fn test_addition_and_deletion_counts() {
    let repo = TestRepo::new();
    repo.write("notes.txt", b"a\nb\nc\nd\n");
    let added = repo.commit("Add notes");
    repo.remove("notes.txt");
    let deleted = repo.commit("Remove notes");

    let (_, records) = repo.mine();

    let add = record_for(&records, added, "notes.txt");
    assert_eq!(add.stat, DiffStat { added: 4, deleted: 0 });

    let del = record_for(&records, deleted, "notes.txt");
    assert_eq!(del.stat, DiffStat { added: 0, deleted: 4 });
    assert_eq!(del.language, "None");
    assert!(del.identifiers.is_empty());
}

#[test]
fn test_single_line_modification() {
    let repo = TestRepo::new();
    repo.write("three.txt", b"first\nsecond\nthird\n");
    repo.commit("Add file");
    repo.write("three.txt", b"first\nSECOND\nthird\n");
    let modified = repo.commit("Change line 2");

    let (_, records) = repo.mine();
    let record = record_for(&records, modified, "three.txt");
    assert_eq!(record.stat, DiffStat { added: 1, deleted: 1 });
}

#[test]
fn test_merge_commits_produce_no_records() {
    let repo = TestRepo::new();
    repo.write("base.txt", b"base\n");
    let base = repo.commit("Base");

    repo.write("main.txt", b"main\n");
    let main = repo.commit("Main work");

    // Side branch commit that does not move HEAD
    repo.remove("main.txt");
    repo.write("side.txt", b"side\n");
    let side = repo.commit_onto("Side work", &[base], false);

    repo.write("main.txt", b"main\n");
    let merge = repo.commit_onto("Merge side", &[main, side], true);

    let (summary, records) = repo.mine();
    assert_eq!(summary.commits, 3);
    assert!(records.iter().all(|r| r.sha != merge.to_string()));
    assert!(records.iter().any(|r| r.sha == side.to_string()));
}

#[test]
fn test_python_identifiers_in_records() {
    let repo = TestRepo::new();
    repo.write("pkg/model.py", b"class Foo:\n def bar(self): x = 1\n");
    let sha = repo.commit("Add model");

    let (_, records) = repo.mine();
    let record = record_for(&records, sha, "pkg/model.py");
    assert_eq!(record.language, "Python");
    assert_eq!(record.identifiers.classes, vec!["Foo".to_string()]);
    assert_eq!(record.identifiers.functions, vec!["bar".to_string()]);
    assert_eq!(record.identifiers.variables, vec!["x".to_string()]);
    assert_eq!(record.repository, "test-repo");
}

#[test]
fn test_binary_file_is_skipped_without_aborting() {
    let repo = TestRepo::new();
    repo.write("image.bin", &[0xff, 0xfe, 0x00, 0x81]);
    repo.write("readme.md", b"# Title\n");
    let sha = repo.commit("Mixed content");

    let (summary, records) = repo.mine();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.records, 1);
    assert_eq!(record_for(&records, sha, "readme.md").language, "Markdown");
    assert!(records.iter().all(|r| r.file != "image.bin"));
}

#[test]
fn test_missing_object_is_skipped_without_aborting() {
    let repo = TestRepo::new();
    repo.write("lost.txt", b"this blob goes missing\n");
    repo.write("kept.py", b"def keep(): pass\n");
    let sha = repo.commit("Two files");

    // Remove the loose object behind lost.txt
    let lost = Oid::hash_object(ObjectType::Blob, b"this blob goes missing\n").unwrap();
    let hex = lost.to_string();
    let object = repo.path().join(".git/objects").join(&hex[..2]).join(&hex[2..]);
    std::fs::remove_file(&object).unwrap();

    // Fresh handle so nothing is served from the object cache
    let reopened = Repository::open(repo.path()).unwrap();
    let sink = Arc::new(MemorySink::new());
    let pipeline = MiningPipeline::with_defaults(sink.clone()).unwrap();
    let summary = pipeline.mine(&reopened, "test-repo").unwrap();

    assert_eq!(summary.commits, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.records, 1);
    let records = sink.records();
    assert_eq!(record_for(&records, sha, "kept.py").identifiers.functions, vec!["keep".to_string()]);
    assert!(records.iter().all(|r| r.file != "lost.txt"));
}

#[tokio::test]
async fn test_mine_repo_async_uses_origin_url() {
    let repo = TestRepo::new();
    repo.write("app.js", b"function main() { var port = 80; }\n");
    repo.commit("Add app");
    repo.repo
        .remote("origin", "https://github.com/octo/app.git")
        .unwrap();

    let sink = Arc::new(MemorySink::new());
    let pipeline = Arc::new(MiningPipeline::with_defaults(sink.clone()).unwrap());
    let summary = mine_repo_async(
        repo.path().to_path_buf(),
        None,
        "fallback".to_string(),
        pipeline,
    )
    .await
    .unwrap();

    assert_eq!(summary.records, 1);
    let records = sink.records();
    assert_eq!(records[0].repository, "https://github.com/octo/app.git");
    assert_eq!(records[0].identifiers.functions, vec!["main".to_string()]);
    assert_eq!(records[0].identifiers.variables, vec!["port".to_string()]);
}

#[tokio::test]
async fn test_mine_repo_async_invalid_path() {
    let sink = Arc::new(MemorySink::new());
    let pipeline = Arc::new(MiningPipeline::with_defaults(sink).unwrap());
    let result = mine_repo_async(
        "/nonexistent/path".into(),
        None,
        "missing".to_string(),
        pipeline,
    )
    .await;

    assert!(matches!(result, Err(crate::error::MineError::Repository(_))));
}

#[test]
fn test_clone_path() {
    let dir = Path::new("/tmp/clones");
    assert_eq!(
        clone_path(dir, "https://github.com/octo/demo.git"),
        dir.join("demo")
    );
    assert_eq!(clone_path(dir, "https://github.com/octo/demo/"), dir.join("demo"));
    assert_eq!(clone_path(dir, "git@github.com:octo/tool.git"), dir.join("tool"));
}

#[test]
fn test_clone_or_open_reuses_existing_directory() {
    let repo = TestRepo::new();
    repo.write("a.txt", b"a\n");
    repo.commit("Initial commit");

    // The URL is ignored because the directory already exists
    let opened = clone_or_open(Some("https://invalid.example/none.git"), repo.path()).unwrap();
    assert!(opened.head().is_ok());
}
