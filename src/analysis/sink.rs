use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::SinkError;
use crate::types::MiningRecord;

/// Destination for mining records.
///
/// Implementations must write each record whole; concurrent callers never see
/// interleaved partial lines.
pub trait RecordSink: Send + Sync {
    fn append(&self, record: &MiningRecord) -> Result<(), SinkError>;
}

/// Appends one JSON object per line to a file, flushing after every record.
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating it if needed. Existing lines are kept.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonLinesSink {
    fn append(&self, record: &MiningRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = self.file.lock().map_err(|_| SinkError::Poisoned)?;
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }
}

/// Keeps records in memory, mostly for tests and dry runs.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<MiningRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<MiningRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl RecordSink for MemorySink {
    fn append(&self, record: &MiningRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DiffStat, IdentifierSet};
    use tempfile::TempDir;

    fn record(sha: &str) -> MiningRecord {
        MiningRecord {
            repository: "https://github.com/octo/demo.git".to_string(),
            sha: sha.to_string(),
            file: "src/app.py".to_string(),
            author: "Test User <test@example.com>".to_string(),
            language: "Python".to_string(),
            stat: DiffStat { added: 3, deleted: 1 },
            identifiers: IdentifierSet {
                classes: vec!["App".to_string()],
                functions: vec![],
                variables: vec!["x".to_string()],
            },
        }
    }

    #[test]
    fn test_record_layout() {
        let value = serde_json::to_value(record("abc")).unwrap();
        let expected = serde_json::json!({
            "repository": "https://github.com/octo/demo.git",
            "sha": "abc",
            "file": "src/app.py",
            "author": "Test User <test@example.com>",
            "language": "Python",
            "added": 3,
            "deleted": 1,
            "classes": ["App"],
            "functions": [],
            "variables": ["x"],
        });
        assert_eq!(value, expected);
    }

    #[test]
    fn test_appends_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out/records.jsonl");

        JsonLinesSink::open(&path).unwrap().append(&record("one")).unwrap();
        let sink = JsonLinesSink::open(&path).unwrap();
        sink.append(&record("two")).unwrap();
        assert_eq!(sink.path(), path.as_path());

        let text = std::fs::read_to_string(&path).unwrap();
        let shas: Vec<String> = text
            .lines()
            .map(|line| serde_json::from_str::<MiningRecord>(line).unwrap().sha)
            .collect();
        assert_eq!(shas, vec!["one", "two"]);
    }

    #[test]
    fn test_concurrent_appends_stay_line_atomic() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.jsonl");
        let sink = std::sync::Arc::new(JsonLinesSink::open(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = sink.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        sink.append(&record(&format!("{}-{}", t, i))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 400);
        for line in text.lines() {
            assert!(serde_json::from_str::<MiningRecord>(line).is_ok());
        }
    }
}
