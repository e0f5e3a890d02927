//! Error types for the mining and crawling subsystems.
//!
//! Per-file failures (`ContentError`, `ParseError`, `MineError::Diff`) are contained
//! by the mining pipeline. Repository, sink and API failures travel further up.

use chrono::{DateTime, Utc};
use std::io;
use std::str::Utf8Error;
use thiserror::Error;

/// A blob could not be turned into text.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("object {id} is missing or corrupt")]
    Missing {
        id: String,
        #[source]
        source: git2::Error,
    },
    #[error("object {id} is not valid UTF-8 text")]
    Undecodable {
        id: String,
        #[source]
        source: Utf8Error,
    },
}

/// Structural extraction failed for a file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("grammar for {language} is incompatible with the parser runtime")]
    Grammar {
        language: String,
        #[source]
        source: tree_sitter::LanguageError,
    },
    #[error("{kind} query for {language} does not compile")]
    Query {
        language: String,
        kind: &'static str,
        #[source]
        source: tree_sitter::QueryError,
    },
    #[error("parser produced no tree for {language} source")]
    NoTree { language: String },
    #[error("matched identifier is not valid UTF-8")]
    Text(#[from] Utf8Error),
}

/// The output sink rejected a record.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to serialise record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to append record: {0}")]
    Io(#[from] io::Error),
    #[error("output sink lock was poisoned")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum MineError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("line diff failed: {0}")]
    Diff(#[source] git2::Error),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("repository access failed: {0}")]
    Repository(#[from] git2::Error),
    #[error("mining task failed: {0}")]
    Task(String),
}

impl MineError {
    /// Whether the failure is confined to a single (commit, file) unit.
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::Content(_) | Self::Diff(_))
    }
}

/// Failures talking to the GitHub API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("invalid repository reference: {0}")]
    InvalidRepository(String),
    #[error("API token contains characters not allowed in a header")]
    InvalidToken,
}

pub type Result<T, E = MineError> = std::result::Result<T, E>;
