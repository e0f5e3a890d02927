//! # Stargazer-driven repository miner
//!
//! `starminer` builds a dataset of per-file code changes from the repositories a
//! project's stargazers like most. It crawls the stargazers of a seed repository,
//! counts which other repositories they starred, keeps the top-k, and mines the
//! history of each one.
//!
//! ## Features
//!
//! - Rate-limit aware GitHub crawl with wait-until-reset backoff
//! - Deterministic top-k ranking of co-starred repositories
//! - Per-file added/deleted line counts for every non-merge commit
//! - Class, function and variable names extracted with tree-sitter
//! - Append-only JSON-lines output
//!
//! ## Example
//!
//! ```no_run
//! use starminer::analysis::{JsonLinesSink, MiningPipeline};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = git2::Repository::open("path/to/repo")?;
//! let sink = Arc::new(JsonLinesSink::open("records.jsonl")?);
//! let pipeline = MiningPipeline::with_defaults(sink)?;
//! let summary = pipeline.mine(&repo, "https://github.com/octo/demo")?;
//! println!("{} records", summary.records);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod run;
pub mod stargazers;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use error::{ApiError, MineError};
pub use types::{DiffStat, IdentifierSet, MiningRecord};
