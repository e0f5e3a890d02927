pub mod diff;
pub mod git;
pub mod identifiers;
pub mod language;
pub mod pipeline;
pub mod sink;
#[cfg(test)]
mod tests;

pub use diff::classify;
pub use git::{clone_or_open, clone_path, mine_repo_async, CommitWalker, WalkedCommit};
pub use identifiers::IdentifierExtractor;
pub use language::{ExtensionDetector, LanguageDetector};
pub use pipeline::{MineSummary, MiningPipeline};
pub use sink::{JsonLinesSink, MemorySink, RecordSink};
