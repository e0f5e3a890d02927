pub mod backoff;
pub mod client;
pub mod counts;
pub mod crawler;

pub use backoff::{backoff_delay, with_backoff};
pub use client::{GitHubClient, RepoName, StarSource, DEFAULT_API_URL};
pub use counts::StarCounts;
pub use crawler::{CrawlOptions, StarCrawler};
