//! Stargazer co-occurrence crawl.
//!
//! Counts are only recorded once a user's full starred list is in hand, so a fetch
//! retried after throttling never double-counts.

use log::{info, warn};

use crate::error::ApiError;
use crate::stargazers::backoff::with_backoff;
use crate::stargazers::client::{RepoName, StarSource};
use crate::stargazers::counts::StarCounts;

const PROGRESS_EVERY: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Leave the seed repository out of its own co-occurrence counts
    pub exclude_seed: bool,
}

pub struct StarCrawler<'a, S> {
    source: &'a S,
    options: CrawlOptions,
}

impl<'a, S: StarSource> StarCrawler<'a, S> {
    pub fn new(source: &'a S, options: CrawlOptions) -> Self {
        Self { source, options }
    }

    /// Count how many stargazers of `seed` starred each other repository.
    ///
    /// Failing to list the seed's stargazers ends the crawl. A failure for a single
    /// user drops that user's stars and moves on.
    pub async fn crawl(&self, seed: &RepoName) -> Result<StarCounts, ApiError> {
        let mut counts = StarCounts::new();
        let stargazers =
            with_backoff(&format!("stargazers of {}", seed), || self.source.stargazers(seed))
                .await?;
        info!("{} has {} stargazers", seed, stargazers.len());

        let seed_name = seed.full_name();
        for (done, user) in stargazers.iter().enumerate() {
            match self.starred_by(user).await {
                Ok(repos) => counts.record(
                    repos
                        .iter()
                        // GitHub names are case-insensitive
                        .filter(|name| {
                            !(self.options.exclude_seed && name.eq_ignore_ascii_case(&seed_name))
                        }),
                ),
                Err(e) => warn!("Skipping stars of {}: {}", user, e),
            }

            if (done + 1) % PROGRESS_EVERY == 0 {
                info!(
                    "Processed {}/{} stargazers, {} repositories seen",
                    done + 1,
                    stargazers.len(),
                    counts.len()
                );
            }
        }

        Ok(counts)
    }

    /// Full starred list of `user`, waiting out any rate limit.
    pub async fn starred_by(&self, user: &str) -> Result<Vec<String>, ApiError> {
        with_backoff(&format!("starred repositories of {}", user), || {
            self.source.starred(user)
        })
        .await
    }
}
