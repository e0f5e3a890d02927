//! Run orchestration: crawl, rank, resolve, mine.

use anyhow::{Context, Result};
use futures::future::join_all;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::analysis::{clone_path, mine_repo_async, JsonLinesSink, MineSummary, MiningPipeline};
use crate::config::{CrawlConfig, MineConfig, RunConfig};
use crate::error::MineError;
use crate::stargazers::{with_backoff, CrawlOptions, GitHubClient, RepoName, StarCrawler};
use crate::utils::ranking::top_entries;

/// Totals over every repository of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Repositories selected by the crawl, best first
    pub selected: Vec<String>,
    /// Repositories mined to completion
    pub mined: usize,
    /// Repositories that could not be resolved, cloned or walked
    pub failed: usize,
    pub records: usize,
    pub skipped: usize,
}

fn client_for(config: &CrawlConfig) -> Result<GitHubClient> {
    GitHubClient::new(config.token.as_deref(), config.api_url.as_str())
        .context("Failed to create GitHub client")
}

/// Crawl the seed's stargazers and return the top-k repositories with their counts.
pub async fn crawl(config: &CrawlConfig) -> Result<Vec<(String, usize)>> {
    let client = client_for(config)?;
    crawl_with(&client, config).await
}

async fn crawl_with(client: &GitHubClient, config: &CrawlConfig) -> Result<Vec<(String, usize)>> {
    let seed: RepoName = config.seed.parse()?;
    let options = CrawlOptions {
        exclude_seed: config.exclude_seed,
    };
    let counts = StarCrawler::new(client, options)
        .crawl(&seed)
        .await
        .with_context(|| format!("Failed to crawl stargazers of {}", seed))?;

    let ranked = top_entries(&counts, config.top_k);
    info!(
        "Selected {} of {} co-starred repositories: {}",
        ranked.len(),
        counts.len(),
        ranked
            .iter()
            .map(|(name, count)| format!("{} ({})", name, count))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(ranked)
}

/// Full run: crawl, select, resolve clone URLs and mine each repository into one output file.
///
/// Clone URL lookups wait out rate limits like the crawl does. A repository that
/// cannot be resolved, cloned or walked is logged and skipped.
/// A failing output sink aborts the run.
pub async fn run(config: &RunConfig) -> Result<RunReport> {
    let start_time = Instant::now();
    let client = client_for(&config.crawl)?;
    let selected: Vec<String> = crawl_with(&client, &config.crawl)
        .await?
        .into_iter()
        .map(|(name, _)| name)
        .collect();

    let mut report = RunReport {
        selected: selected.clone(),
        ..Default::default()
    };

    let mut targets = Vec::with_capacity(selected.len());
    for name in selected {
        // The crawl usually spends the quota, so lookups wait out the reset too
        let what = format!("clone URL of {}", name);
        let resolved = with_backoff(&what, || client.clone_url(&name)).await;
        match resolved {
            Ok(url) => targets.push((name, url)),
            Err(e) => {
                warn!("Could not resolve clone URL of {}: {}", name, e);
                report.failed += 1;
            }
        }
    }

    let sink = Arc::new(
        JsonLinesSink::open(&config.output)
            .with_context(|| format!("Failed to open output {}", config.output.display()))?,
    );
    let pipeline = Arc::new(MiningPipeline::with_defaults(sink)?);
    let semaphore = Arc::new(Semaphore::new(config.jobs.max(1)));

    let mut handles = Vec::with_capacity(targets.len());
    for (name, url) in targets {
        let path = clone_path(&config.clone_dir, &url);
        let pipeline = Arc::clone(&pipeline);
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Worker pool closed")?;

        let handle = tokio::spawn(async move {
            let result = mine_repo_async(path, Some(url), name.clone(), pipeline).await;
            drop(permit);
            (name, result)
        });
        handles.push(handle);
    }

    for joined in join_all(handles).await {
        let (name, result) = joined.context("Mining task panicked")?;
        match result {
            Ok(summary) => tally(&mut report, &summary),
            Err(MineError::Sink(e)) => {
                return Err(e).with_context(|| {
                    format!("Failed to write records of {} to {}", name, config.output.display())
                });
            }
            Err(e) => {
                error!("Failed to mine {}: {}", name, e);
                report.failed += 1;
            }
        }
    }

    info!(
        "Run complete: {} repositories mined, {} failed, {} records, {} files skipped in {:.2}s",
        report.mined,
        report.failed,
        report.records,
        report.skipped,
        start_time.elapsed().as_secs_f64()
    );
    Ok(report)
}

/// Mine one local working copy, cloning it first when a URL is configured.
pub async fn mine(config: &MineConfig) -> Result<MineSummary> {
    let sink = Arc::new(
        JsonLinesSink::open(&config.output)
            .with_context(|| format!("Failed to open output {}", config.output.display()))?,
    );
    let pipeline = Arc::new(MiningPipeline::with_defaults(sink)?);
    let identity = config
        .repo_url
        .clone()
        .unwrap_or_else(|| config.repo_dir.display().to_string());

    let summary = mine_repo_async(
        config.repo_dir.clone(),
        config.repo_url.clone(),
        identity,
        pipeline,
    )
    .await
    .with_context(|| format!("Failed to mine {}", config.repo_dir.display()))?;
    Ok(summary)
}

fn tally(report: &mut RunReport, summary: &MineSummary) {
    report.mined += 1;
    report.records += summary.records;
    report.skipped += summary.skipped;
}
