//! Command-line interface and the plain run parameters derived from it.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::stargazers::DEFAULT_API_URL;

pub const DEFAULT_TOP_K: usize = 10;

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter string for `env_logger`, or `None` when logging is off.
    pub fn filter(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Error => Some("error"),
            Self::Warn => Some("warn"),
            Self::Info => Some("info"),
            Self::Debug => Some("debug"),
            Self::Trace => Some("trace"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "starminer", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", global = true, default_value = default_log_level())]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

fn default_log_level() -> &'static str {
    if cfg!(feature = "dev") {
        "debug"
    } else {
        "info"
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl the seed's stargazers, then mine the most co-starred repositories
    Run(RunArgs),
    /// Crawl the seed's stargazers and print the ranked repositories
    Crawl(CrawlArgs),
    /// Mine a single repository
    Mine(MineArgs),
}

/// Arguments shared by every command that talks to the GitHub API
#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// Seed repository URL or `owner/name`
    #[arg(long, value_name = "URL")]
    pub seed: String,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Number of co-starred repositories to keep
    #[arg(long, value_name = "K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Do not count the seed repository among its stargazers' stars
    #[arg(long)]
    pub exclude_seed: bool,

    /// Base URL of the GitHub REST API
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// JSON-lines file records are appended to
    #[arg(long, value_name = "FILE")]
    pub output: PathBuf,

    /// Directory repositories are cloned into [default: <cache dir>/starminer/repos]
    #[arg(long, value_name = "DIR")]
    pub clone_dir: Option<PathBuf>,

    /// Repositories mined concurrently, 0 picks from the CPU count
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub jobs: usize,
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(Args, Debug)]
pub struct MineArgs {
    /// Working copy to mine
    #[arg(long, value_name = "DIR")]
    pub repo_dir: PathBuf,

    /// JSON-lines file records are appended to
    #[arg(long, value_name = "FILE")]
    pub output: PathBuf,

    /// Clone this URL into the working copy first if it does not exist
    #[arg(long, value_name = "URL")]
    pub repo_url: Option<String>,
}

/// Parameters of a crawl, resolved from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    pub seed: String,
    pub token: Option<String>,
    pub top_k: usize,
    pub exclude_seed: bool,
    pub api_url: String,
}

impl From<ApiArgs> for CrawlConfig {
    fn from(args: ApiArgs) -> Self {
        Self {
            seed: args.seed,
            token: args.token,
            top_k: args.top_k,
            exclude_seed: args.exclude_seed,
            api_url: args.api_url,
        }
    }
}

/// Parameters of a full crawl-and-mine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub crawl: CrawlConfig,
    pub clone_dir: PathBuf,
    pub output: PathBuf,
    pub jobs: usize,
}

impl From<RunArgs> for RunConfig {
    fn from(args: RunArgs) -> Self {
        Self {
            crawl: args.api.into(),
            clone_dir: args.clone_dir.unwrap_or_else(default_clone_dir),
            output: args.output,
            jobs: match args.jobs {
                0 => default_worker_count(),
                n => n,
            },
        }
    }
}

/// Parameters of a single-repository mining run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MineConfig {
    pub repo_dir: PathBuf,
    pub output: PathBuf,
    pub repo_url: Option<String>,
}

impl From<MineArgs> for MineConfig {
    fn from(args: MineArgs) -> Self {
        Self {
            repo_dir: args.repo_dir,
            output: args.output,
            repo_url: args.repo_url,
        }
    }
}

/// `<user cache dir>/starminer/repos`, or `./repos` when the platform has no cache dir.
pub fn default_clone_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("starminer").join("repos"))
        .unwrap_or_else(|| PathBuf::from("repos"))
}

/// Worker count used when `--jobs 0` is given.
pub fn default_worker_count() -> usize {
    let cpu_count = num_cpus::get();
    // Use 75% of available CPUs to leave room for other system processes
    (cpu_count * 3 / 4).max(1)
}
