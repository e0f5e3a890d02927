//! Stargazer-driven repository miner
//!
//! Command-line entry point: crawl, rank and mine.

use anyhow::Result;
use clap::Parser;

use starminer::config::{Cli, Command, CrawlConfig, LogLevel, MineConfig, RunConfig};
use starminer::run;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.command {
        Command::Run(args) => {
            let report = run::run(&RunConfig::from(args)).await?;
            if report.mined == 0 && !report.selected.is_empty() {
                anyhow::bail!("none of the {} selected repositories could be mined", report.selected.len());
            }
        }
        Command::Crawl(args) => {
            for (name, count) in run::crawl(&CrawlConfig::from(args.api)).await? {
                println!("{}\t{}", name, count);
            }
        }
        Command::Mine(args) => {
            let summary = run::mine(&MineConfig::from(args)).await?;
            println!(
                "{} commits, {} records, {} skipped",
                summary.commits, summary.records, summary.skipped
            );
        }
    }

    Ok(())
}

/// Initialize logger based on log level; `RUST_LOG` takes precedence
fn init_logging(log_level: LogLevel) {
    let Some(level) = log_level.filter() else {
        return;
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);
    env_logger::Builder::from_env(env)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .init();
}
