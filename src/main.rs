// Crawler binary: wires a Redis-backed frontier, the HTTP fetcher and a
// discard processor into the manager, then runs until the frontier goes
// quiet or a signal asks for a drain.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use webcrawl::{CrawlManager, CrawlerConfig, DiscardProcessor, Frontier, HttpFetcher, RedisFrontier};

#[derive(Debug, Parser)]
#[command(name = "webcrawl", about = "Distributed web crawler over a shared redis frontier")]
struct Cli {
    /// Maximum number of concurrent crawlers
    #[arg(long)]
    concurrent: Option<usize>,

    /// Join an existing crawl without seeding a start URL
    #[arg(long)]
    slave: bool,

    /// Flush the frontier backing store before running
    #[arg(long)]
    clear: bool,

    /// Path to the configuration file
    #[arg(long, default_value = "crawler.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = CrawlerConfig::load(&cli.config)?;

    let frontier = Arc::new(RedisFrontier::from_settings(&config.frontier));
    if cli.clear {
        frontier
            .init()
            .await
            .context("could not reach the frontier store to clear it")?;
        frontier.clear().await.context("could not clear the frontier")?;
    }

    let fetcher = Arc::new(HttpFetcher::new().context("could not build the http client")?);
    let manager = CrawlManager::new(frontier, fetcher, Arc::new(DiscardProcessor));
    if let Some(concurrent) = cli.concurrent {
        manager.set_concurrent_crawlers(concurrent);
    }
    if !cli.slave {
        manager.set_start_url(config.scraper.start_url.clone());
    }

    manager.run().await
}
