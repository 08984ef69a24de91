//! File configuration for the crawler binary

mod types;

pub use types::{CrawlerConfig, FrontierSettings, ScraperSettings};

use anyhow::Context;
use std::path::Path;

impl CrawlerConfig {
    /// Load a TOML config file. A missing file yields the defaults so a
    /// bare `webcrawl --slave` can join a local crawl with no setup.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("could not parse config file {}", path.display()))
    }
}
