//! Configuration types
//!
//! Mirrors the deployment config file: a `[scraper]` section for the crawl
//! seed and a `[frontier]` section addressing the shared Redis store.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlerConfig {
    #[serde(default)]
    pub scraper: ScraperSettings,
    #[serde(default)]
    pub frontier: FrontierSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScraperSettings {
    /// URL seeded into the frontier at startup. Leave unset (or pass
    /// `--slave`) to join a crawl another process already seeded.
    #[serde(default)]
    pub start_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_to_visit_set")]
    pub to_visit_set: String,
    #[serde(default = "default_visited_set")]
    pub visited_set: String,
}

impl Default for FrontierSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            to_visit_set: default_to_visit_set(),
            visited_set: default_visited_set(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    6379
}

fn default_to_visit_set() -> String {
    "to_visit".to_owned()
}

fn default_visited_set() -> String {
    "visited".to_owned()
}
