//! Distributed web crawler built around a shared URL frontier
//!
//! A pool of single-cycle crawlers pulls URLs from a deduplicated
//! frontier, fetches pages, pushes the links it finds back into the
//! frontier and feeds page bodies to a downstream processor. Several
//! processes can attach to the same Redis-backed frontier to split one
//! crawl horizontally; an in-memory frontier covers single-process use.
//!
//! The moving parts:
//! - [`frontier`]: pending/visited URL sets with quiescence detection
//! - [`balancer`]: composable sliding-window request pacing
//! - [`worker`]: the crawl cycle and its observable lifecycle state
//! - [`manager`]: pool supervision, bounded concurrency, shutdown

pub mod balancer;
pub mod config;
pub mod extract;
pub mod fetcher;
pub mod frontier;
pub mod manager;
pub mod processor;
pub mod worker;

pub use balancer::{LoadBalancer, RateWindow};
pub use config::{CrawlerConfig, FrontierSettings, ScraperSettings};
pub use extract::{NormalizeError, extract_links, is_relative, normalize_url};
pub use fetcher::{FetchError, Fetcher, HttpFetcher, USER_AGENT};
pub use frontier::{Frontier, FrontierError, IdleCheck, MemoryFrontier, RedisFrontier};
pub use manager::{CrawlManager, ManagerState, PoolGate};
pub use processor::{DataProcessor, DiscardProcessor};
pub use worker::{Crawler, CrawlerState, CrawlerStates, StateCell, UrlConstraint};
