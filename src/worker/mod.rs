//! Single-cycle crawler
//!
//! A crawler performs exactly one fetch cycle and terminates; the manager
//! keeps the pool saturated by spawning a replacement for every finished
//! crawler. Errors inside a cycle are logged and end the cycle; they
//! never reach the manager, so one bad page cannot take down the crawl.

pub mod state;

pub use state::{CrawlerState, CrawlerStates, StateCell};

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;

use crate::balancer::LoadBalancer;
use crate::extract::{extract_links, normalize_url};
use crate::fetcher::{FetchError, Fetcher};
use crate::frontier::{Frontier, IdleCheck};
use crate::manager::{PoolGate, RunState};
use crate::processor::DataProcessor;

/// Admission predicate applied to every normalized candidate URL.
/// A candidate is enqueued only if every constraint accepts it.
pub type UrlConstraint = Arc<dyn Fn(&str) -> bool + Send + Sync>;

pub struct Crawler {
    state: Arc<StateCell>,
    frontier: Arc<dyn Frontier>,
    balancer: Arc<LoadBalancer>,
    fetcher: Arc<dyn Fetcher>,
    processor: Arc<dyn DataProcessor>,
    constraints: Vec<UrlConstraint>,
    pool: Arc<PoolGate>,
    run_state: Arc<RunState>,
    workers_idle: IdleCheck,
}

impl Crawler {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        state: Arc<StateCell>,
        frontier: Arc<dyn Frontier>,
        balancer: Arc<LoadBalancer>,
        fetcher: Arc<dyn Fetcher>,
        processor: Arc<dyn DataProcessor>,
        constraints: Vec<UrlConstraint>,
        pool: Arc<PoolGate>,
        run_state: Arc<RunState>,
        workers_idle: IdleCheck,
    ) -> Self {
        Self {
            state,
            frontier,
            balancer,
            fetcher,
            processor,
            constraints,
            pool,
            run_state,
            workers_idle,
        }
    }

    /// One full crawl cycle: slot, pacing, URL, fetch, push, feed.
    ///
    /// A URL is already marked visited when the fetch starts, so a failed
    /// fetch loses it rather than retrying: one cycle per URL, always.
    pub(crate) async fn run(self) {
        let Some(permit) = self.pool.acquire().await else {
            self.state.advance(CrawlerState::Done);
            return;
        };
        self.balancer.acquire().await;

        self.state.advance(CrawlerState::GettingUrl);
        let url = match self.frontier.acquire_next(&self.workers_idle).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                // Nothing pending and nobody can produce more: the crawl
                // is over, tell the manager to start draining.
                self.run_state.request_stop();
                self.finish(permit);
                return;
            }
            Err(err) => {
                warn!("frontier unavailable while acquiring: {err}");
                self.finish(permit);
                return;
            }
        };

        self.state.advance(CrawlerState::DownloadingSite);
        let body = match self.fetcher.fetch(&url).await {
            Ok(body) => body,
            Err(FetchError::BadResponse(status)) => {
                warn!("{url} answered {status}");
                self.finish(permit);
                return;
            }
            Err(err) => {
                warn!("{url} could not be fetched: {err}");
                self.finish(permit);
                return;
            }
        };
        if !self.run_state.is_quiet() {
            info!("{url}");
        }

        self.state.advance(CrawlerState::PushingUrls);
        for candidate in extract_links(&body) {
            let normalized = match normalize_url(&candidate, Some(&url)) {
                Ok(normalized) => normalized,
                Err(err) => {
                    debug!("dropping candidate {candidate}: {err}");
                    continue;
                }
            };
            if !self.constraints.iter().all(|accepts| accepts(&normalized)) {
                continue;
            }
            if let Err(err) = self.frontier.add_candidate(&normalized).await {
                warn!("could not enqueue {normalized}: {err}");
                break;
            }
        }

        self.state.advance(CrawlerState::FeedingData);
        if let Err(err) = self.processor.feed(&body).await {
            warn!("data processor rejected page from {url}: {err}");
        }

        self.finish(permit);
    }

    fn finish(&self, permit: OwnedSemaphorePermit) {
        self.pool.release(permit);
        self.state.advance(CrawlerState::Done);
    }
}
