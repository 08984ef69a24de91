//! Crawler lifecycle state, published lock-free for the idle check
//!
//! Each crawler owns exactly one `StateCell` and is its only writer; the
//! frontier's idle check reads every cell through the shared registry.
//! Reads may be slightly stale, which is fine because the check is
//! re-evaluated on every frontier poll.

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

/// Lifecycle stages of a single crawl cycle, in execution order.
///
/// The ordering matters: the frontier declares the crawl quiescent when no
/// URLs are pending and every crawler sits at or before `GettingUrl`,
/// i.e. nobody downstream can still produce new URLs.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CrawlerState {
    Created = 0,
    GettingUrl = 1,
    DownloadingSite = 2,
    PushingUrls = 3,
    FeedingData = 4,
    Done = 5,
}

impl CrawlerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Created,
            1 => Self::GettingUrl,
            2 => Self::DownloadingSite,
            3 => Self::PushingUrls,
            4 => Self::FeedingData,
            _ => Self::Done,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::GettingUrl => "getting_url",
            Self::DownloadingSite => "downloading_site",
            Self::PushingUrls => "pushing_urls",
            Self::FeedingData => "feeding_data",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-writer, multi-reader cell holding one crawler's current state.
///
/// `advance` uses `fetch_max`, so transitions are monotonically
/// non-decreasing even if a stale caller tries to move backwards.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    #[must_use]
    pub fn new() -> Self {
        Self(AtomicU8::new(CrawlerState::Created as u8))
    }

    pub fn advance(&self, state: CrawlerState) {
        self.0.fetch_max(state as u8, Ordering::Relaxed);
    }

    #[must_use]
    pub fn get(&self) -> CrawlerState {
        CrawlerState::from_u8(self.0.load(Ordering::Relaxed))
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of live crawler state cells.
///
/// The manager registers a cell per spawned crawler and deregisters it
/// once the crawler's completion is observed, so `all_idle` only ever
/// considers crawlers that are still part of the pool.
#[derive(Debug, Default)]
pub struct CrawlerStates {
    cells: DashMap<u64, Arc<StateCell>>,
    next_id: AtomicU64,
}

impl CrawlerStates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> (u64, Arc<StateCell>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cell = Arc::new(StateCell::new());
        self.cells.insert(id, Arc::clone(&cell));
        (id, cell)
    }

    pub fn deregister(&self, id: u64) {
        self.cells.remove(&id);
    }

    /// True when every registered crawler is at or before `GettingUrl`,
    /// i.e. none of them can still push new URLs into the frontier.
    #[must_use]
    pub fn all_idle(&self) -> bool {
        self.cells
            .iter()
            .all(|entry| entry.value().get() <= CrawlerState::GettingUrl)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_totally_ordered() {
        assert!(CrawlerState::Created <= CrawlerState::GettingUrl);
        assert!(CrawlerState::GettingUrl <= CrawlerState::Done);
        assert!(CrawlerState::DownloadingSite < CrawlerState::PushingUrls);
        assert!(CrawlerState::PushingUrls < CrawlerState::FeedingData);
    }

    #[test]
    fn advance_is_monotonic() {
        let cell = StateCell::new();
        cell.advance(CrawlerState::DownloadingSite);
        cell.advance(CrawlerState::GettingUrl);
        assert_eq!(cell.get(), CrawlerState::DownloadingSite);
        cell.advance(CrawlerState::Done);
        assert_eq!(cell.get(), CrawlerState::Done);
    }

    #[test]
    fn idle_check_tracks_registered_cells() {
        let states = CrawlerStates::new();
        assert!(states.all_idle());

        let (id_a, cell_a) = states.register();
        let (_id_b, cell_b) = states.register();
        assert!(states.all_idle());

        cell_a.advance(CrawlerState::DownloadingSite);
        assert!(!states.all_idle());

        cell_a.advance(CrawlerState::Done);
        assert!(!states.all_idle());
        states.deregister(id_a);
        assert!(states.all_idle());

        cell_b.advance(CrawlerState::GettingUrl);
        assert!(states.all_idle());
    }
}
