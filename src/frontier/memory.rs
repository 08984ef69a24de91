//! In-process frontier backed by two `HashSet`s behind one lock

use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::Mutex;

use super::{Frontier, FrontierError, IdleCheck, POLL_INTERVAL};

#[derive(Debug, Default)]
struct UrlSets {
    to_visit: HashSet<String>,
    visited: HashSet<String>,
}

/// Frontier for a single-process crawl, useful for tests and for crawls
/// that do not need to be shared between machines.
///
/// Both sets live behind a single `tokio::sync::Mutex`, so every mutation
/// is serialized and the pending→visited move in `acquire_next` is atomic
/// with respect to all other operations.
#[derive(Debug, Default)]
pub struct MemoryFrontier {
    sets: Mutex<UrlSets>,
}

impl MemoryFrontier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of URLs dispatched so far.
    pub async fn visited_count(&self) -> usize {
        self.sets.lock().await.visited.len()
    }
}

#[async_trait]
impl Frontier for MemoryFrontier {
    async fn init(&self) -> Result<(), FrontierError> {
        Ok(())
    }

    async fn add_candidate(&self, url: &str) -> Result<(), FrontierError> {
        let mut sets = self.sets.lock().await;
        if !sets.visited.contains(url) {
            sets.to_visit.insert(url.to_owned());
        }
        Ok(())
    }

    async fn acquire_next(&self, workers_idle: &IdleCheck) -> Result<Option<String>, FrontierError> {
        loop {
            {
                let mut sets = self.sets.lock().await;
                if let Some(url) = sets.to_visit.iter().next().cloned() {
                    sets.to_visit.remove(&url);
                    sets.visited.insert(url.clone());
                    return Ok(Some(url));
                }
            }
            if workers_idle() {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn mark_visited(&self, url: &str) -> Result<(), FrontierError> {
        let mut sets = self.sets.lock().await;
        sets.to_visit.remove(url);
        sets.visited.insert(url.to_owned());
        Ok(())
    }

    async fn pending_count(&self) -> Result<usize, FrontierError> {
        Ok(self.sets.lock().await.to_visit.len())
    }

    async fn clear(&self) -> Result<(), FrontierError> {
        let mut sets = self.sets.lock().await;
        sets.to_visit.clear();
        sets.visited.clear();
        Ok(())
    }

    async fn close(&self) -> Result<(), FrontierError> {
        Ok(())
    }
}
