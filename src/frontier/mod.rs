//! Shared URL frontier: deduplicated pending/visited sets with a
//! dequeue that waits for work and detects global quiescence
//!
//! Two variants implement the same contract: [`MemoryFrontier`] keeps the
//! sets in-process, [`RedisFrontier`] shares them between crawler
//! processes through a Redis server. Mutations only ever happen through
//! this interface, which is what keeps the pending and visited sets
//! disjoint.

mod memory;
mod redis;

pub use self::memory::MemoryFrontier;
pub use self::redis::RedisFrontier;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// How often an empty frontier re-checks for new work and for quiescence.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Callback supplied by the manager: true when every crawler is at or
/// before `GettingUrl`. The frontier combines it with its own emptiness
/// check to decide that no URL can ever arrive again.
pub type IdleCheck = Arc<dyn Fn() -> bool + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum FrontierError {
    /// The backing store could not be reached or refused the operation.
    #[error("frontier store unavailable: {0}")]
    Unavailable(String),
}

impl From<::redis::RedisError> for FrontierError {
    fn from(err: ::redis::RedisError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Set-valued work queue shared by all crawlers.
///
/// The one operation with a hard atomicity requirement is
/// [`acquire_next`](Frontier::acquire_next): a URL moves from pending to
/// visited in a single step, so no two crawlers can dispatch the same URL.
/// [`add_candidate`](Frontier::add_candidate) is allowed to race benignly
/// since a URL visited concurrently with its re-insertion is caught at the
/// next dequeue, never re-fetched twice.
#[async_trait]
pub trait Frontier: Send + Sync {
    /// Open the connection to the backing store, if any.
    async fn init(&self) -> Result<(), FrontierError>;

    /// Insert `url` into the pending set unless it was already visited.
    /// Idempotent for a single URL.
    async fn add_candidate(&self, url: &str) -> Result<(), FrontierError>;

    /// Atomically move one URL from pending to visited and return it.
    ///
    /// When the pending set is empty this polls every [`POLL_INTERVAL`],
    /// and returns `Ok(None)` only once the set is empty *and*
    /// `workers_idle` holds; at that point no crawler can produce new
    /// URLs and the crawl is over.
    async fn acquire_next(&self, workers_idle: &IdleCheck) -> Result<Option<String>, FrontierError>;

    /// Insert `url` into the visited set. Idempotent.
    async fn mark_visited(&self, url: &str) -> Result<(), FrontierError>;

    /// Number of URLs waiting to be dispatched.
    async fn pending_count(&self) -> Result<usize, FrontierError>;

    /// Drop both backing sets, forgetting all pending and visited URLs.
    async fn clear(&self) -> Result<(), FrontierError>;

    /// Release the connection to the backing store.
    async fn close(&self) -> Result<(), FrontierError>;
}
