//! Crawler pool supervisor
//!
//! The manager seeds the frontier, spawns crawlers up to the configured
//! concurrency, and replaces each finished crawler while the run is still
//! live. Shutdown (SIGINT, SIGTERM or frontier quiescence) flips a one-way
//! `Running -> Stopped` latch: no replacements are spawned, the
//! outstanding crawlers finish their single cycle, and the frontier and
//! downstream connections are closed once the pool has drained.

use anyhow::Context;
use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc, watch};

use crate::balancer::LoadBalancer;
use crate::fetcher::Fetcher;
use crate::frontier::{Frontier, IdleCheck};
use crate::processor::DataProcessor;
use crate::worker::{Crawler, CrawlerStates, UrlConstraint};

const DEFAULT_CONCURRENT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Running,
    Stopped,
}

/// One-way run latch shared with every crawler.
///
/// `request_stop` is a compare-exchange, so repeated signals (or a SIGINT
/// landing mid-shutdown) collapse into the first transition. The quiet
/// flag silences per-URL progress output during the drain.
pub(crate) struct RunState {
    state: AtomicU8,
    quiet: AtomicBool,
}

impl RunState {
    const RUNNING: u8 = 0;
    const STOPPED: u8 = 1;

    fn new() -> Self {
        Self {
            state: AtomicU8::new(Self::RUNNING),
            quiet: AtomicBool::new(false),
        }
    }

    fn reset(&self) {
        self.state.store(Self::RUNNING, Ordering::SeqCst);
        self.quiet.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state.load(Ordering::SeqCst) == Self::RUNNING
    }

    pub(crate) fn is_quiet(&self) -> bool {
        self.quiet.load(Ordering::SeqCst)
    }

    pub(crate) fn request_stop(&self) -> bool {
        let transitioned = self
            .state
            .compare_exchange(Self::RUNNING, Self::STOPPED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if transitioned {
            info!("all crawlers are being stopped");
            self.quiet.store(true, Ordering::SeqCst);
        }
        transitioned
    }
}

/// Bounded-concurrency gate: a semaphore plus an exact in-flight counter.
/// Every crawler acquires one slot before doing any work and releases it
/// exactly once when its cycle ends.
pub struct PoolGate {
    semaphore: Arc<Semaphore>,
    concurrent: AtomicUsize,
    capacity: usize,
}

impl PoolGate {
    #[must_use]
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            concurrent: AtomicUsize::new(0),
            capacity,
        }
    }

    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok()?;
        self.concurrent.fetch_add(1, Ordering::SeqCst);
        Some(permit)
    }

    pub fn release(&self, permit: OwnedSemaphorePermit) {
        drop(permit);
        self.concurrent.fetch_sub(1, Ordering::SeqCst);
    }

    #[must_use]
    pub fn concurrent(&self) -> usize {
        self.concurrent.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

pub struct CrawlManager {
    frontier: Arc<dyn Frontier>,
    fetcher: Arc<dyn Fetcher>,
    processor: Arc<dyn DataProcessor>,
    balancer: Arc<LoadBalancer>,
    states: Arc<CrawlerStates>,
    run_state: Arc<RunState>,
    pool: parking_lot::Mutex<Arc<PoolGate>>,
    constraints: parking_lot::RwLock<Vec<UrlConstraint>>,
    start_url: parking_lot::Mutex<Option<String>>,
    finished_tx: watch::Sender<bool>,
}

impl CrawlManager {
    #[must_use]
    pub fn new(
        frontier: Arc<dyn Frontier>,
        fetcher: Arc<dyn Fetcher>,
        processor: Arc<dyn DataProcessor>,
    ) -> Self {
        let (finished_tx, _) = watch::channel(true);
        Self {
            frontier,
            fetcher,
            processor,
            balancer: Arc::new(LoadBalancer::new()),
            states: Arc::new(CrawlerStates::new()),
            run_state: Arc::new(RunState::new()),
            pool: parking_lot::Mutex::new(Arc::new(PoolGate::new(DEFAULT_CONCURRENT))),
            constraints: parking_lot::RwLock::new(Vec::new()),
            start_url: parking_lot::Mutex::new(None),
            finished_tx,
        }
    }

    /// Set constraints, pool size and seed URL in one call.
    pub fn configure(
        &self,
        constraints: Vec<UrlConstraint>,
        max_concurrent: usize,
        start_url: Option<String>,
    ) {
        *self.constraints.write() = constraints;
        self.set_concurrent_crawlers(max_concurrent);
        *self.start_url.lock() = start_url;
    }

    /// Resize the pool. Takes effect for the next `run`.
    pub fn set_concurrent_crawlers(&self, max_concurrent: usize) {
        *self.pool.lock() = Arc::new(PoolGate::new(max_concurrent));
    }

    pub fn set_start_url(&self, url: Option<String>) {
        *self.start_url.lock() = url;
    }

    /// Replace the constraint list with a single predicate.
    pub fn set_url_constraint(&self, constraint: UrlConstraint) {
        *self.constraints.write() = vec![constraint];
    }

    /// The list is snapshotted into each crawler as it spawns, so a new
    /// constraint only affects crawlers spawned after this call.
    pub fn append_url_constraint(&self, constraint: UrlConstraint) {
        self.constraints.write().push(constraint);
    }

    /// The shared request pacer; configure limits on it before `run`.
    #[must_use]
    pub fn balancer(&self) -> Arc<LoadBalancer> {
        Arc::clone(&self.balancer)
    }

    #[must_use]
    pub fn state(&self) -> ManagerState {
        if self.run_state.is_running() {
            ManagerState::Running
        } else {
            ManagerState::Stopped
        }
    }

    /// Take a concurrency slot from the current pool.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        let pool = Arc::clone(&*self.pool.lock());
        pool.acquire().await
    }

    /// Return a slot taken with [`acquire`](Self::acquire).
    pub fn release(&self, permit: OwnedSemaphorePermit) {
        self.pool.lock().release(permit);
    }

    /// Crawlers currently holding a slot.
    #[must_use]
    pub fn concurrent(&self) -> usize {
        self.pool.lock().concurrent()
    }

    /// Run the crawl to completion: quiescence, SIGINT or SIGTERM.
    ///
    /// Returns an error only for fatal init failures (frontier connection,
    /// seeding); everything after that is drained gracefully.
    pub async fn run(&self) -> anyhow::Result<()> {
        self.run_state.reset();
        self.finished_tx.send_replace(false);
        let result = self.run_inner().await;
        self.finished_tx.send_replace(true);
        result
    }

    async fn run_inner(&self) -> anyhow::Result<()> {
        self.frontier
            .init()
            .await
            .context("could not initialize the frontier")?;
        let seed = self.start_url.lock().clone();
        if let Some(url) = seed {
            self.frontier
                .add_candidate(&url)
                .await
                .context("could not seed the start url")?;
        }

        let signal_task = {
            let run_state = Arc::clone(&self.run_state);
            tokio::spawn(async move {
                shutdown_signal().await;
                run_state.request_stop();
            })
        };

        let pool = Arc::clone(&*self.pool.lock());
        let workers_idle: IdleCheck = {
            let states = Arc::clone(&self.states);
            Arc::new(move || states.all_idle())
        };
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        let mut active = 0usize;
        for _ in 0..pool.capacity() {
            self.spawn_crawler(&pool, &workers_idle, &done_tx);
            active += 1;
        }

        while active > 0 {
            let Some(finished_id) = done_rx.recv().await else {
                break;
            };
            self.states.deregister(finished_id);
            active -= 1;
            if self.run_state.is_running() {
                self.spawn_crawler(&pool, &workers_idle, &done_tx);
                active += 1;
            }
        }

        signal_task.abort();
        self.run_state.request_stop();

        if let Err(err) = self.frontier.close().await {
            warn!("closing frontier failed: {err}");
        }
        if let Err(err) = self.processor.close().await {
            warn!("closing data processor failed: {err}");
        }
        info!("crawlers and connections closed");
        Ok(())
    }

    fn spawn_crawler(
        &self,
        pool: &Arc<PoolGate>,
        workers_idle: &IdleCheck,
        done_tx: &mpsc::UnboundedSender<u64>,
    ) {
        let (id, cell) = self.states.register();
        let crawler = Crawler::new(
            cell,
            Arc::clone(&self.frontier),
            Arc::clone(&self.balancer),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.processor),
            self.constraints.read().clone(),
            Arc::clone(pool),
            Arc::clone(&self.run_state),
            Arc::clone(workers_idle),
        );
        let done_tx = done_tx.clone();
        tokio::spawn(async move {
            crawler.run().await;
            let _ = done_tx.send(id);
        });
    }

    /// Request shutdown and wait for an in-flight `run` to drain.
    /// Safe to call any number of times, from any task.
    pub async fn stop(&self) {
        self.run_state.request_stop();
        let mut finished = self.finished_tx.subscribe();
        while !*finished.borrow_and_update() {
            if finished.changed().await.is_err() {
                break;
            }
        }
    }
}

/// Resolves on SIGINT or, on unix, SIGTERM; both drain identically.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(err) => {
                warn!("no SIGTERM handler available: {err}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
