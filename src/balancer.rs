//! Composable rate limiter pacing outbound requests
//!
//! A balancer is a tree: each node carries zero or more `(limit, window)`
//! slots, plus nested child balancers. `acquire` admits a request only
//! when every slot in the whole tree has headroom, which lets a
//! per-domain throttle nest inside a global one.
//!
//! Each slot keeps a FIFO of the instants at which requests were admitted
//! during its trailing window. A slot at capacity reports how long until
//! its oldest recorded instant falls out of the window; the acquirer
//! sleeps the longest such wait across the tree and retries. Waiters are
//! serialized through an admission lock, so under contention they are
//! released in rough arrival order, but strict FIFO is not guaranteed.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Trailing window a request limit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateWindow {
    Second,
    Minute,
}

impl RateWindow {
    #[must_use]
    pub const fn duration(self) -> Duration {
        match self {
            Self::Second => Duration::from_secs(1),
            Self::Minute => Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct WindowSlot {
    limit: u32,
    window: RateWindow,
    history: VecDeque<Instant>,
}

impl WindowSlot {
    fn new(limit: u32, window: RateWindow) -> Self {
        Self {
            limit,
            window,
            history: VecDeque::new(),
        }
    }

    fn prune(&mut self, now: Instant) {
        let span = self.window.duration();
        while let Some(&oldest) = self.history.front() {
            if now.duration_since(oldest) >= span {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Time until this slot has headroom again; zero when below capacity.
    fn rest(&mut self, now: Instant) -> Duration {
        self.prune(now);
        if (self.history.len() as u32) < self.limit {
            return Duration::ZERO;
        }
        match self.history.front() {
            Some(&oldest) => self.window.duration().saturating_sub(now.duration_since(oldest)),
            None => self.window.duration(),
        }
    }

    fn record(&mut self, now: Instant) {
        self.history.push_back(now);
    }
}

/// Composable request pacer. See the module docs for the admission rule.
#[derive(Default)]
pub struct LoadBalancer {
    admission: tokio::sync::Mutex<()>,
    slots: parking_lot::Mutex<Vec<WindowSlot>>,
    children: parking_lot::Mutex<Vec<Arc<LoadBalancer>>>,
}

impl LoadBalancer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Balancer pre-configured with a single limit.
    #[must_use]
    pub fn with_limit(limit: u32, window: RateWindow) -> Self {
        let balancer = Self::new();
        balancer.slots.lock().push(WindowSlot::new(limit, window));
        balancer
    }

    /// Replace this node's own limits with a single `(limit, window)`.
    pub fn set_limit(&self, limit: u32, window: RateWindow) {
        let mut slots = self.slots.lock();
        slots.clear();
        slots.push(WindowSlot::new(limit, window));
    }

    /// Add a further limit to this node; admission must satisfy all of them.
    pub fn add_limit(&self, limit: u32, window: RateWindow) {
        self.slots.lock().push(WindowSlot::new(limit, window));
    }

    /// Nest a child balancer; admission must satisfy the whole subtree.
    pub fn add_child(&self, child: Arc<LoadBalancer>) {
        self.children.lock().push(child);
    }

    /// The first of this node's own limits, if any.
    #[must_use]
    pub fn current_limit(&self) -> Option<(u32, RateWindow)> {
        self.slots.lock().first().map(|slot| (slot.limit, slot.window))
    }

    /// Block until a request is admitted by every slot in the tree.
    ///
    /// The admission lock is held across the retry sleep: once capacity is
    /// exhausted nobody can be admitted before the computed wait elapses
    /// anyway, and holding the lock keeps waiters in arrival order.
    pub async fn acquire(&self) {
        let _admission = self.admission.lock().await;
        loop {
            let now = Instant::now();
            let wait = self.rest(now);
            if wait.is_zero() {
                self.record(now);
                return;
            }
            tokio::time::sleep(wait).await;
        }
    }

    fn rest(&self, now: Instant) -> Duration {
        let mut wait = Duration::ZERO;
        for slot in self.slots.lock().iter_mut() {
            wait = wait.max(slot.rest(now));
        }
        for child in self.children.lock().iter() {
            wait = wait.max(child.rest(now));
        }
        wait
    }

    fn record(&self, now: Instant) {
        for slot in self.slots.lock().iter_mut() {
            slot.record(now);
        }
        for child in self.children.lock().iter() {
            child.record(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_limit_replaces() {
        let balancer = LoadBalancer::with_limit(60, RateWindow::Minute);
        balancer.set_limit(10, RateWindow::Second);
        assert_eq!(balancer.current_limit(), Some((10, RateWindow::Second)));
    }

    #[test]
    fn slot_rest_counts_down_from_capacity() {
        let mut slot = WindowSlot::new(1, RateWindow::Second);
        let start = Instant::now();
        assert_eq!(slot.rest(start), Duration::ZERO);
        slot.record(start);
        let rest = slot.rest(start + Duration::from_millis(400));
        assert_eq!(rest, Duration::from_millis(600));
        assert_eq!(slot.rest(start + Duration::from_secs(1)), Duration::ZERO);
    }
}
