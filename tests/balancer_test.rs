//! Load balancer pacing: configuration, admission latency and nesting

use std::sync::Arc;
use std::time::{Duration, Instant};
use webcrawl::{LoadBalancer, RateWindow};

#[test]
fn set_limit_replaces_current_limit() {
    let balancer = LoadBalancer::with_limit(60, RateWindow::Minute);
    balancer.set_limit(10, RateWindow::Minute);
    assert_eq!(balancer.current_limit(), Some((10, RateWindow::Minute)));
    balancer.set_limit(10, RateWindow::Second);
    assert_eq!(balancer.current_limit(), Some((10, RateWindow::Second)));
}

#[tokio::test]
async fn uncontended_acquire_is_immediate() {
    let balancer = LoadBalancer::with_limit(60, RateWindow::Minute);
    let start = Instant::now();
    balancer.acquire().await;
    assert!(start.elapsed() < Duration::from_millis(100));
}

#[tokio::test]
async fn sequential_requests_take_longer_than_one_request() {
    let balancer = Arc::new(LoadBalancer::with_limit(60, RateWindow::Minute));
    let request_time = Duration::from_millis(50);

    let start = Instant::now();
    let mut handles = Vec::new();
    for _ in 0..3 {
        let balancer = Arc::clone(&balancer);
        handles.push(tokio::spawn(async move {
            balancer.acquire().await;
            tokio::time::sleep(request_time).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert!(start.elapsed() > request_time);
}

#[tokio::test]
async fn window_capacity_is_never_exceeded() {
    let balancer = LoadBalancer::with_limit(2, RateWindow::Second);
    let start = Instant::now();
    balancer.acquire().await;
    balancer.acquire().await;
    assert!(start.elapsed() < Duration::from_millis(200));

    // Third admission has to wait for the first to leave the window.
    balancer.acquire().await;
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(800), "admitted after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2));
}

#[tokio::test]
async fn nested_balancer_gates_the_composite() {
    let outer = Arc::new(LoadBalancer::with_limit(60, RateWindow::Minute));
    let inner = Arc::new(LoadBalancer::new());
    inner.add_limit(1, RateWindow::Second);
    outer.add_child(Arc::clone(&inner));

    let start = Instant::now();
    let mut handles = Vec::new();
    for _ in 0..3 {
        let outer = Arc::clone(&outer);
        handles.push(tokio::spawn(async move {
            outer.acquire().await;
            tokio::time::sleep(Duration::from_millis(500)).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Admissions at roughly 0s, 1s and 2s, each followed by 0.5s of work.
    let elapsed = start.elapsed();
    assert!(elapsed > Duration::from_secs(2), "finished after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "finished after {elapsed:?}");
}
