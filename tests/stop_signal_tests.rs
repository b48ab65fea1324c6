//! Integration tests for per-target stop signalling.
//!
//! A stop on one target has to reach every worker bound to it, however many
//! there are, and must leave the workers of other targets running.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use rust_urlswarm::errors::TransportError;
use rust_urlswarm::executor::{RequestExecutor, TimeoutPolicy, Transport, TransportResponse};
use rust_urlswarm::pool::Pool;

struct Ok200;

struct Empty;

#[async_trait]
impl TransportResponse for Empty {
    fn status(&self) -> u16 {
        200
    }

    async fn release(self: Box<Self>) -> Result<(), TransportError> {
        Ok(())
    }
}

#[async_trait]
impl Transport for Ok200 {
    async fn get(
        &self,
        _url: &str,
        _timeout: Duration,
    ) -> Result<Box<dyn TransportResponse>, TransportError> {
        tokio::time::sleep(Duration::from_millis(2)).await;
        Ok(Box::new(Empty))
    }
}

fn pool(workers: usize, targets: &[&str]) -> Arc<Pool> {
    let executor = RequestExecutor::new(
        Arc::new(Ok200),
        TimeoutPolicy::Fixed(Duration::from_secs(1)),
    );
    let mut pool = Pool::new(workers, executor);
    pool.populate(targets.iter().copied());
    Arc::new(pool)
}

async fn stop_reaches_all(workers: usize) {
    let pool = pool(workers, &["http://stop.test/"]);
    let runner = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.run().await })
    };

    // Let every worker get going.
    let deadline = Instant::now() + Duration::from_secs(5);
    while pool.active_workers() < workers {
        assert!(Instant::now() < deadline, "workers never all started");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let stopped_at = Instant::now();
    pool.targets()[0].signal_stop();

    let summary = tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .unwrap_or_else(|_| panic!("{} workers did not all stop", workers))
        .unwrap();

    assert_eq!(summary.workers_spawned, workers);
    assert_eq!(summary.workers_stopped, workers);
    assert_eq!(pool.active_workers(), 0);
    assert!(stopped_at.elapsed() < Duration::from_secs(5));
    assert!(pool.targets()[0].snapshot().request_count > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_reaches_one_worker() {
    stop_reaches_all(1).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_reaches_ten_workers() {
    stop_reaches_all(10).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_reaches_hundred_workers() {
    stop_reaches_all(100).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_is_per_target() {
    let pool = pool(5, &["http://stop.test/a", "http://stop.test/b"]);
    let runner = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.run().await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    pool.targets()[0].signal_stop();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let a_after_stop = pool.targets()[0].snapshot().request_count;
    let b_after_stop = pool.targets()[1].snapshot().request_count;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // a is frozen, b keeps growing
    assert_eq!(pool.targets()[0].snapshot().request_count, a_after_stop);
    assert!(pool.targets()[1].snapshot().request_count > b_after_stop);
    assert_eq!(pool.active_workers(), 5);
    assert!(!runner.is_finished());

    pool.targets()[1].signal_stop();
    let summary = tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("pool did not stop")
        .unwrap();
    assert_eq!(summary.workers_stopped, 10);
}

#[tokio::test]
async fn test_stop_before_run_spawns_nothing() {
    let pool = pool(10, &["http://stop.test/"]);
    pool.signal_stop_all();

    let summary = tokio::time::timeout(Duration::from_secs(1), pool.run())
        .await
        .expect("pre-stopped pool should return quickly");

    assert_eq!(summary.workers_spawned, 0);
    assert_eq!(summary.workers_stopped, 0);
    assert_eq!(pool.targets()[0].snapshot().request_count, 0);
}
