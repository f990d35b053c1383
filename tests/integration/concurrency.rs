//! Concurrency and backpressure tests
//!
//! These tests verify fan-out/fan-in behaviour:
//! - Many targets spread over several probers
//! - Every item taken from a queue exactly once
//! - Full queues slowing producers down instead of losing data

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use webcheck::Pipeline;
use webcheck::actors::{PipelineStats, ProbePool, Prober, Target, WriterPool, bounded};
use webcheck::storage::MemoryBackend;
use webcheck::targets::resolve_targets;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn test_each_target_probed_exactly_once_per_cycle() {
    let mock_server = MockServer::start().await;

    let request_count = Arc::new(AtomicUsize::new(0));
    let request_count_clone = request_count.clone();

    Mock::given(method("GET"))
        .respond_with(move |_req: &wiremock::Request| {
            request_count_clone.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200).set_delay(Duration::from_millis(20))
        })
        .mount(&mock_server)
        .await;

    let targets = resolve_targets((0..25).map(|i| format!("site{i}::{}/{i}", mock_server.uri())));

    let backend = MemoryBackend::new();
    let pipeline =
        Pipeline::start(&create_test_config(5, 2), targets, Arc::new(backend.clone())).unwrap();

    pipeline
        .dispatcher
        .run(tokio::time::sleep(Duration::from_millis(300)))
        .await;
    pipeline.probers.join().await;
    pipeline.writers.join().await;

    assert_eq!(request_count.load(Ordering::SeqCst), 25);
    assert_eq!(backend.len().await, 25);

    for i in 0..25 {
        let label = format!("site{i}");
        assert_eq!(points_for(&backend, &label).await.len(), 1, "{label}");
    }
}

#[tokio::test]
async fn test_small_queues_apply_backpressure_without_loss() {
    let site = create_mock_site(200, None).await;

    let stats = PipelineStats::new();
    let (work_tx, work_rx) = bounded::<Arc<Target>>(1);
    let (results_tx, results_rx) = bounded(1);

    let backend = MemoryBackend::new();
    let slow = SlowBackend {
        inner: backend.clone(),
        delay: Duration::from_millis(30),
    };

    let writers = WriterPool::spawn(1, Arc::new(slow), results_rx, stats.clone());
    let prober = Prober::new(create_test_config(1, 1).probe_settings()).unwrap();
    let probers = ProbePool::spawn(2, prober, work_rx, results_tx, stats.clone());

    for i in 0..10 {
        work_tx
            .send(Arc::new(Target::new(
                format!("site{i}"),
                format!("{}/?n={i}", site.uri()),
            )))
            .await
            .unwrap();
        assert!(work_tx.len() <= 1);
    }
    drop(work_tx);

    probers.join().await;
    writers.join().await;

    assert_eq!(backend.len().await, 10);
    assert_eq!(stats.snapshot().writes_succeeded, 10);
}

#[tokio::test]
async fn test_slow_target_does_not_hold_back_other_probers() {
    let fast = create_mock_site(200, None).await;
    let slow = create_mock_site(200, Some(Duration::from_millis(800))).await;

    let mut entries = vec![format!("slow::{}/", slow.uri())];
    entries.extend((0..5).map(|i| format!("fast{i}::{}/?n={i}", fast.uri())));
    let targets = resolve_targets(entries);

    let backend = MemoryBackend::new();
    let pipeline =
        Pipeline::start(&create_test_config(2, 1), targets, Arc::new(backend.clone())).unwrap();

    let report = tokio::spawn(
        pipeline
            .dispatcher
            .run(tokio::time::sleep(Duration::from_millis(100))),
    );

    // fast sites are all stored while the slow one is still pending
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(backend.len().await, 5);
    assert!(points_for(&backend, "slow").await.is_empty());

    report.await.unwrap();
    pipeline.probers.join().await;
    pipeline.writers.join().await;

    assert_eq!(backend.len().await, 6);
}
