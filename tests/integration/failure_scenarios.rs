//! Failure tests for the pipeline
//!
//! These tests verify that failures stay local:
//! - Unreachable targets
//! - Storage rejecting writes
//! - Writers without a backend connection

use std::sync::Arc;
use std::time::Duration;

use webcheck::Pipeline;
use webcheck::actors::{PipelineStats, WriterPool, bounded};
use webcheck::storage::MemoryBackend;
use webcheck::targets::resolve_targets;

use crate::helpers::*;

fn unreachable_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/")
}

#[tokio::test]
async fn test_unreachable_target_does_not_affect_others() {
    let site = create_mock_site(200, None).await;

    let targets = resolve_targets([
        format!("down::{}", unreachable_address()),
        format!("up::{}/", site.uri()),
    ]);

    let backend = MemoryBackend::new();
    let pipeline =
        Pipeline::start(&create_test_config(1, 1), targets, Arc::new(backend.clone())).unwrap();

    pipeline
        .dispatcher
        .run(tokio::time::sleep(Duration::from_millis(200)))
        .await;
    pipeline.probers.join().await;
    pipeline.writers.join().await;

    assert_eq!(points_for(&backend, "up").await.len(), 1);
    assert!(points_for(&backend, "down").await.is_empty());
    assert_eq!(pipeline.stats.snapshot().probes_failed, 1);
}

#[tokio::test]
async fn test_failed_probe_warning_names_address_once() {
    let (logs, _guard) = capture_logs();
    let address = unreachable_address();
    let targets = resolve_targets([format!("down::{address}")]);

    let pipeline = Pipeline::start(
        &create_test_config(1, 1),
        targets,
        Arc::new(MemoryBackend::new()),
    )
    .unwrap();
    pipeline
        .dispatcher
        .run(tokio::time::sleep(Duration::from_millis(200)))
        .await;
    pipeline.probers.join().await;
    pipeline.writers.join().await;

    let contents = logs.contents();
    let warning = contents
        .lines()
        .find(|line| line.contains("failed to get data"))
        .unwrap();
    assert!(warning.contains("website=down"));
    assert_eq!(warning.matches(address.as_str()).count(), 1);
}

#[tokio::test]
async fn test_rejected_write_does_not_block_later_writes() {
    let site = create_mock_site(200, None).await;

    let targets = resolve_targets([
        format!("rejected::{}/", site.uri()),
        format!("accepted::{}/?second", site.uri()),
    ]);

    let backend = MemoryBackend::new();
    let connector = RejectingBackend {
        inner: backend.clone(),
        label: "rejected".to_string(),
    };
    let pipeline =
        Pipeline::start(&create_test_config(1, 1), targets, Arc::new(connector)).unwrap();

    pipeline
        .dispatcher
        .run(tokio::time::sleep(Duration::from_millis(200)))
        .await;
    pipeline.probers.join().await;
    pipeline.writers.join().await;

    assert_eq!(points_for(&backend, "accepted").await.len(), 1);
    assert!(points_for(&backend, "rejected").await.is_empty());

    let snapshot = pipeline.stats.snapshot();
    assert_eq!(snapshot.writes_failed, 1);
    assert_eq!(snapshot.writes_succeeded, 1);
}

#[tokio::test]
async fn test_writer_without_connection_logs_every_write() {
    let (logs, _guard) = capture_logs();

    let stats = PipelineStats::new();
    let connector = Arc::new(FlakyConnector::new(MemoryBackend::new(), usize::MAX));
    let (results_tx, results_rx) = bounded(10);

    let writers = WriterPool::spawn(1, connector, results_rx, stats.clone());

    let site = create_mock_site(200, None).await;
    let target = resolve_targets([format!("lost::{}/", site.uri())]).remove(0);
    let prober = webcheck::actors::Prober::new(create_test_config(1, 1).probe_settings()).unwrap();

    for _ in 0..3 {
        let measurement = prober.probe(Arc::clone(&target)).await.unwrap();
        results_tx.send(measurement).await.unwrap();
    }
    drop(results_tx);
    writers.join().await;

    assert_eq!(stats.snapshot().writes_failed, 3);

    let output = logs.contents();
    assert!(output.contains("can not connect to flaky"));
    assert_eq!(output.matches("can not write data into storage").count(), 3);
}

#[tokio::test]
async fn test_one_failed_connection_leaves_other_writers_working() {
    let site = create_mock_site(200, None).await;

    // first writer fails to connect, second succeeds
    let backend = MemoryBackend::new();
    let connector = Arc::new(FlakyConnector::new(backend.clone(), 1));

    let targets = resolve_targets(
        (0..10).map(|i| format!("site{i}::{}/?n={i}", site.uri())),
    );

    let pipeline = Pipeline::start(&create_test_config(4, 2), targets, connector).unwrap();
    pipeline
        .dispatcher
        .run(tokio::time::sleep(Duration::from_millis(300)))
        .await;
    pipeline.probers.join().await;
    pipeline.writers.join().await;

    let snapshot = pipeline.stats.snapshot();
    assert_eq!(snapshot.probes_succeeded, 10);
    assert_eq!(snapshot.writes_succeeded + snapshot.writes_failed, 10);
    // both writers took measurements, the connected one stored its share
    assert!(snapshot.writes_succeeded > 0);
    assert!(snapshot.writes_failed > 0);
    assert_eq!(backend.len().await as u64, snapshot.writes_succeeded);
}
