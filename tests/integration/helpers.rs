//! Helper functions for integration tests

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use webcheck::config::Config;
use webcheck::storage::{
    BackendConnector, HealthStatus, MemoryBackend, Point, StorageBackend, StorageError,
    StorageResult, point::WEBSITE_TAG,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config without jitter so tests run at HTTP speed
pub fn create_test_config(probers: usize, writers: usize) -> Config {
    let mut config = Config::default();
    config.general.interval = 1;
    config.general.probers = probers;
    config.general.writers = writers;
    config.general.timeout = 1;
    config.general.max_jitter_ms = 0;
    config
}

/// Mock site answering `status` on `/`, optionally after a delay
pub async fn create_mock_site(status: u16, delay: Option<Duration>) -> MockServer {
    let mock_server = MockServer::start().await;

    let mut response = ResponseTemplate::new(status);
    if let Some(delay) = delay {
        response = response.set_delay(delay);
    }

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(response)
        .mount(&mock_server)
        .await;

    mock_server
}

/// Points stored for `label`
pub async fn points_for(backend: &MemoryBackend, label: &str) -> Vec<Point> {
    backend
        .points()
        .await
        .into_iter()
        .filter(|p| p.tag(WEBSITE_TAG) == Some(label))
        .collect()
}

/// Backend refusing every point tagged with `label`
pub struct RejectingBackend {
    pub inner: MemoryBackend,
    pub label: String,
}

#[async_trait]
impl StorageBackend for RejectingBackend {
    async fn write_points(&self, points: Vec<Point>) -> StorageResult<()> {
        if points.iter().any(|p| p.tag(WEBSITE_TAG) == Some(self.label.as_str())) {
            return Err(StorageError::WriteRejected {
                status: 400,
                body: "partial write: field type conflict".to_string(),
            });
        }
        self.inner.write_points(points).await
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        self.inner.health_check().await
    }
}

#[async_trait]
impl BackendConnector for RejectingBackend {
    async fn connect(&self) -> StorageResult<Arc<dyn StorageBackend>> {
        Ok(Arc::new(RejectingBackend {
            inner: self.inner.clone(),
            label: self.label.clone(),
        }))
    }

    fn describe(&self) -> String {
        format!("rejecting {}", self.label)
    }
}

/// Connector whose first `failures` connection attempts fail
pub struct FlakyConnector {
    pub inner: MemoryBackend,
    pub failures: usize,
    pub attempts: AtomicUsize,
}

impl FlakyConnector {
    pub fn new(inner: MemoryBackend, failures: usize) -> Self {
        Self {
            inner,
            failures,
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BackendConnector for FlakyConnector {
    async fn connect(&self) -> StorageResult<Arc<dyn StorageBackend>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(StorageError::ConnectionFailed("connection refused".to_string()));
        }
        Ok(Arc::new(self.inner.clone()))
    }

    fn describe(&self) -> String {
        "flaky".to_string()
    }
}

/// Backend that takes `delay` for every write
pub struct SlowBackend {
    pub inner: MemoryBackend,
    pub delay: Duration,
}

#[async_trait]
impl StorageBackend for SlowBackend {
    async fn write_points(&self, points: Vec<Point>) -> StorageResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.write_points(points).await
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        self.inner.health_check().await
    }
}

#[async_trait]
impl BackendConnector for SlowBackend {
    async fn connect(&self) -> StorageResult<Arc<dyn StorageBackend>> {
        Ok(Arc::new(SlowBackend {
            inner: self.inner.clone(),
            delay: self.delay,
        }))
    }

    fn describe(&self) -> String {
        "slow".to_string()
    }
}

/// Log output captured from a thread-local subscriber
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route log output of the current thread into a buffer
///
/// The returned guard must be held for as long as logs should be captured.
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
