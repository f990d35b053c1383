//! In-memory storage backend (no persistence)
//!
//! Points are kept in a ring buffer. Useful for:
//! - Testing the pipeline without an InfluxDB instance
//! - Dry runs, where points are logged instead of sent anywhere
//!
//! ## Limitations
//!
//! - **No persistence**: All data lost on exit
//! - **Limited capacity**: Oldest points are evicted once the buffer is full

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::backend::{BackendConnector, HealthStatus, StorageBackend};
use super::error::StorageResult;
use super::point::Point;

/// Maximum points kept in memory
const MAX_POINTS: usize = 1000;

/// In-memory storage backend
///
/// Clones share the same buffer, so a test can keep one handle and hand
/// another to the writer pool.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    points: Arc<Mutex<VecDeque<Point>>>,
    capacity: usize,
    log_points: bool,
}

impl MemoryBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self::with_capacity(MAX_POINTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(MAX_POINTS)))),
            capacity: capacity.max(1),
            log_points: false,
        }
    }

    /// Log every written point in line protocol at INFO level
    pub fn logging(mut self) -> Self {
        self.log_points = true;
        self
    }

    /// Copy of all stored points, oldest first
    pub async fn points(&self) -> Vec<Point> {
        self.points.lock().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.points.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn write_points(&self, points: Vec<Point>) -> StorageResult<()> {
        let mut stored = self.points.lock().await;

        for point in points {
            if self.log_points {
                info!("{}", point.to_line_protocol());
            }

            if stored.len() >= self.capacity {
                stored.pop_front();
            }
            stored.push_back(point);
        }

        Ok(())
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        Ok(HealthStatus {
            healthy: true,
            message: "In-memory storage operational".to_string(),
        })
    }
}

#[async_trait]
impl BackendConnector for MemoryBackend {
    async fn connect(&self) -> StorageResult<Arc<dyn StorageBackend>> {
        debug!("connecting to in-memory backend");
        Ok(Arc::new(self.clone()))
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
