//! Storage backend trait definitions
//!
//! A [`BackendConnector`] knows how to reach a backend and hands out one
//! connection per writer. The connection itself is a [`StorageBackend`].

use std::sync::Arc;

use async_trait::async_trait;

use super::error::StorageResult;
use super::point::Point;

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,
}

/// Trait for time-series storage backends
///
/// Implementations must be `Send + Sync` as they are used from the writer
/// tasks.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Persist a batch of points
    ///
    /// The batch is written as a whole; on error none of its points should be
    /// assumed stored.
    async fn write_points(&self, points: Vec<Point>) -> StorageResult<()>;

    /// Check backend health
    ///
    /// Performs a lightweight request to verify the backend is reachable.
    async fn health_check(&self) -> StorageResult<HealthStatus>;
}

/// Establishes backend connections
///
/// Each writer calls [`BackendConnector::connect`] once at startup, so one
/// writer's connection never blocks another's.
#[async_trait]
pub trait BackendConnector: Send + Sync {
    /// Open a connection to the backend
    async fn connect(&self) -> StorageResult<Arc<dyn StorageBackend>>;

    /// Short description of the backend for logging
    fn describe(&self) -> String;
}
