//! Writer and writer pool
//!
//! A [`Writer`] persists one [`Measurement`] at a time as a single-point
//! batch. The [`WriterPool`] runs several writers pulling from the results
//! queue; each writer opens its own backend connection when it starts.
//!
//! Write errors are logged and the measurement is dropped. A writer whose
//! connection could not be established keeps running and reports every write
//! as failed.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace, warn};

use crate::storage::{BackendConnector, Point, StorageBackend, StorageError, StorageResult};

use super::messages::Measurement;
use super::queue::QueueReceiver;
use super::stats::PipelineStats;

/// Number of writers started unless configured
pub const DEFAULT_WRITERS: usize = 1;

/// Persists measurements through one backend connection
pub struct Writer {
    id: usize,
    connection: Result<Arc<dyn StorageBackend>, String>,
}

impl Writer {
    /// Open a connection through `connector`
    ///
    /// A failed connection is logged, not returned: the writer is still built
    /// and every write through it fails with [`StorageError::NotConnected`].
    pub async fn connect(id: usize, connector: &dyn BackendConnector) -> Self {
        let connection = match connector.connect().await {
            Ok(backend) => Ok(backend),
            Err(e) => {
                error!("writer {id}: can not connect to {}: {e}", connector.describe());
                Err(e.to_string())
            }
        };

        Self { id, connection }
    }

    /// Build a writer around an already established connection
    pub fn with_backend(id: usize, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            id,
            connection: Ok(backend),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_ok()
    }

    /// Persist one measurement as a single-point batch
    pub async fn write(&self, measurement: &Measurement) -> StorageResult<()> {
        let backend = self
            .connection
            .as_ref()
            .map_err(|reason| StorageError::NotConnected(reason.clone()))?;

        backend
            .write_points(vec![Point::from_measurement(measurement)])
            .await
    }
}

/// Pool of writers sharing one results queue
pub struct WriterPool {
    workers: Vec<JoinHandle<()>>,
}

impl WriterPool {
    /// Spawn `size` writers, each connecting through `connector`
    ///
    /// Writers stop once the results queue is closed and drained.
    pub fn spawn(
        size: usize,
        connector: Arc<dyn BackendConnector>,
        results_rx: QueueReceiver<Measurement>,
        stats: PipelineStats,
    ) -> Self {
        let workers = (0..size)
            .map(|id| {
                tokio::spawn(write_worker(
                    id,
                    Arc::clone(&connector),
                    results_rx.clone(),
                    stats.clone(),
                ))
            })
            .collect();

        Self { workers }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Wait until every writer has stopped
    pub async fn join(self) {
        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!("writer terminated abnormally: {e}");
            }
        }
    }
}

#[instrument(skip_all, fields(writer = id))]
async fn write_worker(
    id: usize,
    connector: Arc<dyn BackendConnector>,
    results_rx: QueueReceiver<Measurement>,
    stats: PipelineStats,
) {
    let writer = Writer::connect(id, connector.as_ref()).await;
    debug!("writer started, waiting for measurements");

    while let Some(measurement) = results_rx.recv().await {
        match writer.write(&measurement).await {
            Ok(()) => {
                stats.record_write(true);
                trace!("stored result for {}", measurement.target.label);
            }
            Err(e) => {
                stats.record_write(false);
                error!(
                    website = %measurement.target.label,
                    "can not write data into storage: {e}"
                );
            }
        }
    }

    debug!("writer stopped");
}
