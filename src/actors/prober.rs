//! Prober and probe pool
//!
//! A [`Prober`] turns one [`Target`] into one [`Measurement`], or into a
//! [`ProbeError`] when no HTTP response could be obtained. The [`ProbePool`]
//! runs several probe workers that pull targets from the work queue and push
//! measurements onto the results queue.
//!
//! ## Message Flow
//!
//! ```text
//! work queue → jitter sleep → HTTP GET → Measurement → results queue
//!                                  └──── error → logged, dropped
//! ```
//!
//! Failed probes are never retried; the target is checked again on the next
//! dispatch cycle.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, trace, warn};

use super::messages::{Measurement, Target};
use super::queue::{QueueReceiver, QueueSender};
use super::stats::PipelineStats;

/// Total timeout of a single HTTP check
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound (exclusive) of the random delay before each check
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_secs(5);

/// How a probe is performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Total timeout of the HTTP call
    pub timeout: Duration,

    /// Random delay before each check is drawn from `[0, max_jitter)`
    pub max_jitter: Duration,

    /// Accept invalid or self-signed TLS certificates
    ///
    /// Enabled by default: monitored hosts with broken certificates must
    /// still be measured.
    pub insecure_tls: bool,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
            max_jitter: DEFAULT_MAX_JITTER,
            insecure_tls: true,
        }
    }
}

/// Reasons a probe yields no measurement
#[derive(Debug)]
pub enum ProbeError {
    /// The HTTP client could not be built
    ClientBuild(reqwest::Error),

    /// No response within the configured timeout
    Timeout { address: String },

    /// DNS, connection or TLS failure
    Transport {
        address: String,
        source: reqwest::Error,
    },
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::ClientBuild(err) => write!(f, "failed to build HTTP client: {}", err),
            ProbeError::Timeout { address } => write!(f, "request to {} timed out", address),
            ProbeError::Transport { address, source } => {
                write!(f, "request to {} failed: {}", address, source)
            }
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::ClientBuild(err) => Some(err),
            ProbeError::Transport { source, .. } => Some(source),
            ProbeError::Timeout { .. } => None,
        }
    }
}

/// Draw a delay uniformly from `[0, max)`
pub fn random_jitter(max: Duration) -> Duration {
    let max_nanos = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
    if max_nanos == 0 {
        return Duration::ZERO;
    }

    Duration::from_nanos(rand::rng().random_range(0..max_nanos))
}

/// Performs HTTP checks
///
/// The HTTP client is built once and reused for every check.
#[derive(Debug, Clone)]
pub struct Prober {
    client: reqwest::Client,
    settings: ProbeSettings,
}

impl Prober {
    pub fn new(settings: ProbeSettings) -> Result<Self, ProbeError> {
        if settings.insecure_tls {
            debug!("TLS certificate verification disabled for probes");
        }

        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(settings.insecure_tls)
            .build()
            .map_err(ProbeError::ClientBuild)?;

        Ok(Self { client, settings })
    }

    /// Wait for a random jitter, then check the target
    pub async fn probe(&self, target: Arc<Target>) -> Result<Measurement, ProbeError> {
        let jitter = random_jitter(self.settings.max_jitter);
        trace!("waiting {jitter:?} before checking {}", target.address);
        tokio::time::sleep(jitter).await;

        self.check(target).await
    }

    /// Issue the HTTP GET and measure it
    ///
    /// Any response counts as a measurement, whatever its status code.
    pub async fn check(&self, target: Arc<Target>) -> Result<Measurement, ProbeError> {
        trace!("checking {target}");

        let start = Instant::now();
        let response = self.client.get(&target.address).send().await;
        let duration = start.elapsed();

        let response = response.map_err(|source| {
            let err = if source.is_timeout() {
                ProbeError::Timeout {
                    address: target.address.clone(),
                }
            } else {
                ProbeError::Transport {
                    address: target.address.clone(),
                    source: source.without_url(),
                }
            };
            warn!(website = %target.label, "failed to get data: {err}");
            err
        })?;

        Ok(Measurement {
            status_code: response.status().as_u16(),
            timestamp: Utc::now(),
            duration,
            target,
        })
    }
}

/// Pool of probe workers sharing one work queue
pub struct ProbePool {
    workers: Vec<JoinHandle<()>>,
}

impl ProbePool {
    /// Spawn `size` probe workers
    ///
    /// Workers stop once the work queue is closed and drained, or when the
    /// results queue has no receiver left.
    pub fn spawn(
        size: usize,
        prober: Prober,
        work_rx: QueueReceiver<Arc<Target>>,
        results_tx: QueueSender<Measurement>,
        stats: PipelineStats,
    ) -> Self {
        let prober = Arc::new(prober);

        let workers = (0..size)
            .map(|id| {
                tokio::spawn(probe_worker(
                    id,
                    Arc::clone(&prober),
                    work_rx.clone(),
                    results_tx.clone(),
                    stats.clone(),
                ))
            })
            .collect();

        Self { workers }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Wait until every worker has stopped
    pub async fn join(self) {
        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!("probe worker terminated abnormally: {e}");
            }
        }
    }
}

#[instrument(skip_all, fields(prober = id))]
async fn probe_worker(
    id: usize,
    prober: Arc<Prober>,
    work_rx: QueueReceiver<Arc<Target>>,
    results_tx: QueueSender<Measurement>,
    stats: PipelineStats,
) {
    debug!("prober started, waiting for targets");

    while let Some(target) = work_rx.recv().await {
        let measurement = match prober.probe(target).await {
            Ok(measurement) => measurement,
            Err(_) => {
                stats.record_probe(false);
                continue;
            }
        };

        stats.record_probe(true);
        trace!(
            "{} answered {} in {:?}",
            measurement.target.address, measurement.status_code, measurement.duration
        );

        if results_tx.send(measurement).await.is_err() {
            warn!("results queue closed, stopping prober");
            break;
        }
    }

    debug!("prober stopped");
}
