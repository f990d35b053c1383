//! Dispatcher - drives the check cycle
//!
//! Every interval, all targets are pushed onto the work queue. Pushing blocks
//! while the queue is full, which is the only place the pipeline applies
//! backpressure: when probers fall behind, the cycle period drifts instead of
//! work piling up.
//!
//! ## Message Flow
//!
//! ```text
//! ┌──────────────┐  enqueue all targets   ┌────────────┐
//! │  Dispatcher  │ ─────────────────────▶ │ work queue │ ─▶ probers
//! └──────┬───────┘                        └────────────┘
//!        │ wait for interval tick or shutdown (first wins)
//!        └─────────────── loop ───────────────┘
//! ```
//!
//! Shutdown is an explicit future passed to [`Dispatcher::run`], so the loop
//! can be stopped by a signal handler in the binary or by a test.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, trace};

use super::messages::Target;
use super::queue::{QueueClosed, QueueSender};

/// Interval between two check cycles unless configured
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Why the dispatcher stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown future completed
    Cancelled,

    /// No prober is left to receive work
    QueueClosed,
}

/// Summary returned when the dispatcher stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of fully enqueued cycles
    pub cycles: u64,

    pub reason: StopReason,
}

/// Periodically enqueues every target onto the work queue
pub struct Dispatcher {
    targets: Vec<Arc<Target>>,
    interval: Duration,
    work_tx: QueueSender<Arc<Target>>,
}

impl Dispatcher {
    pub fn new(
        targets: Vec<Arc<Target>>,
        interval: Duration,
        work_tx: QueueSender<Arc<Target>>,
    ) -> Self {
        Self {
            targets,
            // tokio intervals must be non-zero
            interval: interval.max(Duration::from_millis(1)),
            work_tx,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run check cycles until `shutdown` completes
    ///
    /// The first cycle starts immediately. Shutdown is observed both while
    /// waiting for the next tick and while blocked on a full work queue.
    #[instrument(skip_all, fields(targets = self.targets.len()))]
    pub async fn run<F>(self, shutdown: F) -> DispatchReport
    where
        F: Future<Output = ()>,
    {
        info!(
            "dispatching {} target(s) every {:?}",
            self.targets.len(),
            self.interval
        );

        tokio::pin!(shutdown);

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        let mut cycles = 0;

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    debug!("shutdown requested while enqueuing");
                    return DispatchReport { cycles, reason: StopReason::Cancelled };
                }

                result = self.dispatch_cycle() => {
                    if let Err(e) = result {
                        error!("can not dispatch {}: {e}", e.0.address);
                        return DispatchReport { cycles, reason: StopReason::QueueClosed };
                    }
                    cycles += 1;
                    trace!("cycle {cycles} enqueued");
                }
            }

            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    debug!("shutdown requested");
                    return DispatchReport { cycles, reason: StopReason::Cancelled };
                }

                _ = ticker.tick() => {}
            }
        }
    }

    /// Enqueue every target once, waiting for space when the queue is full
    async fn dispatch_cycle(&self) -> Result<(), QueueClosed<Arc<Target>>> {
        for target in &self.targets {
            self.work_tx.send(Arc::clone(target)).await?;
        }
        Ok(())
    }
}
