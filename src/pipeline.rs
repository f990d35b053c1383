//! Wiring of the probing pipeline
//!
//! Builds both queues and both pools, and hands back the dispatcher so the
//! caller decides what stops it.

use std::sync::Arc;

use tracing::debug;

use crate::actors::{
    Dispatcher, Measurement, PipelineStats, ProbeError, ProbePool, Prober, Target, WriterPool,
    bounded,
};
use crate::config::Config;
use crate::storage::BackendConnector;

/// A running set of probers and writers plus the dispatcher feeding them
pub struct Pipeline {
    pub dispatcher: Dispatcher,
    pub probers: ProbePool,
    pub writers: WriterPool,
    pub stats: PipelineStats,
}

impl Pipeline {
    /// Spawn the pools described by `config` and build the dispatcher
    ///
    /// Workers start right away and wait on their queues; nothing is probed
    /// until the dispatcher runs.
    pub fn start(
        config: &Config,
        targets: Vec<Arc<Target>>,
        connector: Arc<dyn BackendConnector>,
    ) -> Result<Self, ProbeError> {
        let general = &config.general;
        let stats = PipelineStats::new();

        let (work_tx, work_rx) = bounded::<Arc<Target>>(general.queue_capacity);
        let (results_tx, results_rx) = bounded::<Measurement>(general.queue_capacity);

        debug!(
            "starting {} writer(s) on {}",
            general.writers,
            connector.describe()
        );
        let writers = WriterPool::spawn(general.writers, connector, results_rx, stats.clone());

        debug!("starting {} prober(s)", general.probers);
        let prober = Prober::new(config.probe_settings())?;
        let probers = ProbePool::spawn(general.probers, prober, work_rx, results_tx, stats.clone());

        let dispatcher = Dispatcher::new(targets, config.check_interval(), work_tx);

        Ok(Self {
            dispatcher,
            probers,
            writers,
            stats,
        })
    }
}
