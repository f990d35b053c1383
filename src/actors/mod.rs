//! Probing pipeline
//!
//! Each stage runs as independent tokio tasks connected by bounded queues.
//!
//! ## Architecture Overview
//!
//! ```text
//!                 ┌──────────────┐
//!                 │  Dispatcher  │  every interval, all targets
//!                 └──────┬───────┘
//!                        │
//!               ┌────────▼────────┐
//!               │   work queue    │  bounded, blocks when full
//!               └────────┬────────┘
//!          ┌─────────────┼─────────────┐
//!   ┌──────▼─────┐               ┌──────▼─────┐
//!   │  Prober-1  │      ...      │  Prober-N  │  jitter, HTTP GET
//!   └──────┬─────┘               └──────┬─────┘
//!          └─────────────┬─────────────┘
//!               ┌────────▼────────┐
//!               │  results queue  │  bounded, blocks when full
//!               └────────┬────────┘
//!          ┌─────────────┼─────────────┐
//!   ┌──────▼─────┐               ┌──────▼─────┐
//!   │  Writer-1  │      ...      │  Writer-M  │  one backend connection each
//!   └────────────┘               └────────────┘
//! ```
//!
//! ## Failure Handling
//!
//! Probe and write failures are logged where they happen and the affected
//! measurement is dropped. Nothing is retried and no error travels upstream.

pub mod dispatcher;
pub mod messages;
pub mod prober;
pub mod queue;
pub mod stats;
pub mod writer;

pub use dispatcher::{DispatchReport, Dispatcher, StopReason};
pub use messages::{Measurement, Target};
pub use prober::{ProbeError, ProbePool, ProbeSettings, Prober};
pub use queue::{QueueReceiver, QueueSender, bounded};
pub use stats::{PipelineStats, StatsSnapshot};
pub use writer::{Writer, WriterPool};
