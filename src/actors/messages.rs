//! Message types flowing through the probing pipeline
//!
//! Targets travel from the dispatcher to the probers, measurements from the
//! probers to the writers. Both are immutable once built.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// A website to probe
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    /// Identifier used as the `website` tag in storage
    pub label: String,

    /// URL to request
    pub address: String,
}

impl Target {
    pub fn new(label: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label == self.address {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} ({})", self.label, self.address)
        }
    }
}

/// Outcome of one successful probe
///
/// Only probes that received an HTTP response produce a measurement, so the
/// status code is always present.
#[derive(Debug, Clone)]
pub struct Measurement {
    /// The probed target (shared with the dispatcher)
    pub target: Arc<Target>,

    /// HTTP status code of the response
    pub status_code: u16,

    /// When the probe completed
    pub timestamp: DateTime<Utc>,

    /// Elapsed time of the HTTP call (jitter excluded)
    pub duration: Duration,
}
