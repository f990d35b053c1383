use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::actors::dispatcher::DEFAULT_CHECK_INTERVAL;
use crate::actors::messages::Target;
use crate::actors::prober::{DEFAULT_MAX_JITTER, DEFAULT_PROBE_TIMEOUT, ProbeSettings};
use crate::actors::queue::DEFAULT_QUEUE_CAPACITY;
use crate::actors::writer::DEFAULT_WRITERS;
use crate::targets::resolve_targets;

/// Environment variable consulted when no InfluxDB password is configured
const INFLUX_PASSWORD: &str = "INFLUX_PASSWORD";

const DEFAULT_PROBERS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub influx: InfluxConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneralConfig {
    /// Websites to check, either `URL` or `label::URL`
    #[serde(default)]
    pub urls: Vec<String>,

    /// Seconds between two check cycles
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Number of concurrent probers
    #[serde(default = "default_probers")]
    pub probers: usize,

    /// Number of concurrent writers
    #[serde(default = "default_writers")]
    pub writers: usize,

    /// Capacity of the work and results queues
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// HTTP timeout of a single check in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Upper bound of the random delay before each check, in milliseconds
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,

    /// Accept invalid TLS certificates on monitored sites
    #[serde(default = "default_insecure_tls")]
    pub insecure_tls: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            urls: vec![],
            interval: default_interval(),
            probers: default_probers(),
            writers: default_writers(),
            queue_capacity: default_queue_capacity(),
            timeout: default_timeout(),
            max_jitter_ms: default_max_jitter_ms(),
            insecure_tls: default_insecure_tls(),
        }
    }
}

/// Connection settings of the InfluxDB backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InfluxConfig {
    #[serde(default = "default_influx_url")]
    pub url: String,

    #[serde(default = "default_database")]
    pub database: String,

    pub user: Option<String>,

    pub password: Option<String>,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: default_influx_url(),
            database: default_database(),
            user: None,
            password: None,
        }
    }
}

fn default_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL.as_secs()
}

fn default_probers() -> usize {
    DEFAULT_PROBERS
}

fn default_writers() -> usize {
    DEFAULT_WRITERS
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_timeout() -> u64 {
    DEFAULT_PROBE_TIMEOUT.as_secs()
}

fn default_max_jitter_ms() -> u64 {
    DEFAULT_MAX_JITTER.as_millis() as u64
}

fn default_insecure_tls() -> bool {
    true
}

fn default_influx_url() -> String {
    "http://localhost:8086".to_string()
}

fn default_database() -> String {
    "http_request".to_string()
}

impl Config {
    /// Reject values the pipeline can not run with
    pub fn validate(&self) -> Result<()> {
        let general = &self.general;

        if general.interval == 0 {
            bail!("interval must be at least one second");
        }
        if general.probers == 0 {
            bail!("at least one prober is required");
        }
        if general.writers == 0 {
            bail!("at least one writer is required");
        }
        if general.queue_capacity == 0 {
            bail!("queue capacity must be at least one");
        }
        if general.timeout == 0 {
            bail!("timeout must be at least one second");
        }

        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.general.interval)
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            timeout: Duration::from_secs(self.general.timeout),
            max_jitter: Duration::from_millis(self.general.max_jitter_ms),
            insecure_tls: self.general.insecure_tls,
        }
    }

    /// Targets from the command line followed by those of the file,
    /// de-duplicated by address
    pub fn targets(&self, cli_urls: &[String]) -> Vec<Arc<Target>> {
        resolve_targets(cli_urls.iter().chain(self.general.urls.iter()))
    }

    /// Fill the InfluxDB password from the environment if the file has none
    pub fn apply_env(&mut self) {
        if self.influx.password.is_none() {
            if let Ok(password) = std::env::var(INFLUX_PASSWORD) {
                trace!("using influx password from {INFLUX_PASSWORD}");
                self.influx.password = Some(password);
            }
        }
    }
}

/// Read a configuration file, JSON if the extension says so, TOML otherwise
pub fn read_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config: Config = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?
    };

    trace!("loaded config: {config:?}");
    Ok(config)
}

/// Load the configuration file, falling back to defaults when it does not
/// exist and `required` is false
pub fn load_config(path: &Path, required: bool) -> Result<Config> {
    if !required && !path.exists() {
        debug!("no config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    read_config_file(path)
}
