//! InfluxDB 1.x backend over the HTTP API
//!
//! Points are posted as line protocol to `/write` with second precision.
//! Connecting pings `/ping` so an unreachable server is reported when the
//! writer starts rather than on its first write.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::config::InfluxConfig;

use super::backend::{BackendConnector, HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::point::Point;

/// Timeout for requests to InfluxDB
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Creates one [`InfluxBackend`] connection per writer
#[derive(Debug, Clone)]
pub struct InfluxConnector {
    config: InfluxConfig,
}

impl InfluxConnector {
    pub fn new(config: InfluxConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BackendConnector for InfluxConnector {
    async fn connect(&self) -> StorageResult<Arc<dyn StorageBackend>> {
        let backend = InfluxBackend::new(&self.config)?;

        let health = backend.health_check().await?;
        if !health.healthy {
            return Err(StorageError::ConnectionFailed(health.message));
        }

        debug!("connected to {}", self.describe());
        Ok(Arc::new(backend))
    }

    fn describe(&self) -> String {
        format!("influxdb {} (database {})", self.config.url, self.config.database)
    }
}

/// A connection to an InfluxDB server
#[derive(Debug, Clone)]
pub struct InfluxBackend {
    client: reqwest::Client,
    base_url: String,
    database: String,
    credentials: Option<(String, String)>,
}

impl InfluxBackend {
    pub fn new(config: &InfluxConfig) -> StorageResult<Self> {
        reqwest::Url::parse(&config.url)
            .map_err(|e| StorageError::InvalidConfig(format!("bad url '{}': {e}", config.url)))?;

        if config.database.is_empty() {
            return Err(StorageError::InvalidConfig(
                "database name must not be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let credentials = config.user.as_ref().map(|user| {
            (
                user.clone(),
                config.password.clone().unwrap_or_default(),
            )
        });

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
            credentials,
        })
    }

    fn query(&self) -> Vec<(&str, &str)> {
        let mut query = vec![("db", self.database.as_str()), ("precision", "s")];
        if let Some((user, password)) = &self.credentials {
            query.push(("u", user.as_str()));
            query.push(("p", password.as_str()));
        }
        query
    }
}

#[async_trait]
impl StorageBackend for InfluxBackend {
    async fn write_points(&self, points: Vec<Point>) -> StorageResult<()> {
        let body = points
            .iter()
            .map(Point::to_line_protocol)
            .collect::<Vec<_>>()
            .join("\n");

        trace!("writing {} point(s) to {}", points.len(), self.base_url);

        let response = self
            .client
            .post(format!("{}/write", self.base_url))
            .query(&self.query())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(StorageError::WriteRejected {
            status: status.as_u16(),
            body,
        })
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let response = self
            .client
            .get(format!("{}/ping", self.base_url))
            .send()
            .await
            .map_err(|e| StorageError::ConnectionFailed(format!("{}: {e}", self.base_url)))?;

        let status = response.status();
        let version = response
            .headers()
            .get("X-Influxdb-Version")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Ok(HealthStatus {
            healthy: status.is_success(),
            message: format!("ping returned {status} (version {version})"),
        })
    }
}
