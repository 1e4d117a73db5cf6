//! Push-style health reporting.
//!
//! Once per cycle the daemon tells an external monitor whether the cycle
//! completed (`up`) or aborted (`down`). Reporting never fails the cycle.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::UptimeConfig;

/// Timeout for a single monitor call.
const REPORT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Up,
    Down,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Up => "up",
            HealthStatus::Down => "down",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum HealthError {
    #[error("Monitor request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Monitor responded with HTTP {0}")]
    Status(u16),
}

/// Receives one status per cycle. Implementations swallow their own errors.
#[async_trait(?Send)]
pub trait HealthReporter {
    async fn report(&self, status: HealthStatus);
}

/// Reports to a push endpoint as `GET {endpoint}?status=up|down`.
pub struct UptimeReporter {
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl UptimeReporter {
    pub fn from_config(config: &UptimeConfig) -> Self {
        let endpoint = config.endpoint.clone().filter(|_| config.monitor);
        Self::new(endpoint)
    }

    /// `None` disables reporting.
    pub fn new(endpoint: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REPORT_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self { endpoint, client }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    async fn send(&self, endpoint: &str, status: HealthStatus) -> Result<(), HealthError> {
        let response = self
            .client
            .get(endpoint)
            .query(&[("status", status.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HealthError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl HealthReporter for UptimeReporter {
    async fn report(&self, status: HealthStatus) {
        let Some(endpoint) = self.endpoint.as_deref() else {
            return;
        };

        match self.send(endpoint, status).await {
            Ok(()) => debug!("Reported status {}", status),
            Err(e) => warn!("Failed to report status {}: {}", status, e),
        }
    }
}
