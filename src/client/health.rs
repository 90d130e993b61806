//! Tiered backend health reporting.

use super::error::ClientError;
use super::types::HealthResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse health of the risk backend as seen from the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTier {
    /// Backend answered and reported `"healthy"`
    Healthy,
    /// Backend answered, but with another status or an error code
    Degraded,
    /// Backend could not be reached or timed out
    Unreachable,
}

impl HealthTier {
    pub fn label(&self) -> &'static str {
        match self {
            HealthTier::Healthy => "Healthy",
            HealthTier::Degraded => "Degraded",
            HealthTier::Unreachable => "Unreachable",
        }
    }
}

/// Result of one `GET /health` check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub tier: HealthTier,
    /// Status string reported by the backend, if it answered
    pub status: Option<String>,
    pub drugs_in_database: u64,
    pub total_analyses: u64,
    pub checked_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl HealthReport {
    /// Build a report from the outcome of a health call.
    pub fn from_outcome(outcome: Result<HealthResponse, ClientError>) -> Self {
        let checked_at = Utc::now();
        match outcome {
            Ok(response) => {
                let tier = if response.status.eq_ignore_ascii_case("healthy") {
                    HealthTier::Healthy
                } else {
                    HealthTier::Degraded
                };
                Self {
                    tier,
                    status: Some(response.status),
                    drugs_in_database: response.metrics.drugs_in_database,
                    total_analyses: response.metrics.total_analyses,
                    checked_at,
                    error: None,
                }
            }
            Err(error) => {
                let tier = if error.is_unreachable() {
                    HealthTier::Unreachable
                } else {
                    HealthTier::Degraded
                };
                Self {
                    tier,
                    status: None,
                    drugs_in_database: 0,
                    total_analyses: 0,
                    checked_at,
                    error: Some(error.to_string()),
                }
            }
        }
    }
}
