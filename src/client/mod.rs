//! HTTP client for the confusion-risk backend.
//!
//! Every request/response endpoint the console consumes goes through
//! [`RiskApiClient`]. Each call carries its own timeout; none are cancellable
//! once issued.
//!
//! ## Endpoints
//!
//! - `GET /api/search/{drug_name}` - look-alike drugs for a name
//! - `POST /api/seed-database` - load the sample drug set
//! - `GET /api/metrics` - summary metrics
//! - `GET /api/top-risks?limit=N` - ranked risky pairs
//! - `GET /api/risk-breakdown` - pair counts per category
//! - `GET /api/heatmap?limit=N` - pairwise risk matrix
//! - `GET /health` - service health

mod error;
mod health;
pub mod types;

pub use error::ClientError;
pub use health::{HealthReport, HealthTier};
pub use types::*;

use crate::config::BackendConfig;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Typed access to the risk backend's request/response API.
#[derive(Debug, Clone)]
pub struct RiskApiClient {
    client: Client,
    base_url: Url,
    config: BackendConfig,
}

impl RiskApiClient {
    /// Create a client with a pooled HTTP connection.
    pub fn new(config: BackendConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        Self::with_client(config, client)
    }

    /// Create a client around an existing HTTP client (shared pools, tests).
    pub fn with_client(config: BackendConfig, client: Client) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidRequest(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidRequest(format!(
                "{} cannot be used as a base URL",
                config.base_url
            )));
        }
        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Resolve a path below the configured base URL.
    ///
    /// Segments are pushed individually so each one is percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ClientError::InvalidRequest(format!("{} cannot be a base", self.base_url))
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// `GET /api/search/{drug_name}`
    pub async fn search(&self, drug_name: &str) -> Result<Vec<SearchResult>, ClientError> {
        let url = self.endpoint(&["api", "search", drug_name])?;
        let timeout = Duration::from_secs(self.config.search_timeout_seconds);
        let response: SearchResponse = self.send_json(self.client.get(url), timeout).await?;
        Ok(response.similar_drugs)
    }

    /// `POST /api/seed-database`. Only success or failure is reported.
    pub async fn seed_database(&self) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "seed-database"])?;
        let timeout = Duration::from_secs(self.config.seed_timeout_seconds);
        self.send(self.client.post(url), timeout).await?;
        Ok(())
    }

    /// `GET /api/metrics`
    pub async fn metrics(&self) -> Result<MetricsSnapshot, ClientError> {
        let url = self.endpoint(&["api", "metrics"])?;
        self.send_json(self.client.get(url), self.analytics_timeout()).await
    }

    /// `GET /api/top-risks?limit=N`
    pub async fn top_risks(&self, limit: usize) -> Result<Vec<TopRiskPair>, ClientError> {
        let mut url = self.endpoint(&["api", "top-risks"])?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        self.send_json(self.client.get(url), self.analytics_timeout()).await
    }

    /// `GET /api/risk-breakdown`
    pub async fn risk_breakdown(&self) -> Result<Vec<RiskBreakdown>, ClientError> {
        let url = self.endpoint(&["api", "risk-breakdown"])?;
        self.send_json(self.client.get(url), self.analytics_timeout()).await
    }

    /// `GET /api/heatmap?limit=N`
    pub async fn heatmap(&self, limit: usize) -> Result<HeatmapData, ClientError> {
        let mut url = self.endpoint(&["api", "heatmap"])?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        self.send_json(self.client.get(url), self.analytics_timeout()).await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = self.endpoint(&["health"])?;
        let timeout = Duration::from_secs(self.config.health_timeout_seconds);
        self.send_json(self.client.get(url), timeout).await
    }

    /// Call `/health` and fold the outcome into a tiered report.
    pub async fn check_health(&self) -> HealthReport {
        HealthReport::from_outcome(self.health().await)
    }

    fn analytics_timeout(&self) -> Duration {
        Duration::from_secs(self.config.analytics_timeout_seconds)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<reqwest::Response, ClientError> {
        let timeout_ms = timeout.as_millis() as u64;
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::debug!(status = status.as_u16(), "Backend returned error status");
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<T, ClientError> {
        let timeout_ms = timeout.as_millis() as u64;
        let response = self.send(request, timeout).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(e, timeout_ms))?;
        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}
