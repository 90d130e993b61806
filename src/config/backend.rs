//! Risk backend connection configuration

use serde::{Deserialize, Serialize};

/// Where the risk backend lives and how long each kind of call may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the risk service (e.g. `http://localhost:8000`)
    pub base_url: String,
    /// Timeout for drug searches
    pub search_timeout_seconds: u64,
    /// Timeout for `/health` checks
    pub health_timeout_seconds: u64,
    /// Timeout for each analytics fetch (metrics, top risks, breakdown, heatmap)
    pub analytics_timeout_seconds: u64,
    /// Timeout for the seed-database trigger
    pub seed_timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            search_timeout_seconds: 30,
            health_timeout_seconds: 5,
            analytics_timeout_seconds: 10,
            seed_timeout_seconds: 60,
        }
    }
}
