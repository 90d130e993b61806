//! Analytics configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Number of ranked pairs requested from `/api/top-risks`
    pub top_risks_limit: usize,
    /// Number of drugs per heatmap axis requested from `/api/heatmap`
    pub heatmap_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_risks_limit: 10,
            heatmap_limit: 15,
        }
    }
}
