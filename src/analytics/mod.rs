//! Analytics aggregation.
//!
//! [`AnalyticsAggregator::refresh`] fetches the four analytics slices
//! (summary metrics, top risk pairs, category breakdown, heatmap) and installs
//! their view-models into the [`StateStore`] cache.
//!
//! Slices are independent: a failed fetch leaves that slice's cached value in
//! place and never blocks the others.

mod error;
mod views;

pub use error::{AnalyticsError, AnalyticsSlice};
pub use views::*;

use crate::client::RiskApiClient;
use crate::config::AnalyticsConfig;
use crate::state::{Notice, StateStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one refresh pass.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Slices whose cached value was replaced
    pub refreshed: Vec<AnalyticsSlice>,
    pub errors: Vec<AnalyticsError>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Fetches analytics on demand and keeps the cached view-models current.
pub struct AnalyticsAggregator {
    client: Arc<RiskApiClient>,
    store: Arc<StateStore>,
    config: AnalyticsConfig,
}

impl AnalyticsAggregator {
    pub fn new(client: Arc<RiskApiClient>, store: Arc<StateStore>, config: AnalyticsConfig) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    /// Fetch all four slices concurrently and install whatever succeeded.
    pub async fn refresh(&self) -> RefreshReport {
        let (summary, top_risks, breakdown, heatmap) = tokio::join!(
            self.client.metrics(),
            self.client.top_risks(self.config.top_risks_limit),
            self.client.risk_breakdown(),
            self.client.heatmap(self.config.heatmap_limit),
        );

        let mut report = RefreshReport::default();

        let summary = match summary {
            Ok(metrics) => {
                report.refreshed.push(AnalyticsSlice::Summary);
                Some(Arc::new(metrics))
            }
            Err(source) => {
                report.errors.push(AnalyticsError::Fetch {
                    slice: AnalyticsSlice::Summary,
                    source,
                });
                None
            }
        };

        let top_risks = match top_risks {
            Ok(pairs) => {
                report.refreshed.push(AnalyticsSlice::TopRisks);
                Some(Arc::new(TopRiskView::from_pairs(&pairs)))
            }
            Err(source) => {
                report.errors.push(AnalyticsError::Fetch {
                    slice: AnalyticsSlice::TopRisks,
                    source,
                });
                None
            }
        };

        let breakdown = match breakdown {
            Ok(entries) => {
                report.refreshed.push(AnalyticsSlice::Breakdown);
                Some(Arc::new(entries))
            }
            Err(source) => {
                report.errors.push(AnalyticsError::Fetch {
                    slice: AnalyticsSlice::Breakdown,
                    source,
                });
                None
            }
        };

        // Outer None keeps the cached heatmap; Some(None) marks it unavailable
        let heatmap = match heatmap {
            Ok(data) => match HeatmapView::build(data) {
                Ok(view) => {
                    report.refreshed.push(AnalyticsSlice::Heatmap);
                    Some(Some(Arc::new(view)))
                }
                Err(e) => {
                    report.errors.push(e);
                    Some(None)
                }
            },
            Err(source) => {
                report.errors.push(AnalyticsError::Fetch {
                    slice: AnalyticsSlice::Heatmap,
                    source,
                });
                None
            }
        };

        for error in &report.errors {
            warn!(error = %error, "Analytics slice unavailable");
        }

        let notices: Vec<Notice> = report
            .errors
            .iter()
            .map(|e| Notice::warning(format!("Analytics: {}", e)))
            .collect();
        let any_refreshed = !report.refreshed.is_empty();

        self.store.apply(move |current| {
            let mut next = current.clone();
            let cache = &mut next.analytics;
            if let Some(summary) = summary {
                cache.summary = Some(summary);
            }
            if let Some(top_risks) = top_risks {
                cache.top_risks = Some(top_risks);
            }
            if let Some(breakdown) = breakdown {
                cache.breakdown = Some(breakdown);
            }
            if let Some(heatmap) = heatmap {
                cache.heatmap = heatmap;
            }
            if any_refreshed {
                cache.refreshed_at = Some(Utc::now());
            }
            notices
                .into_iter()
                .fold(next, |snapshot, notice| snapshot.with_notice(notice))
        });

        debug!(
            refreshed = report.refreshed.len(),
            failed = report.errors.len(),
            "Analytics refresh completed"
        );

        report
    }

    /// The currently cached analytics, without fetching.
    pub fn cached(&self) -> AnalyticsCache {
        self.store.snapshot().analytics.clone()
    }
}
