//! Analytics command implementation

use crate::analytics::AnalyticsAggregator;
use crate::cli::output::AnalyticsView;
use crate::cli::{load_config_with_overrides, AnalyticsArgs};
use crate::client::RiskApiClient;
use crate::state::StateStore;
use crate::view::format_analytics;
use std::sync::Arc;

/// Handle `rxwatch analytics`
///
/// Slices that fail to load print as unavailable; the command itself only
/// fails on configuration errors.
pub async fn handle_analytics(args: &AnalyticsArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args.connect)?;
    config.validate()?;

    let client = Arc::new(RiskApiClient::new(config.backend)?);
    let store = Arc::new(StateStore::new());
    let aggregator = AnalyticsAggregator::new(client, store, config.analytics);

    let report = aggregator.refresh().await;
    let cache = aggregator.cached();
    let errors: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();

    if args.json {
        return Ok(serde_json::to_string_pretty(&AnalyticsView::new(&cache, errors))?);
    }

    let mut output = format_analytics(&cache);
    for error in errors {
        output.push_str(&format!("\nwarning: {}", error));
    }
    Ok(output)
}
