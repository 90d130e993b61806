//! Health command implementation

use crate::cli::{load_config_with_overrides, HealthArgs};
use crate::client::{HealthReport, RiskApiClient};
use crate::view::format_health;

/// Handle `rxwatch health`
///
/// An unreachable or degraded backend is reported, not treated as a failure.
pub async fn handle_health(args: &HealthArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args.connect)?;
    config.validate()?;

    let client = RiskApiClient::new(config.backend)?;
    let report = client.check_health().await;
    format_report(&report, args.json)
}

fn format_report(report: &HealthReport, json: bool) -> Result<String, Box<dyn std::error::Error>> {
    if json {
        Ok(serde_json::to_string_pretty(report)?)
    } else {
        Ok(format_health(report))
    }
}
