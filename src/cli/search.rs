//! Search command implementation

use crate::cli::output::format_search_json;
use crate::cli::{load_config_with_overrides, SearchArgs};
use crate::client::RiskApiClient;
use crate::view::format_search_results;

/// Handle `rxwatch search`
pub async fn handle_search(args: &SearchArgs) -> Result<String, Box<dyn std::error::Error>> {
    let drug = args.drug.trim();
    if drug.is_empty() {
        return Err("Drug name cannot be empty".into());
    }

    let config = load_config_with_overrides(&args.connect)?;
    config.validate()?;

    let client = RiskApiClient::new(config.backend)?;
    let results = client.search(drug).await?;
    tracing::debug!(drug, results = results.len(), "Search completed");

    if args.json {
        return Ok(format_search_json(drug, args.filter, &results)?);
    }
    if results.is_empty() {
        return Ok(format!("No look-alike drugs found for {}", drug));
    }
    Ok(format_search_results(&results, args.filter))
}
