//! Output formatting helpers for CLI commands

use crate::analytics::{breakdown_shares, AnalyticsCache, BreakdownShare, HeatmapView, TopRiskView};
use crate::client::{MetricsSnapshot, SearchResult};
use crate::risk::{filter_results, CategoryFilter, RiskCategory};
use serde::Serialize;
use serde_json::json;

/// View model for one search result, with its derived category
#[derive(Debug, Clone, Serialize)]
pub struct SearchResultView {
    pub brand_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic_name: Option<String>,
    pub spelling_similarity: f64,
    pub phonetic_similarity: f64,
    pub therapeutic_context_risk: f64,
    pub combined_risk: f64,
    pub risk_category: RiskCategory,
}

impl From<&SearchResult> for SearchResultView {
    fn from(result: &SearchResult) -> Self {
        Self {
            brand_name: result.target_drug.brand_name.clone(),
            generic_name: result.target_drug.generic_name.clone(),
            spelling_similarity: result.spelling_similarity,
            phonetic_similarity: result.phonetic_similarity,
            therapeutic_context_risk: result.therapeutic_context_risk,
            combined_risk: result.combined_risk,
            risk_category: result.risk_category(),
        }
    }
}

/// Format search results as JSON; `total` counts results before filtering
pub fn format_search_json(
    drug: &str,
    filter: CategoryFilter,
    results: &[SearchResult],
) -> Result<String, serde_json::Error> {
    let views: Vec<SearchResultView> = filter_results(results, filter)
        .iter()
        .map(SearchResultView::from)
        .collect();
    serde_json::to_string_pretty(&json!({
        "drug": drug,
        "filter": filter.to_string().to_lowercase(),
        "total": results.len(),
        "results": views,
    }))
}

/// Serializable form of the analytics cache
#[derive(Debug, Serialize)]
pub struct AnalyticsView<'a> {
    pub summary: Option<&'a MetricsSnapshot>,
    pub top_risks: Option<&'a [TopRiskView]>,
    pub breakdown: Option<Vec<BreakdownShare>>,
    pub heatmap: Option<&'a HeatmapView>,
    pub errors: Vec<String>,
}

impl<'a> AnalyticsView<'a> {
    pub fn new(cache: &'a AnalyticsCache, errors: Vec<String>) -> Self {
        Self {
            summary: cache.summary.as_deref(),
            top_risks: cache.top_risks.as_ref().map(|v| v.as_slice()),
            breakdown: cache.breakdown.as_ref().map(|b| breakdown_shares(b)),
            heatmap: cache.heatmap.as_deref(),
            errors,
        }
    }
}
