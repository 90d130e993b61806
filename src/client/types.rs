//! Wire types for the confusion-risk backend API.
//!
//! These mirror the JSON payloads served by the backend. Scores are percentages
//! in `[0, 100]`; they are passed through as received and never clamped here.

use crate::risk::RiskCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recent search reported by the backend metrics feed.
///
/// Every field tolerates being absent or malformed so one bad entry never
/// costs the whole metrics update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchEvent {
    /// When the search was recorded; `None` if missing or unparseable
    #[serde(default, with = "timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Drug name that was searched
    #[serde(default = "unknown_drug")]
    pub drug_name: String,
    /// Number of look-alike drugs returned
    #[serde(default)]
    pub similar_drugs_found: u32,
    /// Highest combined risk among the returned drugs
    #[serde(default)]
    pub highest_risk: f64,
}

fn unknown_drug() -> String {
    "Unknown".to_string()
}

/// Aggregate service metrics, delivered by `GET /api/metrics` and the push channel.
///
/// Instances are never mutated after construction; every update installs a
/// fresh snapshot. Missing counters read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSnapshot {
    pub total_drugs: u64,
    pub critical_risk_pairs: u64,
    pub high_risk_pairs: u64,
    pub avg_risk_score: f64,
    pub connected_clients: u64,
    /// Newest first, unbounded. Entries that do not parse are skipped.
    #[serde(deserialize_with = "recent_searches")]
    pub recent_searches: Vec<SearchEvent>,
}

fn recent_searches<'de, D>(deserializer: D) -> Result<Vec<SearchEvent>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let entries = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(entries) => entries,
        _ => return Ok(Vec::new()),
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

impl MetricsSnapshot {
    /// Number of recent searches shown on the dashboard.
    pub const RECENT_SEARCHES_SHOWN: usize = 5;

    /// The newest searches, truncated for display.
    pub fn recent_searches_shown(&self) -> &[SearchEvent] {
        let end = self.recent_searches.len().min(Self::RECENT_SEARCHES_SHOWN);
        &self.recent_searches[..end]
    }
}

/// The drug a search result points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDrug {
    pub brand_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic_name: Option<String>,
}

impl TargetDrug {
    /// "Brand (generic)" when a generic name is known, otherwise just the brand.
    pub fn display_name(&self) -> String {
        match &self.generic_name {
            Some(generic) if !generic.is_empty() => format!("{} ({})", self.brand_name, generic),
            _ => self.brand_name.clone(),
        }
    }
}

/// A look-alike drug returned for a search, with its similarity metrics.
///
/// The risk category is always derived from `combined_risk` and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub target_drug: TargetDrug,
    pub spelling_similarity: f64,
    pub phonetic_similarity: f64,
    pub therapeutic_context_risk: f64,
    pub combined_risk: f64,
}

impl SearchResult {
    pub fn risk_category(&self) -> RiskCategory {
        RiskCategory::classify(self.combined_risk)
    }
}

/// `GET /api/search/{drug_name}` response body
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub similar_drugs: Vec<SearchResult>,
}

/// A ranked pair of confusable drugs. Rank order is defined by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRiskPair {
    pub drug1: String,
    pub drug2: String,
    pub risk_score: f64,
}

/// Count of drug pairs in one risk category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub category: String,
    pub count: u64,
}

/// Raw pairwise risk matrix. Row `i`, column `j` corresponds to
/// `drug_names[i]`, `drug_names[j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapData {
    pub drug_names: Vec<String>,
    pub risk_matrix: Vec<Vec<f64>>,
}

/// `GET /health` response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub metrics: HealthMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthMetrics {
    #[serde(default)]
    pub drugs_in_database: u64,
    #[serde(default)]
    pub total_analyses: u64,
}

/// Timestamps arrive either as RFC 3339 or as naive ISO 8601 (assumed UTC).
/// Anything else, including blanks and non-strings, reads as `None`.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(raw.as_str().and_then(parse))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_metrics_snapshot_parses_backend_payload() {
        let json = serde_json::json!({
            "total_drugs": 1200,
            "critical_risk_pairs": 14,
            "high_risk_pairs": 87,
            "avg_risk_score": 31.5,
            "connected_clients": 3,
            "recent_searches": [
                {
                    "timestamp": "2024-05-01T10:15:30.123456",
                    "drug_name": "metformin",
                    "similar_drugs_found": 3,
                    "highest_risk": 82.0
                }
            ]
        });

        let snapshot: MetricsSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(snapshot.total_drugs, 1200);
        assert_eq!(snapshot.recent_searches.len(), 1);
        assert_eq!(snapshot.recent_searches[0].timestamp.unwrap().hour(), 10);
    }

    #[test]
    fn test_metrics_snapshot_optional_fields_default() {
        let json = serde_json::json!({
            "total_drugs": 0,
            "critical_risk_pairs": 0,
            "high_risk_pairs": 0,
            "avg_risk_score": 0.0
        });

        let snapshot: MetricsSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(snapshot.connected_clients, 0);
        assert!(snapshot.recent_searches.is_empty());
    }

    #[test]
    fn test_recent_searches_truncated_to_five() {
        let event = SearchEvent {
            timestamp: Some(Utc::now()),
            drug_name: "x".to_string(),
            similar_drugs_found: 1,
            highest_risk: 10.0,
        };
        let snapshot = MetricsSnapshot {
            total_drugs: 1,
            critical_risk_pairs: 0,
            high_risk_pairs: 0,
            avg_risk_score: 0.0,
            connected_clients: 0,
            recent_searches: vec![event; 9],
        };

        assert_eq!(snapshot.recent_searches_shown().len(), 5);
        assert_eq!(snapshot.recent_searches.len(), 9);
    }

    #[test]
    fn test_bad_recent_search_entries_tolerated() {
        let json = serde_json::json!({
            "total_drugs": 40,
            "recent_searches": [
                {"timestamp": "", "drug_name": "clonidine", "similar_drugs_found": 2, "highest_risk": 55.0},
                {"drug_name": "lamictal"},
                {"timestamp": "last tuesday", "highest_risk": 12.5},
                "not an object",
                {"timestamp": "2024-05-01 10:15:30", "drug_name": "metformin"}
            ]
        });

        let snapshot: MetricsSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(snapshot.total_drugs, 40);
        assert_eq!(snapshot.critical_risk_pairs, 0);

        let names: Vec<_> = snapshot
            .recent_searches
            .iter()
            .map(|e| e.drug_name.as_str())
            .collect();
        assert_eq!(names, vec!["clonidine", "lamictal", "Unknown", "metformin"]);
        let parsed: Vec<_> = snapshot
            .recent_searches
            .iter()
            .map(|e| e.timestamp.is_some())
            .collect();
        assert_eq!(parsed, vec![false, false, false, true]);
    }

    #[test]
    fn test_missing_drug_name_reads_unknown() {
        let event: SearchEvent = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(event.drug_name, "Unknown");
        assert_eq!(event.similar_drugs_found, 0);
    }

    #[test]
    fn test_timestamp_accepts_rfc3339_and_naive() {
        let rfc = timestamp::parse("2024-05-01T10:15:30+02:00").unwrap();
        assert_eq!(rfc.hour(), 8);

        let naive = timestamp::parse("2024-05-01 10:15:30").unwrap();
        assert_eq!(naive.day(), 1);

        assert!(timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn test_target_drug_display_name() {
        let with_generic = TargetDrug {
            brand_name: "Glucophage".to_string(),
            generic_name: Some("metformin".to_string()),
        };
        assert_eq!(with_generic.display_name(), "Glucophage (metformin)");

        let brand_only = TargetDrug {
            brand_name: "Metaglip".to_string(),
            generic_name: None,
        };
        assert_eq!(brand_only.display_name(), "Metaglip");
    }

    #[test]
    fn test_search_response_ignores_extra_fields() {
        let json = serde_json::json!({
            "query": "metformin",
            "similar_drugs": [{
                "target_drug": {"brand_name": "Metronidazole"},
                "spelling_similarity": 70.0,
                "phonetic_similarity": 65.0,
                "therapeutic_context_risk": 20.0,
                "combined_risk": 60.0,
                "risk_category": "high"
            }]
        });

        let response: SearchResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.similar_drugs.len(), 1);
        assert_eq!(response.similar_drugs[0].risk_category(), RiskCategory::High);
    }
}
