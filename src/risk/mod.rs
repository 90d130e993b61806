//! Risk classification.
//!
//! [`RiskCategory::classify`] is the only place a score is compared against a
//! threshold. Filtering, coloring and labels are all derived from it.

use crate::client::SearchResult;
use colored::{Color, ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Lower bound (inclusive) of the critical band
const CRITICAL_FLOOR: f64 = 75.0;
/// Lower bound (inclusive) of the high band
const HIGH_FLOOR: f64 = 50.0;
/// Lower bound (inclusive) of the medium band
const MEDIUM_FLOOR: f64 = 25.0;

/// Heatmap cells strictly above this value are annotated.
pub const ANNOTATION_THRESHOLD: f64 = 70.0;

/// Confusion-risk bucket for a combined risk percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskCategory {
    /// All categories, most severe first.
    pub const ALL: [RiskCategory; 4] = [
        RiskCategory::Critical,
        RiskCategory::High,
        RiskCategory::Medium,
        RiskCategory::Low,
    ];

    /// Classify a score. Total over `f64`: NaN falls through to `Low`.
    pub fn classify(score: f64) -> Self {
        if score >= CRITICAL_FLOOR {
            RiskCategory::Critical
        } else if score >= HIGH_FLOOR {
            RiskCategory::High
        } else if score >= MEDIUM_FLOOR {
            RiskCategory::Medium
        } else {
            RiskCategory::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Critical => "critical",
            RiskCategory::High => "high",
            RiskCategory::Medium => "medium",
            RiskCategory::Low => "low",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::Critical => "Critical",
            RiskCategory::High => "High",
            RiskCategory::Medium => "Medium",
            RiskCategory::Low => "Low",
        }
    }

    /// Terminal color for this category.
    pub fn color(&self) -> Color {
        match self {
            RiskCategory::Critical => Color::Red,
            RiskCategory::High => Color::Yellow,
            RiskCategory::Medium => Color::Blue,
            RiskCategory::Low => Color::Green,
        }
    }

    /// Paint `text` in this category's color.
    pub fn paint(&self, text: &str) -> ColoredString {
        let painted = text.color(self.color());
        match self {
            RiskCategory::Critical => painted.bold(),
            _ => painted,
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RiskCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(RiskCategory::Critical),
            "high" => Ok(RiskCategory::High),
            "medium" => Ok(RiskCategory::Medium),
            "low" => Ok(RiskCategory::Low),
            _ => Err(format!("Invalid risk category: {}", s)),
        }
    }
}

/// Category selector used to filter search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(RiskCategory),
}

impl CategoryFilter {
    pub fn matches(&self, category: RiskCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(selected) => *selected == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("All"),
            CategoryFilter::Only(category) => write!(f, "{}", category),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse::<RiskCategory>()
            .map(CategoryFilter::Only)
            .map_err(|_| format!("Invalid filter: {} (expected all, critical, high, medium, low)", s))
    }
}

impl From<RiskCategory> for CategoryFilter {
    fn from(category: RiskCategory) -> Self {
        CategoryFilter::Only(category)
    }
}

/// Select the results whose combined risk falls in `selector`.
///
/// `All` hands back the input slice itself. Otherwise the matching results are
/// copied out in their original order.
pub fn filter_results(results: &[SearchResult], selector: CategoryFilter) -> Cow<'_, [SearchResult]> {
    match selector {
        CategoryFilter::All => Cow::Borrowed(results),
        CategoryFilter::Only(_) => Cow::Owned(
            results
                .iter()
                .filter(|r| selector.matches(r.risk_category()))
                .cloned()
                .collect(),
        ),
    }
}

/// Format a percentage score for display (one decimal place).
pub fn format_percentage(score: f64) -> String {
    format!("{:.1}%", score)
}
