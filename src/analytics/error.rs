//! Error types for analytics aggregation.

use crate::client::ClientError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// Fetching a slice from the backend failed.
    #[error("{slice} fetch failed: {source}")]
    Fetch {
        slice: AnalyticsSlice,
        #[source]
        source: ClientError,
    },

    /// Heatmap matrix is not N×N for N drug names.
    #[error("heatmap is not square: expected {expected} entries{}, found {found}", row_suffix(.row))]
    HeatmapShape {
        expected: usize,
        /// Offending row, or `None` when the row count itself is wrong
        row: Option<usize>,
        found: usize,
    },
}

fn row_suffix(row: &Option<usize>) -> String {
    row.map(|r| format!(" in row {}", r)).unwrap_or_default()
}

/// The independently refreshed analytics slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticsSlice {
    Summary,
    TopRisks,
    Breakdown,
    Heatmap,
}

impl std::fmt::Display for AnalyticsSlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AnalyticsSlice::Summary => "metrics",
            AnalyticsSlice::TopRisks => "top risks",
            AnalyticsSlice::Breakdown => "risk breakdown",
            AnalyticsSlice::Heatmap => "heatmap",
        };
        f.write_str(name)
    }
}
