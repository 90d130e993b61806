//! Renderable view-models built from raw analytics payloads.

use super::error::AnalyticsError;
use crate::client::{HeatmapData, MetricsSnapshot, RiskBreakdown, TopRiskPair};
use crate::risk::{format_percentage, RiskCategory, ANNOTATION_THRESHOLD};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Last successfully fetched value of each analytics slice.
///
/// `None` means "no data available": never fetched, or the last payload was
/// unusable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsCache {
    pub summary: Option<Arc<MetricsSnapshot>>,
    pub top_risks: Option<Arc<Vec<TopRiskView>>>,
    pub breakdown: Option<Arc<Vec<RiskBreakdown>>>,
    pub heatmap: Option<Arc<HeatmapView>>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// One row of the top-risks table. Rank follows the backend's ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopRiskView {
    /// 1-based position in the backend's ranking
    pub rank: usize,
    pub label: String,
    pub score: f64,
    pub percentage: String,
    pub category: RiskCategory,
}

impl TopRiskView {
    /// Format pairs for display without reordering them.
    pub fn from_pairs(pairs: &[TopRiskPair]) -> Vec<TopRiskView> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| TopRiskView {
                rank: i + 1,
                label: format!("{} ↔ {}", pair.drug1, pair.drug2),
                score: pair.risk_score,
                percentage: format_percentage(pair.risk_score),
                category: RiskCategory::classify(pair.risk_score),
            })
            .collect()
    }
}

/// A breakdown category with its share of the total count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownShare {
    pub category: String,
    pub count: u64,
    /// Percentage of the summed counts, 0.0 when the total is zero
    pub percentage: f64,
}

/// Normalize raw breakdown counts into percentage shares.
///
/// Computed at render time so shares stay consistent with whatever counts are
/// currently cached.
pub fn breakdown_shares(breakdown: &[RiskBreakdown]) -> Vec<BreakdownShare> {
    let total: u64 = breakdown.iter().map(|b| b.count).sum();
    breakdown
        .iter()
        .map(|b| BreakdownShare {
            category: b.category.clone(),
            count: b.count,
            percentage: if total == 0 {
                0.0
            } else {
                b.count as f64 * 100.0 / total as f64
            },
        })
        .collect()
}

/// Label overlay for a heatmap cell above the annotation threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HeatmapAnnotation {
    pub row: usize,
    pub col: usize,
    /// Cell value rounded to the nearest integer
    pub label: i64,
}

/// Validated square risk matrix with its annotation set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapView {
    pub drug_names: Vec<String>,
    pub matrix: Vec<Vec<f64>>,
    /// Row-major order
    pub annotations: Vec<HeatmapAnnotation>,
}

impl HeatmapView {
    /// Validate `data` and compute annotations.
    ///
    /// Every cell strictly above [`ANNOTATION_THRESHOLD`] is annotated at its
    /// own position; `(i, j)` and `(j, i)` are independent.
    pub fn build(data: HeatmapData) -> Result<Self, AnalyticsError> {
        let n = data.drug_names.len();
        if data.risk_matrix.len() != n {
            return Err(AnalyticsError::HeatmapShape {
                expected: n,
                row: None,
                found: data.risk_matrix.len(),
            });
        }
        if let Some((i, row)) = data
            .risk_matrix
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != n)
        {
            return Err(AnalyticsError::HeatmapShape {
                expected: n,
                row: Some(i),
                found: row.len(),
            });
        }

        let annotations = data
            .risk_matrix
            .iter()
            .enumerate()
            .flat_map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, value)| **value > ANNOTATION_THRESHOLD)
                    .map(move |(j, value)| HeatmapAnnotation {
                        row: i,
                        col: j,
                        label: value.round() as i64,
                    })
            })
            .collect();

        Ok(Self {
            drug_names: data.drug_names,
            matrix: data.risk_matrix,
            annotations,
        })
    }

    pub fn dimension(&self) -> usize {
        self.drug_names.len()
    }

    pub fn category_at(&self, row: usize, col: usize) -> Option<RiskCategory> {
        self.matrix
            .get(row)
            .and_then(|r| r.get(col))
            .map(|value| RiskCategory::classify(*value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heatmap(names: &[&str], matrix: Vec<Vec<f64>>) -> HeatmapData {
        HeatmapData {
            drug_names: names.iter().map(|s| s.to_string()).collect(),
            risk_matrix: matrix,
        }
    }

    #[test]
    fn test_top_risks_preserve_backend_order() {
        let pairs = vec![
            TopRiskPair {
                drug1: "Celebrex".to_string(),
                drug2: "Cerebyx".to_string(),
                risk_score: 64.0,
            },
            TopRiskPair {
                drug1: "Hydroxyzine".to_string(),
                drug2: "Hydralazine".to_string(),
                risk_score: 91.25,
            },
        ];

        let views = TopRiskView::from_pairs(&pairs);
        assert_eq!(views[0].rank, 1);
        assert_eq!(views[0].label, "Celebrex ↔ Cerebyx");
        assert_eq!(views[0].category, RiskCategory::High);
        assert_eq!(views[1].percentage, "91.2%");
        assert_eq!(views[1].category, RiskCategory::Critical);
    }

    #[test]
    fn test_breakdown_shares() {
        let breakdown = vec![
            RiskBreakdown {
                category: "critical".to_string(),
                count: 1,
            },
            RiskBreakdown {
                category: "low".to_string(),
                count: 3,
            },
        ];

        let shares = breakdown_shares(&breakdown);
        assert_eq!(shares[0].percentage, 25.0);
        assert_eq!(shares[1].percentage, 75.0);
    }

    #[test]
    fn test_breakdown_shares_zero_total() {
        let breakdown = vec![RiskBreakdown {
            category: "high".to_string(),
            count: 0,
        }];
        assert_eq!(breakdown_shares(&breakdown)[0].percentage, 0.0);
        assert!(breakdown_shares(&[]).is_empty());
    }

    #[test]
    fn test_heatmap_annotations_symmetric_pair() {
        let view = HeatmapView::build(heatmap(
            &["A", "B", "C"],
            vec![
                vec![0.0, 80.0, 10.0],
                vec![80.0, 0.0, 30.0],
                vec![10.0, 30.0, 0.0],
            ],
        ))
        .unwrap();

        let positions: Vec<_> = view.annotations.iter().map(|a| (a.row, a.col)).collect();
        assert_eq!(positions, vec![(0, 1), (1, 0)]);
        assert!(view.annotations.iter().all(|a| a.label == 80));
    }

    #[test]
    fn test_heatmap_threshold_is_strict() {
        let view = HeatmapView::build(heatmap(
            &["A", "B"],
            vec![vec![70.0, 70.4], vec![69.9, 100.0]],
        ))
        .unwrap();

        let annotated: Vec<_> = view
            .annotations
            .iter()
            .map(|a| (a.row, a.col, a.label))
            .collect();
        assert_eq!(annotated, vec![(0, 1, 70), (1, 1, 100)]);
    }

    #[test]
    fn test_heatmap_asymmetric_matrix() {
        let view = HeatmapView::build(heatmap(
            &["A", "B"],
            vec![vec![0.0, 95.0], vec![20.0, 0.0]],
        ))
        .unwrap();

        assert_eq!(view.annotations.len(), 1);
        assert_eq!((view.annotations[0].row, view.annotations[0].col), (0, 1));
    }

    #[test]
    fn test_heatmap_wrong_row_count_rejected() {
        let result = HeatmapView::build(heatmap(&["A", "B", "C"], vec![vec![0.0; 3]; 2]));
        assert!(matches!(
            result,
            Err(AnalyticsError::HeatmapShape {
                expected: 3,
                row: None,
                found: 2
            })
        ));
    }

    #[test]
    fn test_heatmap_ragged_row_rejected() {
        let result = HeatmapView::build(heatmap(
            &["A", "B"],
            vec![vec![0.0, 1.0], vec![1.0]],
        ));
        assert!(matches!(
            result,
            Err(AnalyticsError::HeatmapShape { row: Some(1), .. })
        ));
    }

    #[test]
    fn test_heatmap_empty_is_valid() {
        let view = HeatmapView::build(heatmap(&[], vec![])).unwrap();
        assert_eq!(view.dimension(), 0);
        assert!(view.annotations.is_empty());
    }

    #[test]
    fn test_heatmap_category_at() {
        let view = HeatmapView::build(heatmap(&["A"], vec![vec![55.0]])).unwrap();
        assert_eq!(view.category_at(0, 0), Some(RiskCategory::High));
        assert_eq!(view.category_at(1, 0), None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn square_matrix() -> impl Strategy<Value = Vec<Vec<f64>>> {
            (0usize..8).prop_flat_map(|n| {
                proptest::collection::vec(proptest::collection::vec(0.0f64..100.0, n), n)
            })
        }

        proptest! {
            /// The annotation set is exactly the cells strictly above the threshold.
            #[test]
            fn prop_annotations_match_threshold(matrix in square_matrix()) {
                let names: Vec<String> = (0..matrix.len()).map(|i| format!("d{}", i)).collect();
                let view = HeatmapView::build(HeatmapData {
                    drug_names: names,
                    risk_matrix: matrix.clone(),
                }).unwrap();

                let mut expected = vec![];
                for (i, row) in matrix.iter().enumerate() {
                    for (j, value) in row.iter().enumerate() {
                        if *value > 70.0 {
                            expected.push((i, j));
                        }
                    }
                }
                let actual: Vec<_> = view.annotations.iter().map(|a| (a.row, a.col)).collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
