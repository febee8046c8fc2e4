//! Summary statistics over the extraction history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::config::AnalyticsConfig;
use crate::models::result::ExtractionResult;

/// Series shown on the dashboard charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// Number of documents per type name.
    pub document_types: BTreeMap<String, usize>,

    /// Processing time of every document, in history order.
    pub processing_times: Vec<f64>,

    /// Completion date (`YYYY-MM-DD`) of every document, in history order.
    pub dates: Vec<String>,
}

/// Aggregate metrics derived from the full history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub total_documents: usize,

    /// Mean processing time in seconds, 2 decimals.
    pub average_processing_time: f64,

    /// Minutes saved compared to manual processing, 2 decimals.
    pub time_saved: f64,

    /// Percentage of manual time saved per document, 1 decimal.
    pub efficiency_gain: f64,

    /// Projected documents per month at the current daily volume.
    pub monthly_impact: u64,

    /// Reported error reduction percentage.
    pub error_reduction: f64,

    pub chart_data: ChartData,
}

impl AnalyticsSnapshot {
    /// Snapshot of an empty history.
    pub fn empty(config: &AnalyticsConfig) -> Self {
        Self {
            total_documents: 0,
            average_processing_time: 0.0,
            time_saved: 0.0,
            efficiency_gain: 0.0,
            monthly_impact: 0,
            error_reduction: config.error_reduction_percent,
            chart_data: ChartData::default(),
        }
    }

    /// Compute the snapshot for `history`.
    ///
    /// Derived values use the unrounded average; rounding is applied only to
    /// the reported numbers.
    pub fn compute(history: &[ExtractionResult], config: &AnalyticsConfig) -> Self {
        if history.is_empty() {
            return Self::empty(config);
        }

        let total = history.len();
        let average = history.iter().map(|r| r.processing_time).sum::<f64>() / total as f64;

        let manual = config.manual_minutes_per_document;
        let saved_per_document = manual - average / 60.0;
        let efficiency = if manual > 0.0 {
            saved_per_document / manual * 100.0
        } else {
            0.0
        };

        let mut chart_data = ChartData {
            processing_times: Vec::with_capacity(total),
            dates: Vec::with_capacity(total),
            ..Default::default()
        };
        for result in history {
            *chart_data
                .document_types
                .entry(result.document_type().to_string())
                .or_insert(0) += 1;
            chart_data.processing_times.push(result.processing_time);
            chart_data.dates.push(result.date_key());
        }

        Self {
            total_documents: total,
            average_processing_time: round_to(average, 2),
            time_saved: round_to(saved_per_document * total as f64, 2),
            efficiency_gain: round_to(efficiency, 1),
            monthly_impact: total as u64 * config.days_per_month,
            error_reduction: config.error_reduction_percent,
            chart_data,
        }
    }
}

/// Round half to even at `decimals` places.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::result::{DocumentType, ExtractedFields};
    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;

    fn result(doc_type: DocumentType, seconds: f64, timestamp: &str) -> ExtractionResult {
        ExtractionResult {
            fields: ExtractedFields {
                document_type: doc_type,
                ..Default::default()
            },
            processing_time: seconds,
            timestamp: NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").unwrap(),
            file_name: "doc.png".to_string(),
            ocr_engine: None,
        }
    }

    fn history() -> Vec<ExtractionResult> {
        vec![
            result(DocumentType::Invoice, 0.5, "2024-12-14 09:00:00"),
            result(DocumentType::Receipt, 1.0, "2024-12-15 10:30:00"),
            result(DocumentType::Invoice, 1.5, "2024-12-15 23:59:59"),
        ]
    }

    #[test]
    fn test_empty_history() {
        let snapshot = AnalyticsSnapshot::compute(&[], &AnalyticsConfig::default());

        assert_eq!(snapshot.total_documents, 0);
        assert_eq!(snapshot.average_processing_time, 0.0);
        assert_eq!(snapshot.time_saved, 0.0);
        assert_eq!(snapshot.efficiency_gain, 0.0);
        assert_eq!(snapshot.monthly_impact, 0);
        assert_eq!(snapshot.error_reduction, 85.0);
        assert_eq!(snapshot.chart_data, ChartData::default());
    }

    #[test]
    fn test_known_history() {
        let snapshot = AnalyticsSnapshot::compute(&history(), &AnalyticsConfig::default());

        assert_eq!(snapshot.total_documents, 3);
        assert_eq!(snapshot.average_processing_time, 1.0);
        // (5 - 1/60) * 3
        assert_eq!(snapshot.time_saved, 14.95);
        assert_eq!(snapshot.efficiency_gain, 99.7);
        assert_eq!(snapshot.monthly_impact, 90);
        assert_eq!(snapshot.error_reduction, 85.0);
    }

    #[test]
    fn test_chart_data() {
        let snapshot = AnalyticsSnapshot::compute(&history(), &AnalyticsConfig::default());
        let chart = snapshot.chart_data;

        assert_eq!(chart.document_types.get("Invoice"), Some(&2));
        assert_eq!(chart.document_types.get("Receipt"), Some(&1));
        assert_eq!(chart.document_types.values().sum::<usize>(), 3);
        assert_eq!(chart.processing_times, vec![0.5, 1.0, 1.5]);
        assert_eq!(chart.dates, vec!["2024-12-14", "2024-12-15", "2024-12-15"]);
    }

    #[test]
    fn test_configured_constants() {
        let config = AnalyticsConfig {
            manual_minutes_per_document: 10.0,
            days_per_month: 22,
            error_reduction_percent: 70.0,
        };
        let history = vec![result(DocumentType::Form, 6.0, "2024-12-15 12:00:00")];

        let snapshot = AnalyticsSnapshot::compute(&history, &config);
        assert_eq!(snapshot.time_saved, 9.9);
        assert_eq!(snapshot.efficiency_gain, 99.0);
        assert_eq!(snapshot.monthly_impact, 22);
        assert_eq!(snapshot.error_reduction, 70.0);
    }

    #[test]
    fn test_ties_round_to_even() {
        let history = vec![
            result(DocumentType::Invoice, 0.125, "2024-12-15 12:00:00"),
            result(DocumentType::Invoice, 0.125, "2024-12-15 12:00:01"),
        ];
        let snapshot = AnalyticsSnapshot::compute(&history, &AnalyticsConfig::default());

        assert_eq!(snapshot.average_processing_time, 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(2.5, 0), 2.0);
    }

    #[test]
    fn test_slow_documents_give_negative_savings() {
        let history = vec![result(DocumentType::Unknown, 600.0, "2024-12-15 12:00:00")];
        let snapshot = AnalyticsSnapshot::compute(&history, &AnalyticsConfig::default());

        assert_eq!(snapshot.time_saved, -5.0);
        assert_eq!(snapshot.efficiency_gain, -100.0);
    }

    #[test]
    fn test_serialized_shape() {
        let snapshot = AnalyticsSnapshot::compute(&history(), &AnalyticsConfig::default());
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["total_documents"], 3);
        assert_eq!(value["chart_data"]["document_types"]["Invoice"], 2);
        assert_eq!(value["chart_data"]["dates"][0], "2024-12-14");
    }
}
