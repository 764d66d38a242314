//! Emission Types
//!
//! Emission records, generated reports, and the source breakdown used
//! by the reporting views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// CO2 contribution by source category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcesBreakdown {
    #[serde(default)]
    pub electricity: f64,
    #[serde(default)]
    pub fuel: f64,
    #[serde(default)]
    pub heating: f64,
    #[serde(default)]
    pub other: f64,
}

/// A single emission measurement record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionRecord {
    #[serde(deserialize_with = "crate::model::string_or_number")]
    pub id: String,
    pub date: String,
    pub total_co2: f64,
    #[serde(default)]
    pub sources_breakdown: SourcesBreakdown,
    #[serde(default)]
    pub comparison_with_target: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields accepted when creating an emission record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionForm {
    pub date: String,
    pub total_co2: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_breakdown: Option<SourcesBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Lifecycle of a generated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Draft,
    Finalized,
}

/// A generated emission report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionReport {
    #[serde(deserialize_with = "crate::model::string_or_number")]
    pub id: String,
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    pub total_emission: f64,
    #[serde(default)]
    pub reduction: f64,
    pub status: ReportStatus,
    #[serde(default)]
    pub pdf_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_defaults_breakdown() {
        let json = r#"{"id": "e1", "date": "2025-06-01", "totalCo2": 12.5}"#;
        let record: EmissionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.total_co2, 12.5);
        assert_eq!(record.sources_breakdown, SourcesBreakdown::default());
    }

    #[test]
    fn test_report_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&ReportStatus::Finalized).unwrap(),
            "\"finalized\""
        );
    }
}
