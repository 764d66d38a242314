//! Prediction Types
//!
//! Models, analysis requests, and result series for the emission
//! prediction views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A trained prediction model exposed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionModel {
    #[serde(deserialize_with = "crate::model::string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub last_training_date: Option<String>,
    #[serde(default)]
    pub parameters: Option<HashMap<String, serde_json::Value>>,
}

/// Aggregation interval for prediction series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionInterval {
    Daily,
    Weekly,
    Monthly,
}

/// Parameters for running an analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub model_id: String,
    pub start_date: String,
    pub end_date: String,
    pub interval: PredictionInterval,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_confidence_interval: Option<bool>,
}

/// One predicted sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionPoint {
    pub date: String,
    pub predicted_co2: f64,
    #[serde(default)]
    pub lower_bound: Option<f64>,
    #[serde(default)]
    pub upper_bound: Option<f64>,
}

/// Result of a completed analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    #[serde(deserialize_with = "crate::model::string_or_number")]
    pub id: String,
    pub model_id: String,
    pub start_date: String,
    pub end_date: String,
    pub interval: PredictionInterval,
    #[serde(default)]
    pub results: Vec<PredictionPoint>,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_optional_flag() {
        let request = PredictionRequest {
            model_id: "m1".into(),
            start_date: "2025-01-01".into(),
            end_date: "2025-02-01".into(),
            interval: PredictionInterval::Weekly,
            include_confidence_interval: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["interval"], "weekly");
        assert!(json.get("includeConfidenceInterval").is_none());
    }
}
