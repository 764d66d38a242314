//! Prediction Endpoints
//!
//! Model listing, analysis runs, and accuracy reads.

use super::{ApiClient, ApiResult};
use crate::model::{ListPayload, PredictionModel, PredictionRequest, PredictionResult};
use serde::Deserialize;

/// Accuracy summary for a completed prediction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionAccuracy {
    pub accuracy: f64,
    #[serde(default)]
    pub sample_count: Option<u64>,
}

impl ApiClient {
    pub async fn list_prediction_models(&self) -> ApiResult<Vec<PredictionModel>> {
        let payload: ListPayload<PredictionModel> =
            self.get("/predictions/models", &[]).await?;
        Ok(payload.into_parts().0)
    }

    /// Run an analysis; the backend answers with the computed series.
    pub async fn run_prediction(
        &self,
        request: &PredictionRequest,
    ) -> ApiResult<PredictionResult> {
        self.post("/predictions/analyze", request).await
    }

    pub async fn get_prediction(&self, id: &str) -> ApiResult<PredictionResult> {
        self.get(&format!("/predictions/{id}"), &[]).await
    }

    /// Previously computed predictions, newest first per the backend.
    pub async fn prediction_history(&self) -> ApiResult<Vec<PredictionResult>> {
        let payload: ListPayload<PredictionResult> =
            self.get("/predictions/history", &[]).await?;
        Ok(payload.into_parts().0)
    }

    pub async fn prediction_accuracy(&self, id: &str) -> ApiResult<PredictionAccuracy> {
        self.get(&format!("/predictions/{id}/accuracy"), &[]).await
    }
}
