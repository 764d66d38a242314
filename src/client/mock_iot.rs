//! IoT Mock Endpoints
//!
//! Control panel for the backend's data-generation engine: generator
//! lifecycle, device generation, scenario simulation, and task status.

use super::{ApiClient, ApiResult};
use crate::model::{
    Device, DeviceForm, GenerateParams, MockSystemStatus, MockTask, ScenarioParams, TaskKind,
};
use serde::Deserialize;
use serde_json::json;

/// Response of a task-spawning endpoint. Not every endpoint answers
/// with a task id; synchronous ones just acknowledge.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSubmission {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiClient {
    pub async fn mock_system_status(&self) -> ApiResult<MockSystemStatus> {
        self.get("/mock-iot/mockSystemStatus", &[]).await
    }

    pub async fn start_mock_generation(&self) -> ApiResult<()> {
        self.post_empty("/mock-iot/start", &json!({})).await
    }

    pub async fn stop_mock_generation(&self) -> ApiResult<()> {
        self.post_empty("/mock-iot/stop", &json!({})).await
    }

    /// Reload the generator's device templates.
    pub async fn reload_mock_data(&self) -> ApiResult<()> {
        self.post_empty("/mock-iot/reload", &json!({})).await
    }

    /// Force one immediate data publication round.
    pub async fn publish_mock_data(&self) -> ApiResult<()> {
        self.post_empty("/mock-iot/publish", &json!({})).await
    }

    /// Push generated devices into the device inventory.
    pub async fn sync_mock_devices(&self) -> ApiResult<()> {
        self.post_empty("/mock-iot/sync-devices", &json!({})).await
    }

    /// Submit a device-generation task.
    pub async fn generate_devices(
        &self,
        kind: TaskKind,
        params: &GenerateParams,
    ) -> ApiResult<TaskSubmission> {
        self.post(&format!("/mock-iot/{}", kind.endpoint()), params)
            .await
    }

    /// Submit a scenario or time-pattern simulation task.
    pub async fn simulate_scenario(
        &self,
        kind: TaskKind,
        params: &ScenarioParams,
    ) -> ApiResult<TaskSubmission> {
        self.post(&format!("/mock-iot/{}", kind.endpoint()), params)
            .await
    }

    pub async fn task_status(&self, task_id: &str) -> ApiResult<MockTask> {
        self.get(&format!("/mock-iot/tasks/{task_id}"), &[]).await
    }

    // Generated devices live in the simulator's own inventory and use
    // the same shape as real devices.

    pub async fn get_mock_device(&self, id: &str) -> ApiResult<Device> {
        self.get(&format!("/mock-iot/{id}"), &[]).await
    }

    pub async fn create_mock_device(&self, form: &DeviceForm) -> ApiResult<Device> {
        self.post("/mock-iot", form).await
    }

    pub async fn update_mock_device(&self, id: &str, form: &DeviceForm) -> ApiResult<Device> {
        self.put(&format!("/mock-iot/{id}"), form).await
    }

    pub async fn delete_mock_device(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/mock-iot/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_without_task_id() {
        let submission: TaskSubmission =
            serde_json::from_str(r#"{"message": "started"}"#).unwrap();
        assert!(submission.task_id.is_none());
    }

    #[test]
    fn test_submission_with_task_id() {
        let submission: TaskSubmission =
            serde_json::from_str(r#"{"taskId": "t-9"}"#).unwrap();
        assert_eq!(submission.task_id.as_deref(), Some("t-9"));
    }
}
