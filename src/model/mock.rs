//! IoT Mock Types
//!
//! Types for the data-generation control panel: simulator status,
//! asynchronous backend tasks, and generation/scenario parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of the mock data generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockSystemStatus {
    /// Generator state, "running" when active.
    pub status: String,
    #[serde(default)]
    pub active_devices: u64,
    #[serde(default)]
    pub recent_data_uploads: u64,
    #[serde(default)]
    pub uptime: f64,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl MockSystemStatus {
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }
}

/// Lifecycle of a backend task. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Terminal tasks are never polled again.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// What a submitted task does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    GenerateRandom,
    GenerateBasic,
    GenerateLogistics,
    GenerateCarbon,
    VehicleEntry,
    Loading,
    /// Queued variant of `Loading`; always answers with a task id.
    LoadingAsync,
    CarbonPeak,
    CarbonReduction,
    WorkdayPeak,
    Night,
}

impl TaskKind {
    /// Endpoint path below `/mock-iot` for submitting this kind of task.
    pub fn endpoint(&self) -> &'static str {
        match self {
            TaskKind::GenerateRandom => "generate-random",
            TaskKind::GenerateBasic => "generate/basic-devices",
            TaskKind::GenerateLogistics => "generate/logistics-devices",
            TaskKind::GenerateCarbon => "generate/carbon-devices",
            TaskKind::VehicleEntry => "scenario/vehicle-entry",
            TaskKind::Loading => "scenario/loading",
            TaskKind::LoadingAsync => "scenario/loading/async",
            TaskKind::CarbonPeak => "scenario/carbon-peak",
            TaskKind::CarbonReduction => "scenario/carbon-reduction",
            TaskKind::WorkdayPeak => "time-pattern/workday-peak",
            TaskKind::Night => "time-pattern/night",
        }
    }

    /// Whether this kind takes `GenerateParams`; every other kind
    /// takes `ScenarioParams`.
    pub fn is_generation(&self) -> bool {
        matches!(
            self,
            TaskKind::GenerateRandom
                | TaskKind::GenerateBasic
                | TaskKind::GenerateLogistics
                | TaskKind::GenerateCarbon
        )
    }
}

/// A tracked backend task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockTask {
    #[serde(deserialize_with = "crate::model::string_or_number")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Parameters for device-generation endpoints.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// Simulation intensity for scenario endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioIntensity {
    Low,
    Medium,
    High,
}

/// Parameters for scenario/time-pattern endpoints.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<ScenarioIntensity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_param_families() {
        assert!(TaskKind::GenerateRandom.is_generation());
        assert!(TaskKind::GenerateCarbon.is_generation());
        assert!(!TaskKind::Loading.is_generation());
        assert!(!TaskKind::LoadingAsync.is_generation());
        assert!(!TaskKind::WorkdayPeak.is_generation());
        assert_eq!(TaskKind::LoadingAsync.endpoint(), "scenario/loading/async");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn test_running_flag_derived_from_status() {
        let status = MockSystemStatus {
            status: "running".into(),
            active_devices: 3,
            recent_data_uploads: 0,
            uptime: 12.0,
            errors: vec![],
            last_update: None,
            timestamp: None,
        };
        assert!(status.is_running());
    }

    #[test]
    fn test_task_wire_shape() {
        let json = r#"{"id": "t1", "type": "generate-random", "status": "running", "progress": 40}"#;
        let task: MockTask = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, TaskStatus::Running);
        assert_eq!(task.progress, 40.0);
    }
}
