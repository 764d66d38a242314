//! Background Task Monitor
//!
//! Tracks asynchronous backend jobs (device generation, scenario
//! simulation) by task id and polls their status on a fixed cadence
//! until every tracked task is terminal. One monitor owns the one
//! polling timer; it is cancelled on `stop_polling` and on drop.

use crate::client::{ApiClient, ApiError, ApiResult, TaskSubmission};
use crate::model::{GenerateParams, MockTask, ScenarioParams, TaskKind, TaskStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Parameters for a task submission, by endpoint family.
#[derive(Debug, Clone)]
pub enum TaskParams {
    Generate(GenerateParams),
    Scenario(ScenarioParams),
}

/// Backend surface the monitor drives: task submission and status
/// reads. The monitor only depends on this trait, so poll behavior is
/// testable against a scripted implementation.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    async fn submit_generate(
        &self,
        kind: TaskKind,
        params: &GenerateParams,
    ) -> ApiResult<TaskSubmission>;

    async fn submit_scenario(
        &self,
        kind: TaskKind,
        params: &ScenarioParams,
    ) -> ApiResult<TaskSubmission>;

    async fn fetch_task(&self, task_id: &str) -> ApiResult<MockTask>;
}

#[async_trait]
impl TaskBackend for ApiClient {
    async fn submit_generate(
        &self,
        kind: TaskKind,
        params: &GenerateParams,
    ) -> ApiResult<TaskSubmission> {
        self.generate_devices(kind, params).await
    }

    async fn submit_scenario(
        &self,
        kind: TaskKind,
        params: &ScenarioParams,
    ) -> ApiResult<TaskSubmission> {
        self.simulate_scenario(kind, params).await
    }

    async fn fetch_task(&self, task_id: &str) -> ApiResult<MockTask> {
        self.task_status(task_id).await
    }
}

/// Monitor for backend mock-IoT tasks.
pub struct TaskMonitor {
    backend: Arc<dyn TaskBackend>,
    tasks: Arc<RwLock<HashMap<String, MockTask>>>,
    poll_interval: Duration,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl TaskMonitor {
    pub fn new(backend: Arc<dyn TaskBackend>, poll_interval: Duration) -> Self {
        Self {
            backend,
            tasks: Arc::new(RwLock::new(HashMap::new())),
            poll_interval,
            poller: Mutex::new(None),
        }
    }

    /// Submit a job; if the backend answers with a task id, the task
    /// is recorded as pending and picked up by the poll loop.
    ///
    /// The params family must match the kind's endpoint family; a
    /// generation kind with scenario params is rejected before any
    /// request is made.
    pub async fn submit(&self, kind: TaskKind, params: &TaskParams) -> ApiResult<Option<String>> {
        let submission = match params {
            TaskParams::Generate(p) if kind.is_generation() => {
                self.backend.submit_generate(kind.clone(), p).await?
            }
            TaskParams::Scenario(p) if !kind.is_generation() => {
                self.backend.submit_scenario(kind.clone(), p).await?
            }
            _ => {
                return Err(ApiError::Rejected {
                    status: 400,
                    message: format!("{kind:?} does not accept these parameters"),
                })
            }
        };
        Ok(self.record_submission(kind, submission).await)
    }

    async fn record_submission(&self, kind: TaskKind, submission: TaskSubmission) -> Option<String> {
        let task_id = submission.task_id?;
        tracing::info!(task_id = %task_id, ?kind, "Tracking new task");

        let task = MockTask {
            id: task_id.clone(),
            kind: kind.endpoint().to_string(),
            status: TaskStatus::Pending,
            progress: 0.0,
            created_at: Some(Utc::now()),
            completed_at: None,
            result: None,
            error: None,
        };
        self.tasks.write().await.insert(task_id.clone(), task);
        Some(task_id)
    }

    /// Fetch one task's status and overwrite the stored record.
    /// Applying the same payload twice yields the same state.
    pub async fn poll(&self, task_id: &str) -> ApiResult<MockTask> {
        let task = self.backend.fetch_task(task_id).await?;
        self.tasks.write().await.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    /// Start the repeating poll over every non-terminal task.
    ///
    /// The loop exits on its own as soon as no tracked task remains
    /// non-terminal; calling this again later starts a fresh loop.
    pub fn start_polling(&self) {
        let mut poller = self.poller.lock().expect("poller lock poisoned");
        if poller.as_ref().map(|h| !h.is_finished()).unwrap_or(false) {
            return;
        }

        let backend = self.backend.clone();
        let tasks = self.tasks.clone();
        let interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                ticker.tick().await;

                let pending: Vec<String> = {
                    let tasks = tasks.read().await;
                    non_terminal_ids(&tasks)
                };

                if pending.is_empty() {
                    tracing::debug!("No non-terminal tasks left, stopping poll loop");
                    break;
                }

                for task_id in pending {
                    match backend.fetch_task(&task_id).await {
                        Ok(task) => {
                            if task.status.is_terminal() {
                                tracing::info!(
                                    task_id = %task.id,
                                    status = %task.status,
                                    "Task reached terminal state"
                                );
                            }
                            tasks.write().await.insert(task.id.clone(), task);
                        }
                        Err(e) => {
                            // Keep the last known record; the next tick re-polls
                            tracing::warn!(task_id = %task_id, "Task poll failed: {}", e);
                        }
                    }
                }
            }
        });

        *poller = Some(handle);
    }

    /// Cancel the repeating poll unconditionally.
    pub fn stop_polling(&self) {
        if let Some(handle) = self.poller.lock().expect("poller lock poisoned").take() {
            handle.abort();
        }
    }

    /// Whether the poll loop is currently live.
    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .expect("poller lock poisoned")
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// All tracked tasks, newest first.
    pub async fn tasks(&self) -> Vec<MockTask> {
        let mut tasks: Vec<MockTask> = self.tasks.read().await.values().cloned().collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    pub async fn running_tasks(&self) -> Vec<MockTask> {
        self.tasks_with(|t| !t.status.is_terminal()).await
    }

    pub async fn completed_tasks(&self) -> Vec<MockTask> {
        self.tasks_with(|t| t.status == TaskStatus::Completed).await
    }

    pub async fn failed_tasks(&self) -> Vec<MockTask> {
        self.tasks_with(|t| t.status == TaskStatus::Failed).await
    }

    /// Drop terminal tasks from the tracked set.
    pub async fn clear_finished(&self) {
        self.tasks
            .write()
            .await
            .retain(|_, task| !task.status.is_terminal());
    }

    async fn tasks_with(&self, predicate: impl Fn(&MockTask) -> bool) -> Vec<MockTask> {
        self.tasks
            .read()
            .await
            .values()
            .filter(|t| predicate(t))
            .cloned()
            .collect()
    }
}

impl Drop for TaskMonitor {
    fn drop(&mut self) {
        // The poll timer must not outlive its owner
        if let Ok(mut poller) = self.poller.lock() {
            if let Some(handle) = poller.take() {
                handle.abort();
            }
        }
    }
}

/// Ids of every tracked task still worth polling.
fn non_terminal_ids(tasks: &HashMap<String, MockTask>) -> Vec<String> {
    tasks
        .values()
        .filter(|t| !t.status.is_terminal())
        .map(|t| t.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SessionStore;
    use crate::config::ApiConfig;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_monitor(interval: Duration) -> TaskMonitor {
        let dir = std::env::temp_dir().join("carbonpark-task-test");
        let session = Arc::new(SessionStore::open(dir.join("session.json")));
        let client = Arc::new(ApiClient::new(&ApiConfig::default(), session).unwrap());
        TaskMonitor::new(client, interval)
    }

    /// Backend answering each status read from a fixed script.
    struct ScriptedBackend {
        responses: Mutex<VecDeque<ApiResult<MockTask>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn with_responses(responses: Vec<ApiResult<MockTask>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TaskBackend for ScriptedBackend {
        async fn submit_generate(
            &self,
            _kind: TaskKind,
            _params: &GenerateParams,
        ) -> ApiResult<TaskSubmission> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TaskSubmission {
                task_id: Some("t1".into()),
                message: None,
            })
        }

        async fn submit_scenario(
            &self,
            _kind: TaskKind,
            _params: &ScenarioParams,
        ) -> ApiResult<TaskSubmission> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TaskSubmission {
                task_id: Some("t1".into()),
                message: None,
            })
        }

        async fn fetch_task(&self, _task_id: &str) -> ApiResult<MockTask> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ApiError::NotFound))
        }
    }

    fn task(id: &str, status: TaskStatus) -> MockTask {
        MockTask {
            id: id.into(),
            kind: "generate-random".into(),
            status,
            progress: 0.0,
            created_at: Some(Utc::now()),
            completed_at: None,
            result: None,
            error: None,
        }
    }

    #[test]
    fn test_non_terminal_ids() {
        let mut tasks = HashMap::new();
        tasks.insert("a".to_string(), task("a", TaskStatus::Pending));
        tasks.insert("b".to_string(), task("b", TaskStatus::Running));
        tasks.insert("c".to_string(), task("c", TaskStatus::Completed));
        tasks.insert("d".to_string(), task("d", TaskStatus::Failed));

        let mut ids = non_terminal_ids(&tasks);
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_status_overwrite_is_idempotent() {
        let monitor = test_monitor(Duration::from_secs(2));
        let payload = task("t1", TaskStatus::Running);

        monitor.tasks.write().await.insert("t1".into(), payload.clone());
        monitor.tasks.write().await.insert("t1".into(), payload.clone());

        let tasks = monitor.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0], payload);
    }

    #[tokio::test]
    async fn test_submission_without_task_id_tracks_nothing() {
        let monitor = test_monitor(Duration::from_secs(2));
        let recorded = monitor
            .record_submission(
                TaskKind::GenerateRandom,
                TaskSubmission {
                    task_id: None,
                    message: Some("done synchronously".into()),
                },
            )
            .await;
        assert!(recorded.is_none());
        assert!(monitor.tasks().await.is_empty());
    }

    #[tokio::test]
    async fn test_submission_records_pending_task() {
        let monitor = test_monitor(Duration::from_secs(2));
        let recorded = monitor
            .record_submission(
                TaskKind::VehicleEntry,
                TaskSubmission {
                    task_id: Some("t-7".into()),
                    message: None,
                },
            )
            .await;
        assert_eq!(recorded.as_deref(), Some("t-7"));

        let tasks = monitor.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::Pending);
        assert_eq!(tasks[0].kind, "scenario/vehicle-entry");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_loop_follows_task_to_terminal_state() {
        let backend = Arc::new(ScriptedBackend::with_responses(vec![
            Ok(task("t1", TaskStatus::Pending)),
            Ok(task("t1", TaskStatus::Running)),
            Ok(task("t1", TaskStatus::Completed)),
        ]));
        let monitor = TaskMonitor::new(backend.clone(), Duration::from_secs(2));
        monitor
            .tasks
            .write()
            .await
            .insert("t1".into(), task("t1", TaskStatus::Pending));

        monitor.start_polling();
        tokio::time::sleep(Duration::from_secs(60)).await;

        // Three polls carried pending -> running -> completed; the
        // next tick saw only a terminal task and never fetched again
        assert_eq!(backend.calls(), 3);
        assert!(!monitor.is_polling());
        assert_eq!(monitor.completed_tasks().await.len(), 1);
        assert!(monitor.running_tasks().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_failure_keeps_record_and_retries() {
        let backend = Arc::new(ScriptedBackend::with_responses(vec![
            Err(ApiError::Server { status: 502 }),
            Ok(task("t1", TaskStatus::Completed)),
        ]));
        let monitor = TaskMonitor::new(backend.clone(), Duration::from_secs(2));
        monitor
            .tasks
            .write()
            .await
            .insert("t1".into(), task("t1", TaskStatus::Pending));

        monitor.start_polling();
        tokio::time::sleep(Duration::from_secs(60)).await;

        // The failed tick kept the pending record; the next tick
        // re-polled and reached the terminal state
        assert_eq!(backend.calls(), 2);
        assert!(!monitor.is_polling());
        assert_eq!(monitor.completed_tasks().await.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_records_task_from_backend_response() {
        let backend = Arc::new(ScriptedBackend::with_responses(vec![]));
        let monitor = TaskMonitor::new(backend, Duration::from_secs(2));

        let recorded = monitor
            .submit(
                TaskKind::GenerateBasic,
                &TaskParams::Generate(GenerateParams::default()),
            )
            .await
            .unwrap();
        assert_eq!(recorded.as_deref(), Some("t1"));
        assert_eq!(monitor.tasks().await.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_rejects_mismatched_params() {
        let backend = Arc::new(ScriptedBackend::with_responses(vec![]));
        let monitor = TaskMonitor::new(backend.clone(), Duration::from_secs(2));

        let generate_with_scenario = monitor
            .submit(
                TaskKind::GenerateRandom,
                &TaskParams::Scenario(ScenarioParams::default()),
            )
            .await;
        assert!(matches!(
            generate_with_scenario,
            Err(ApiError::Rejected { status: 400, .. })
        ));

        let scenario_with_generate = monitor
            .submit(
                TaskKind::Loading,
                &TaskParams::Generate(GenerateParams::default()),
            )
            .await;
        assert!(matches!(
            scenario_with_generate,
            Err(ApiError::Rejected { status: 400, .. })
        ));

        // Nothing was tracked and the backend was never reached
        assert!(monitor.tasks().await.is_empty());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_loop_exits_when_all_tasks_terminal() {
        let monitor = test_monitor(Duration::from_secs(2));
        monitor
            .tasks
            .write()
            .await
            .insert("t1".into(), task("t1", TaskStatus::Completed));

        monitor.start_polling();
        // Paused time auto-advances; the first tick sees no
        // non-terminal task and the loop ends without any request.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!monitor.is_polling());
    }

    #[tokio::test]
    async fn test_stop_polling_cancels_timer() {
        let monitor = test_monitor(Duration::from_secs(3600));
        monitor
            .tasks
            .write()
            .await
            .insert("t1".into(), task("t1", TaskStatus::Pending));

        monitor.start_polling();
        assert!(monitor.is_polling());

        monitor.stop_polling();
        // Abort is asynchronous; give the runtime a moment to finish it
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!monitor.is_polling());
    }

    #[tokio::test]
    async fn test_clear_finished_keeps_live_tasks() {
        let monitor = test_monitor(Duration::from_secs(2));
        {
            let mut tasks = monitor.tasks.write().await;
            tasks.insert("a".into(), task("a", TaskStatus::Running));
            tasks.insert("b".into(), task("b", TaskStatus::Completed));
        }

        monitor.clear_finished().await;
        let remaining = monitor.tasks().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "a");
    }
}
