//! In-memory registry of batch tasks
//!
//! A batch records each target's result as soon as its worker finishes, so
//! progress can be queried while the batch is still running. Finished tasks
//! are evicted once they are older than the retention window.

use crate::core::traits::PublishResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Snapshot of a batch task
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    pub task_id: Uuid,
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub simulated: usize,
    /// Targets without a result yet
    pub pending: Vec<String>,
    pub results: HashMap<String, PublishResult>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub finished: bool,
}

#[derive(Debug)]
struct BatchTask {
    targets: Vec<String>,
    results: HashMap<String, PublishResult>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    finished: Option<Instant>,
}

impl BatchTask {
    fn progress(&self, task_id: Uuid) -> TaskProgress {
        let simulated = self.results.values().filter(|r| r.is_simulated()).count();
        let failed = self.results.values().filter(|r| r.is_failure()).count();
        TaskProgress {
            task_id,
            total: self.targets.len(),
            completed: self.results.len(),
            succeeded: self.results.values().filter(|r| r.is_success()).count(),
            failed,
            simulated,
            pending: self
                .targets
                .iter()
                .filter(|t| !self.results.contains_key(*t))
                .cloned()
                .collect(),
            results: self.results.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            finished: self.finished.is_some(),
        }
    }
}

/// Shared, cloneable task registry
#[derive(Debug, Clone)]
pub struct TaskTracker {
    tasks: Arc<Mutex<HashMap<Uuid, BatchTask>>>,
    retention: Duration,
}

impl Default for TaskTracker {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

impl TaskTracker {
    pub fn new(retention: Duration) -> Self {
        Self {
            tasks: Arc::new(Mutex::new(HashMap::new())),
            retention,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, BatchTask>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn evict_expired(&self, tasks: &mut HashMap<Uuid, BatchTask>) {
        let retention = self.retention;
        tasks.retain(|id, task| match task.finished {
            Some(at) if at.elapsed() > retention => {
                tracing::debug!(task_id = %id, "evicting finished batch task");
                false
            }
            _ => true,
        });
    }

    /// Register a new batch over `targets`
    pub fn start(&self, targets: &[String]) -> Uuid {
        let id = Uuid::new_v4();
        let mut tasks = self.lock();
        self.evict_expired(&mut tasks);
        tasks.insert(
            id,
            BatchTask {
                targets: targets.to_vec(),
                results: HashMap::new(),
                started_at: Utc::now(),
                finished_at: None,
                finished: None,
            },
        );
        id
    }

    /// Store a target's result. Returns false when the slot was already
    /// written, the target is not part of the task, or the task is finished.
    pub fn record(&self, id: Uuid, target: &str, result: PublishResult) -> bool {
        let mut tasks = self.lock();
        let Some(task) = tasks.get_mut(&id) else {
            return false;
        };
        if task.finished.is_some()
            || task.results.contains_key(target)
            || !task.targets.iter().any(|t| t == target)
        {
            return false;
        }
        task.results.insert(target.to_string(), result);
        true
    }

    /// Close the task to further records and return its final snapshot
    pub fn finish(&self, id: Uuid) -> Option<TaskProgress> {
        let mut tasks = self.lock();
        let task = tasks.get_mut(&id)?;
        if task.finished.is_none() {
            task.finished = Some(Instant::now());
            task.finished_at = Some(Utc::now());
        }
        Some(task.progress(id))
    }

    pub fn progress(&self, id: Uuid) -> Option<TaskProgress> {
        let mut tasks = self.lock();
        self.evict_expired(&mut tasks);
        tasks.get(&id).map(|task| task.progress(id))
    }

    /// Remove a task, returning its final snapshot
    pub fn take(&self, id: Uuid) -> Option<TaskProgress> {
        self.lock().remove(&id).map(|task| task.progress(id))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
