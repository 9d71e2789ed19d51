//! Batch Publisher - publishes one article to several platforms at once
//!
//! Features:
//! - One tokio task per target behind a per-batch semaphore
//! - Per-target failure isolation (errors and panics become failed results)
//! - Optional overall deadline; unfinished targets are reported as timeouts
//! - Live progress through the [`TaskTracker`]

use crate::core::config::BatchConfig;
use crate::core::error::PublishError;
use crate::core::traits::{PublishOptions, PublishResult};
use crate::orchestration::task_tracker::TaskTracker;
use crate::registry::{SharedStrategy, StrategyRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use uuid::Uuid;

/// Batch publishing options
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPublishOptions {
    /// Maximum concurrent targets per batch (default: 3)
    pub max_concurrency: usize,

    /// Overall deadline for the batch; `None` waits for every target
    pub deadline: Option<Duration>,
}

impl Default for BatchPublishOptions {
    fn default() -> Self {
        Self::from(&BatchConfig::default())
    }
}

impl From<&BatchConfig> for BatchPublishOptions {
    fn from(config: &BatchConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            deadline: config.deadline(),
        }
    }
}

/// One article for several targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPublishRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub options: PublishOptions,
}

/// Batch publish result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPublishResult {
    pub task_id: Uuid,

    /// Result for every requested target
    pub results: BTreeMap<String, PublishResult>,

    /// Real publications only; simulated results are counted separately
    pub success_count: usize,
    pub failure_count: usize,
    pub simulated_count: usize,

    /// Wall-clock duration in milliseconds
    pub duration: u64,
}

impl BatchPublishResult {
    fn from_results(task_id: Uuid, results: BTreeMap<String, PublishResult>, elapsed: Duration) -> Self {
        let success_count = results.values().filter(|r| r.is_success()).count();
        let simulated_count = results.values().filter(|r| r.is_simulated()).count();
        let failure_count = results.values().filter(|r| r.is_failure()).count();
        Self {
            task_id,
            success_count,
            failure_count,
            simulated_count,
            results,
            duration: elapsed.as_millis() as u64,
        }
    }
}

/// Validated batch input shared by every worker
struct Batch {
    task_id: Uuid,
    targets: Vec<String>,
    content: Arc<str>,
    title: Arc<str>,
    options: Arc<PublishOptions>,
}

/// BatchPublisher - fans one article out over the registry
#[derive(Clone)]
pub struct BatchPublisher {
    registry: Arc<StrategyRegistry>,
    tracker: TaskTracker,
    options: BatchPublishOptions,
}

impl BatchPublisher {
    pub fn new(registry: Arc<StrategyRegistry>, tracker: TaskTracker, options: BatchPublishOptions) -> Self {
        Self {
            registry,
            tracker,
            options,
        }
    }

    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    pub fn options(&self) -> &BatchPublishOptions {
        &self.options
    }

    /// Publish to every requested target and wait for the outcome
    ///
    /// # Errors
    ///
    /// `ValidationError` for an empty target list or blank content; nothing
    /// touches the driver in that case.
    pub async fn publish_to_multiple(
        &self,
        request: BatchPublishRequest,
    ) -> Result<BatchPublishResult, PublishError> {
        let batch = self.begin(request)?;
        Ok(self.run(batch).await)
    }

    /// Start a batch in the background and return its task id at once
    pub fn spawn(&self, request: BatchPublishRequest) -> Result<Uuid, PublishError> {
        let batch = self.begin(request)?;
        let task_id = batch.task_id;
        let publisher = self.clone();
        tokio::spawn(async move {
            publisher.run(batch).await;
        });
        Ok(task_id)
    }

    fn begin(&self, request: BatchPublishRequest) -> Result<Batch, PublishError> {
        if request.targets.is_empty() {
            return Err(PublishError::validation("至少需要指定一个发布平台"));
        }
        if request.content.trim().is_empty() {
            return Err(PublishError::validation("发布内容不能为空"));
        }

        let mut seen = HashSet::new();
        let targets: Vec<String> = request
            .targets
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();

        let task_id = self.tracker.start(&targets);
        tracing::info!(
            task_id = %task_id,
            targets = ?targets,
            max_concurrency = self.options.max_concurrency,
            "batch publish started"
        );

        Ok(Batch {
            task_id,
            targets,
            content: request.content.into(),
            title: request.title.into(),
            options: Arc::new(request.options),
        })
    }

    async fn run(&self, batch: Batch) -> BatchPublishResult {
        let started = Instant::now();
        let task_id = batch.task_id;
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let mut tasks = Vec::new();

        for target in &batch.targets {
            let Some(strategy) = self.registry.get(target) else {
                tracing::warn!(task_id = %task_id, platform = %target, "unsupported target");
                self.tracker.record(
                    task_id,
                    target,
                    PublishResult::from(&PublishError::unsupported(target.as_str())),
                );
                continue;
            };

            let semaphore = Arc::clone(&semaphore);
            let tracker = self.tracker.clone();
            let target_for_task = target.clone();
            let content = Arc::clone(&batch.content);
            let title = Arc::clone(&batch.title);
            let options = Arc::clone(&batch.options);

            let task = tokio::spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        Self::publish_single_target(strategy, &target_for_task, &content, &title, &options)
                            .await
                    }
                    Err(_) => PublishResult::failure("批量任务已关闭"),
                };
                tracker.record(task_id, &target_for_task, result.clone());
                result
            });

            tasks.push((target.clone(), task));
        }

        let deadline = self
            .options
            .deadline
            .map(|limit| tokio::time::Instant::now() + limit);

        // Wait for all tasks and collect results
        for (target, mut task) in tasks {
            let joined = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, &mut task).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        // Units still queued for a permit never start. A unit
                        // already publishing is detached: it keeps its lock
                        // until it ends and the finished tracker drops its result.
                        semaphore.close();
                        tracing::warn!(task_id = %task_id, platform = %target, "deadline exceeded");
                        let timeout = PublishError::PublishTimeout {
                            target: target.clone(),
                        };
                        self.tracker
                            .record(task_id, &target, PublishResult::from(&timeout));
                        continue;
                    }
                },
                None => task.await,
            };

            match joined {
                Ok(result) if result.is_success() => {
                    tracing::info!(task_id = %task_id, platform = %target, "target published");
                }
                Ok(result) if result.is_simulated() => {
                    tracing::info!(task_id = %task_id, platform = %target, "target simulated");
                }
                Ok(result) => {
                    tracing::warn!(
                        task_id = %task_id,
                        platform = %target,
                        reason = result.message(),
                        "target failed"
                    );
                }
                Err(e) => {
                    tracing::error!(task_id = %task_id, platform = %target, error = %e, "publish task aborted");
                    self.tracker.record(
                        task_id,
                        &target,
                        PublishResult::failure(format!("发布任务异常退出: {}", e)),
                    );
                }
            }
        }

        let results = self
            .tracker
            .finish(task_id)
            .map(|progress| progress.results.into_iter().collect())
            .unwrap_or_default();
        let result = BatchPublishResult::from_results(task_id, results, started.elapsed());

        tracing::info!(
            task_id = %task_id,
            succeeded = result.success_count,
            failed = result.failure_count,
            simulated = result.simulated_count,
            duration_ms = result.duration,
            "batch publish finished"
        );

        result
    }

    /// Lock the target, initialize it lazily and publish
    async fn publish_single_target(
        strategy: SharedStrategy,
        target: &str,
        content: &str,
        title: &str,
        options: &PublishOptions,
    ) -> PublishResult {
        let mut strategy = strategy.lock().await;

        if let Err(e) = strategy.initialize().await {
            tracing::warn!(platform = %target, error = %e, "initialization failed");
            return PublishResult::from(&e);
        }

        strategy.publish(content, title, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PublisherConfig;
    use crate::driver::MemoryDriver;
    use crate::session::SessionStore;
    use crate::strategies::StrategySettings;
    use tempfile::TempDir;

    fn publisher(dir: &TempDir, driver: &MemoryDriver) -> BatchPublisher {
        let config = PublisherConfig::default();
        let registry = StrategyRegistry::discover(
            Arc::new(driver.clone()),
            Arc::new(SessionStore::new(dir.path())),
            StrategySettings::from_config(&config),
            &config,
        );
        BatchPublisher::new(
            Arc::new(registry),
            TaskTracker::default(),
            BatchPublishOptions::default(),
        )
    }

    fn request(targets: &[&str], content: &str) -> BatchPublishRequest {
        BatchPublishRequest {
            content: content.to_string(),
            title: "标题".to_string(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
            options: PublishOptions::default(),
        }
    }

    #[test]
    fn test_batch_options_default() {
        let options = BatchPublishOptions::default();
        assert_eq!(options.max_concurrency, 3);
        assert_eq!(options.deadline, Some(Duration::from_secs(600)));
    }

    #[tokio::test]
    async fn test_rejects_empty_targets_and_blank_content() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        let publisher = publisher(&dir, &driver);

        let err = publisher.publish_to_multiple(request(&[], "正文")).await.unwrap_err();
        assert_eq!(err.kind(), "ValidationError");

        let err = publisher
            .publish_to_multiple(request(&["csdn"], " \n\t"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ValidationError");

        assert_eq!(driver.sessions_opened(), 0);
        assert!(publisher.tracker().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_target_never_touches_driver() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        let publisher = publisher(&dir, &driver);

        let result = publisher
            .publish_to_multiple(request(&["unknown", "unknown"], "正文"))
            .await
            .unwrap();

        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results["unknown"].message(), "UnsupportedTargetError");
        assert_eq!(result.failure_count, 1);
        assert_eq!(driver.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn test_initialization_failure_is_per_target() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        driver.fail_sessions(true);
        let publisher = publisher(&dir, &driver);

        let result = publisher
            .publish_to_multiple(request(&["csdn", "juejin"], "正文"))
            .await
            .unwrap();

        assert_eq!(result.failure_count, 2);
        assert!(result.results["csdn"].message().contains("初始化失败"));
        assert!(publisher.tracker().progress(result.task_id).unwrap().finished);
    }

    #[test]
    fn test_counts_exclude_simulated_from_success() {
        let mut results = BTreeMap::new();
        results.insert("csdn".to_string(), PublishResult::success("发布成功", None));
        results.insert("juejin".to_string(), PublishResult::simulated("模拟发布"));
        results.insert("weibo".to_string(), PublishResult::failure("发布按钮点击失败"));

        let result = BatchPublishResult::from_results(Uuid::new_v4(), results, Duration::from_millis(5));

        assert_eq!(result.success_count, 1);
        assert_eq!(result.simulated_count, 1);
        assert_eq!(result.failure_count, 1);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = BatchPublishResult::from_results(Uuid::new_v4(), BTreeMap::new(), Duration::ZERO);
        let json = serde_json::to_value(&result).unwrap();

        assert!(json.get("taskId").is_some());
        assert_eq!(json["successCount"], 0);
        assert_eq!(json["simulatedCount"], 0);
    }
}
