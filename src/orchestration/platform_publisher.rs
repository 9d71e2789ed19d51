//! Platform Publisher - main entry point for publishing
//!
//! Wires the registry, session store and batch publisher together and exposes
//! the single-target operations used by the CLI and the HTTP surface:
//! - Lazy strategy initialization
//! - Interactive login (open the login page, confirm and persist the session)
//! - Status reporting per platform
//! - Single-target and batch publishing

use crate::core::config::PublisherConfig;
use crate::core::error::PublishError;
use crate::core::state_machine::StrategyState;
use crate::core::traits::{PublishOptions, PublishResult};
use crate::driver::{self, AutomationDriver};
use crate::orchestration::batch_publisher::{
    BatchPublishOptions, BatchPublishRequest, BatchPublishResult, BatchPublisher,
};
use crate::orchestration::task_tracker::{TaskProgress, TaskTracker};
use crate::registry::{SharedStrategy, StrategyRegistry};
use crate::session::SessionStore;
use crate::strategies::StrategySettings;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Login and lifecycle status of one platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStatus {
    pub target: String,
    pub display_name: String,
    pub logged_in: bool,
    pub state: StrategyState,
}

#[derive(Clone)]
pub struct PlatformPublisher {
    registry: Arc<StrategyRegistry>,
    store: Arc<SessionStore>,
    batch: BatchPublisher,
}

impl PlatformPublisher {
    pub fn new(registry: Arc<StrategyRegistry>, store: Arc<SessionStore>, batch: BatchPublisher) -> Self {
        Self {
            registry,
            store,
            batch,
        }
    }

    /// Build everything from a loaded configuration with the given driver
    pub fn with_driver(config: &PublisherConfig, driver: Arc<dyn AutomationDriver>) -> Self {
        let store = Arc::new(SessionStore::new(config.sessions().path()));
        let registry = Arc::new(StrategyRegistry::discover(
            driver,
            Arc::clone(&store),
            StrategySettings::from_config(config),
            config,
        ));

        let batch_config = config.batch();
        let batch = BatchPublisher::new(
            Arc::clone(&registry),
            TaskTracker::new(batch_config.task_retention()),
            BatchPublishOptions::from(&batch_config),
        );

        Self::new(registry, store, batch)
    }

    /// Build everything from configuration, including the driver
    pub fn from_config(config: &PublisherConfig) -> Self {
        Self::with_driver(config, driver::connect(&config.driver()))
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn batch(&self) -> &BatchPublisher {
        &self.batch
    }

    fn strategy(&self, target: &str) -> Result<SharedStrategy, PublishError> {
        self.registry
            .get(target)
            .ok_or_else(|| PublishError::unsupported(target))
    }

    pub async fn initialize(&self, target: &str) -> Result<(), PublishError> {
        self.registry.initialize(target).await
    }

    /// Open the platform's login page in a live session, initializing first
    pub async fn open_login(&self, target: &str) -> Result<String, PublishError> {
        let strategy = self.strategy(target)?;
        let mut strategy = strategy.lock().await;
        strategy.initialize().await?;
        strategy.open_login().await
    }

    /// Persist the login the user completed in the live session
    pub async fn confirm_login(&self, target: &str) -> Result<(), PublishError> {
        let strategy = self.strategy(target)?;
        let mut strategy = strategy.lock().await;
        strategy.confirm_login().await
    }

    /// Login status from the session file; never waits on a running publish
    pub async fn status(&self, target: &str) -> Result<PlatformStatus, PublishError> {
        let (Some(display_name), Some(state)) =
            (self.registry.display_name(target), self.registry.state(target))
        else {
            return Err(PublishError::unsupported(target));
        };

        Ok(PlatformStatus {
            target: target.to_string(),
            display_name: display_name.to_string(),
            logged_in: self.store.is_logged_in(target).await,
            state,
        })
    }

    /// Status of every registered platform, sorted by identifier
    pub async fn platforms(&self) -> Vec<PlatformStatus> {
        let mut statuses = Vec::new();
        for target in self.registry.targets() {
            match self.status(&target).await {
                Ok(status) => statuses.push(status),
                Err(e) => tracing::warn!(platform = %target, error = %e, "status unavailable"),
            }
        }
        statuses
    }

    /// Publish to one target
    ///
    /// # Errors
    ///
    /// `ValidationError` for blank content, `UnsupportedTargetError` for an
    /// unknown target. Everything after that is reported in the result.
    pub async fn publish(
        &self,
        target: &str,
        content: &str,
        title: &str,
        options: &PublishOptions,
    ) -> Result<PublishResult, PublishError> {
        if content.trim().is_empty() {
            return Err(PublishError::validation("发布内容不能为空"));
        }
        let strategy = self.strategy(target)?;
        let mut strategy = strategy.lock().await;

        if let Err(e) = strategy.initialize().await {
            return Ok(PublishResult::from(&e));
        }
        Ok(strategy.publish(content, title, options).await)
    }

    pub async fn publish_to_multiple(
        &self,
        request: BatchPublishRequest,
    ) -> Result<BatchPublishResult, PublishError> {
        self.batch.publish_to_multiple(request).await
    }

    /// Start a batch without waiting for it
    pub fn spawn_batch(&self, request: BatchPublishRequest) -> Result<Uuid, PublishError> {
        self.batch.spawn(request)
    }

    pub fn task_progress(&self, task_id: Uuid) -> Option<TaskProgress> {
        self.batch.tracker().progress(task_id)
    }

    /// Release every automation session
    pub async fn shutdown(&self) {
        tracing::info!("releasing automation sessions");
        self.registry.cleanup_all().await;
    }
}
