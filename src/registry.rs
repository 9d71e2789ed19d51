//! Strategy registry - discovers and holds one strategy per target
//!
//! Built once at start-up from the built-in platform profiles. Each entry
//! sits behind its own async mutex, so calls on the same target serialize
//! while different targets never wait on each other.
//!
//! # Example
//!
//! ```no_run
//! use platform_publisher::core::PublisherConfig;
//! use platform_publisher::driver::MemoryDriver;
//! use platform_publisher::registry::StrategyRegistry;
//! use platform_publisher::session::SessionStore;
//! use platform_publisher::strategies::StrategySettings;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = PublisherConfig::default();
//! let registry = StrategyRegistry::discover(
//!     Arc::new(MemoryDriver::new()),
//!     Arc::new(SessionStore::new(".publish-sessions")),
//!     StrategySettings::from_config(&config),
//!     &config,
//! );
//!
//! registry.initialize("csdn").await?;
//! # Ok(())
//! # }
//! ```

use crate::core::config::PublisherConfig;
use crate::core::error::PublishError;
use crate::core::state_machine::StrategyState;
use crate::core::traits::PublishStrategy;
use crate::driver::AutomationDriver;
use crate::session::SessionStore;
use crate::strategies::{builtin_profiles, StrategySettings, WebStrategy};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A strategy behind its per-target lock
pub type SharedStrategy = Arc<Mutex<Box<dyn PublishStrategy>>>;

#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, SharedStrategy>,
    /// Readable without taking a strategy's lock
    display_names: HashMap<String, String>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every enabled built-in platform
    pub fn discover(
        driver: Arc<dyn AutomationDriver>,
        store: Arc<SessionStore>,
        settings: StrategySettings,
        config: &PublisherConfig,
    ) -> Self {
        let mut registry = Self::new();

        for profile in builtin_profiles() {
            let platform = config.platform(&profile.id);
            if !platform.enabled {
                tracing::info!(platform = %profile.id, "platform disabled by configuration");
                continue;
            }

            let profile = match platform.editor_url {
                Some(url) => profile.with_editor_url(url),
                None => profile,
            };

            let strategy = WebStrategy::new(
                profile,
                Arc::clone(&driver),
                Arc::clone(&store),
                settings.clone(),
            );
            if let Err(error) = registry.register(Box::new(strategy)) {
                tracing::warn!(error = %error, "skipping built-in platform");
            }
        }

        tracing::debug!(targets = ?registry.targets(), "strategies discovered");
        registry
    }

    /// Add a strategy; identifiers must be unique
    pub fn register(&mut self, strategy: Box<dyn PublishStrategy>) -> Result<(), PublishError> {
        let id = strategy.identify().to_string();
        if self.strategies.contains_key(&id) {
            return Err(PublishError::DuplicateTarget { target: id });
        }
        self.display_names
            .insert(id.clone(), strategy.display_name().to_string());
        self.strategies.insert(id, Arc::new(Mutex::new(strategy)));
        Ok(())
    }

    pub fn get(&self, target: &str) -> Option<SharedStrategy> {
        self.strategies.get(target).cloned()
    }

    pub fn display_name(&self, target: &str) -> Option<&str> {
        self.display_names.get(target).map(String::as_str)
    }

    /// Current lifecycle state without waiting; a strategy whose lock is
    /// held is mid-operation and reported as `Publishing`
    pub fn state(&self, target: &str) -> Option<StrategyState> {
        let strategy = self.strategies.get(target)?;
        Some(match strategy.try_lock() {
            Ok(strategy) => strategy.state(),
            Err(_) => StrategyState::Publishing,
        })
    }

    pub fn is_supported(&self, target: &str) -> bool {
        self.strategies.contains_key(target)
    }

    /// Registered identifiers, sorted
    pub fn targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.strategies.keys().cloned().collect();
        targets.sort();
        targets
    }

    pub async fn initialize(&self, target: &str) -> Result<(), PublishError> {
        let strategy = self
            .get(target)
            .ok_or_else(|| PublishError::unsupported(target))?;
        let mut strategy = strategy.lock().await;
        strategy.initialize().await
    }

    /// Initialize several targets concurrently; one failure never affects the others
    pub async fn initialize_all(&self, targets: &[String]) -> Vec<(String, Result<(), PublishError>)> {
        let mut handles = Vec::with_capacity(targets.len());
        let mut outcomes = Vec::with_capacity(targets.len());

        for target in targets {
            match self.get(target) {
                Some(strategy) => {
                    let handle = tokio::spawn(async move {
                        let mut strategy = strategy.lock().await;
                        strategy.initialize().await
                    });
                    handles.push((target.clone(), handle));
                }
                None => outcomes.push((target.clone(), Err(PublishError::unsupported(target)))),
            }
        }

        for (target, handle) in handles {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(e) => Err(PublishError::Initialization {
                    target: target.clone(),
                    message: format!("初始化任务异常退出: {}", e),
                }),
            };
            outcomes.push((target, outcome));
        }

        outcomes
    }

    /// Release every strategy's session
    pub async fn cleanup_all(&self) {
        for (target, strategy) in &self.strategies {
            strategy.lock().await.cleanup().await;
            tracing::debug!(platform = %target, "strategy cleaned up");
        }
    }
}
