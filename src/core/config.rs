//! Configuration structures and types for platform-publisher
//!
//! This module provides type-safe configuration management with serde support.
//! Every section is optional in the file; absent sections fall back to their
//! defaults when read through the accessor methods.

use crate::core::retry::{Backoff, RetryOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublisherConfig {
    /// Schema version (required)
    pub version: String,

    /// Extend from base configuration file (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// HTTP control surface
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Automation driver binding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverConfig>,

    /// Login state persistence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<SessionsConfig>,

    /// Batch execution limits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchConfig>,

    /// Per-step retry policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,

    /// Page and element timeouts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<TimeoutsConfig>,

    /// Simulated publishing when the driver is unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationConfig>,

    /// Per-platform switches and overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<HashMap<String, PlatformConfig>>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Driver kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    #[default]
    Webdriver,
    Memory,
}

/// Automation driver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DriverConfig {
    pub kind: DriverKind,

    /// WebDriver endpoint (environment variable expansion supported)
    pub webdriver_url: String,

    /// Browser name passed in the session capabilities
    pub browser: String,

    pub headless: bool,

    /// Extra browser arguments
    pub args: Vec<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            kind: DriverKind::Webdriver,
            webdriver_url: "http://127.0.0.1:9515".to_string(),
            browser: "chrome".to_string(),
            headless: false,
            args: Vec::new(),
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionsConfig {
    /// Directory holding `<target>_state.json` files
    pub directory: String,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            directory: ".publish-sessions".to_string(),
        }
    }
}

impl SessionsConfig {
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.directory)
    }
}

/// Batch configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct BatchConfig {
    /// Maximum simultaneous automation sessions per batch
    pub max_concurrency: usize,

    /// Overall batch deadline; 0 disables it
    pub deadline_secs: u64,

    /// How long finished batch tasks stay queryable
    pub task_retention_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 3,
            deadline_secs: 600,
            task_retention_secs: 3600,
        }
    }
}

impl BatchConfig {
    pub fn deadline(&self) -> Option<Duration> {
        (self.deadline_secs > 0).then(|| Duration::from_secs(self.deadline_secs))
    }

    pub fn task_retention(&self) -> Duration {
        Duration::from_secs(self.task_retention_secs)
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    pub max_attempts: u32,

    /// Constant delay between attempts
    pub backoff_ms: u64,

    /// Explicit per-attempt delays; overrides `backoffMs` when non-empty
    pub schedule_ms: Vec<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 1000,
            schedule_ms: Vec::new(),
        }
    }
}

impl RetryConfig {
    pub fn to_options(&self) -> RetryOptions {
        let backoff = if self.schedule_ms.is_empty() {
            Backoff::Constant(Duration::from_millis(self.backoff_ms))
        } else {
            Backoff::Schedule(
                self.schedule_ms
                    .iter()
                    .map(|ms| Duration::from_millis(*ms))
                    .collect(),
            )
        };

        RetryOptions {
            max_attempts: self.max_attempts,
            backoff,
        }
    }
}

/// Timeout configuration (milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeoutsConfig {
    pub navigation_ms: u64,
    /// Page stability wait (network quiescence + DOM ready)
    pub stability_ms: u64,
    /// Client-side hydration settle after the page is stable
    pub settle_ms: u64,
    /// Overall budget for one selector chain
    pub locate_ms: u64,
    /// Visibility wait per selector candidate
    pub candidate_ms: u64,
    /// Pause after scrolling a located element into view
    pub scroll_settle_ms: u64,
    /// How long to look for an optional post-submit dialog
    pub dialog_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_attempts: u32,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            navigation_ms: 30_000,
            stability_ms: 15_000,
            settle_ms: 2_000,
            locate_ms: 10_000,
            candidate_ms: 3_000,
            scroll_settle_ms: 300,
            dialog_ms: 3_000,
            poll_interval_ms: 1_000,
            poll_attempts: 15,
        }
    }
}

/// Simulation mode configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SimulationConfig {
    /// Report simulated results instead of failing when no driver session
    /// can be created (default: false)
    pub enabled: bool,
}

/// Per-platform configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PlatformConfig {
    pub enabled: bool,

    /// Override the built-in editor URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor_url: Option<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            editor_url: None,
        }
    }
}

/// Default configuration values
impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            extends: None,
            server: None,
            driver: None,
            sessions: None,
            batch: None,
            retry: None,
            timeouts: None,
            simulation: None,
            platforms: None,
        }
    }
}

impl PublisherConfig {
    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    pub fn driver(&self) -> DriverConfig {
        self.driver.clone().unwrap_or_default()
    }

    pub fn sessions(&self) -> SessionsConfig {
        self.sessions.clone().unwrap_or_default()
    }

    pub fn batch(&self) -> BatchConfig {
        self.batch.clone().unwrap_or_default()
    }

    pub fn retry(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn timeouts(&self) -> TimeoutsConfig {
        self.timeouts.clone().unwrap_or_default()
    }

    pub fn simulation_enabled(&self) -> bool {
        self.simulation.as_ref().map(|s| s.enabled).unwrap_or(false)
    }

    /// Platform switches, empty when none are configured
    pub fn platform(&self, target: &str) -> PlatformConfig {
        self.platforms
            .as_ref()
            .and_then(|p| p.get(target))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PublisherConfig::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.batch().max_concurrency, 3);
        assert!(!config.simulation_enabled());
        assert!(config.platform("csdn").enabled);
    }

    #[test]
    fn test_serialize_config() {
        let config = PublisherConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("version: '1.0'"));
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let yaml = r#"
version: "1.0"
batch:
  maxConcurrency: 5
timeouts:
  pollAttempts: 30
platforms:
  weibo:
    enabled: false
"#;
        let config: PublisherConfig = serde_yaml::from_str(yaml).unwrap();

        let batch = config.batch();
        assert_eq!(batch.max_concurrency, 5);
        assert_eq!(batch.deadline_secs, 600);
        assert_eq!(config.timeouts().poll_attempts, 30);
        assert_eq!(config.timeouts().navigation_ms, 30_000);
        assert!(!config.platform("weibo").enabled);
        assert!(config.platform("csdn").enabled);
    }

    #[test]
    fn test_driver_kind_serialization() {
        let config = DriverConfig {
            kind: DriverKind::Memory,
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("kind: memory"));
        assert!(yaml.contains("webdriverUrl"));
    }

    #[test]
    fn test_retry_schedule_overrides_constant() {
        let config = RetryConfig {
            max_attempts: 4,
            backoff_ms: 1000,
            schedule_ms: vec![100, 300],
        };

        let options = config.to_options();
        assert_eq!(options.max_attempts, 4);
        assert_eq!(
            options.backoff,
            Backoff::Schedule(vec![Duration::from_millis(100), Duration::from_millis(300)])
        );
    }

    #[test]
    fn test_zero_deadline_disables_it() {
        let batch = BatchConfig {
            deadline_secs: 0,
            ..Default::default()
        };
        assert!(batch.deadline().is_none());
    }
}
