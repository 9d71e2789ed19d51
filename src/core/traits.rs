//! Core traits and types for platform publishing
//!
//! This module defines the strategy abstraction every publish target
//! implements, and the option/result types that cross it.

use crate::core::error::PublishError;
use crate::core::state_machine::StrategyState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// ============================================================================
// Publish options
// ============================================================================

/// Visibility of a published article
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Options for a publish call. Never mutated once handed to a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOptions {
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub auto_save: bool,
    #[serde(default = "default_enable_comments")]
    pub enable_comments: bool,
    #[serde(flatten)]
    pub custom: HashMap<String, serde_json::Value>, // Target-specific options
}

fn default_enable_comments() -> bool {
    true
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            tags: BTreeSet::new(),
            summary: None,
            categories: BTreeSet::new(),
            visibility: Visibility::Public,
            auto_save: false,
            enable_comments: true,
            custom: HashMap::new(),
        }
    }
}

// ============================================================================
// Publish result
// ============================================================================

/// Outcome of publishing to one target.
///
/// Built once through [`PublishResult::success`], [`PublishResult::failure`]
/// or [`PublishResult::simulated`]; read-only afterwards. A simulated result
/// is neither a success nor a failure: it serializes `success: false` with
/// `simulated: true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    success: bool,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    simulated: bool,
}

impl PublishResult {
    pub fn success(message: impl Into<String>, url: Option<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            url,
            simulated: false,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            url: None,
            simulated: false,
        }
    }

    /// Explicit simulation outcome: nothing was submitted to the target
    pub fn simulated(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            url: None,
            simulated: true,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Failed for real; simulated results are not failures
    pub fn is_failure(&self) -> bool {
        !self.success && !self.simulated
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated
    }
}

impl From<&PublishError> for PublishResult {
    fn from(error: &PublishError) -> Self {
        match error {
            PublishError::UnsupportedTarget { .. } => Self::failure(error.kind()),
            other => Self::failure(other.to_string()),
        }
    }
}

// ============================================================================
// Publish strategy trait
// ============================================================================

/// One publish target's lifecycle.
///
/// An instance owns its automation session exclusively between
/// [`initialize`](PublishStrategy::initialize) and
/// [`cleanup`](PublishStrategy::cleanup). Callers serialize access through
/// the registry's per-target lock, so methods take `&mut self`.
#[async_trait]
pub trait PublishStrategy: Send + Sync {
    /// Target identifier (e.g., "csdn", "weibo")
    fn identify(&self) -> &str;

    /// Human-readable target name
    fn display_name(&self) -> &str;

    fn login_url(&self) -> &str;

    fn editor_url(&self) -> &str;

    /// Current lifecycle state
    fn state(&self) -> StrategyState;

    /// Acquire an automation session, seeded with persisted login state.
    ///
    /// Calling this on a ready strategy is a no-op.
    async fn initialize(&mut self) -> Result<(), PublishError>;

    /// Navigate the live session to the login page and return its URL.
    /// The user completes authentication out-of-band.
    async fn open_login(&mut self) -> Result<String, PublishError>;

    /// Persist the session's current login state for later initializations
    async fn confirm_login(&mut self) -> Result<(), PublishError>;

    /// Publish content. Never errors: every failure is a failed result.
    async fn publish(
        &mut self,
        content: &str,
        title: &str,
        options: &PublishOptions,
    ) -> PublishResult;

    /// Release the automation session. Safe to call repeatedly.
    async fn cleanup(&mut self);
}
