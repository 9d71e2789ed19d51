//! Error handling for platform publishing
//!
//! This module provides the publish error taxonomy with recovery guidance
//! using the thiserror crate for ergonomic error handling.

use thiserror::Error;

/// Main error type for publish orchestration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PublishError {
    // Request errors
    #[error("请求参数无效: {message}")]
    Validation { message: String },

    #[error("[{target}] 不支持的发布平台")]
    UnsupportedTarget { target: String },

    #[error("[{target}] 平台重复注册")]
    DuplicateTarget { target: String },

    // Session errors
    #[error("[{target}] 初始化失败: {message}")]
    Initialization { target: String, message: String },

    #[error("[{target}] 登录状态读写失败: {message}")]
    Session { target: String, message: String },

    #[error("[{target}] 当前状态不允许此操作: {state}")]
    InvalidState { target: String, state: String },

    // Publish step errors
    #[error("[{target}] 页面打开失败: {message}")]
    Navigation { target: String, message: String },

    #[error("[{target}] 未找到页面元素: {role}")]
    ElementNotFound { target: String, role: String },

    #[error("[{target}] 页面交互失败: {step}")]
    Interaction { target: String, step: String },

    #[error("[{target}] 发布超时")]
    PublishTimeout { target: String },

    // Configuration errors
    #[error("配置错误: {0}")]
    Config(String),
}

impl PublishError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unsupported(target: impl Into<String>) -> Self {
        Self::UnsupportedTarget {
            target: target.into(),
        }
    }

    /// Get the target identifier associated with this error, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::UnsupportedTarget { target }
            | Self::DuplicateTarget { target }
            | Self::Initialization { target, .. }
            | Self::Session { target, .. }
            | Self::InvalidState { target, .. }
            | Self::Navigation { target, .. }
            | Self::ElementNotFound { target, .. }
            | Self::Interaction { target, .. }
            | Self::PublishTimeout { target } => Some(target),
            Self::Validation { .. } | Self::Config(_) => None,
        }
    }

    /// Taxonomy name of this error, stable across message wording changes
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::UnsupportedTarget { .. } => "UnsupportedTargetError",
            Self::DuplicateTarget { .. } => "DuplicateTargetError",
            Self::Initialization { .. } => "InitializationError",
            Self::Session { .. } => "SessionError",
            Self::InvalidState { .. } => "InvalidStateError",
            Self::Navigation { .. } => "NavigationError",
            Self::ElementNotFound { .. } => "ElementNotFoundError",
            Self::Interaction { .. } => "InteractionError",
            Self::PublishTimeout { .. } => "PublishTimeoutError",
            Self::Config(_) => "ConfigError",
        }
    }

    /// Check if retrying the same request later can succeed
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Validation { .. }
                | Self::UnsupportedTarget { .. }
                | Self::DuplicateTarget { .. }
                | Self::Config(_)
        )
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::Validation { .. } => vec!["请检查发布内容和目标平台列表"],
            Self::UnsupportedTarget { .. } => {
                vec!["请通过 /platforms 查看支持的平台列表"]
            }
            Self::DuplicateTarget { .. } => vec!["每个平台标识只能注册一次"],
            Self::Initialization { .. } => vec![
                "请确认浏览器驱动服务已启动",
                "请检查 driver.webdriverUrl 配置",
            ],
            Self::Session { .. } => vec![
                "请先完成登录再确认登录状态",
                "请检查登录状态目录的读写权限",
            ],
            Self::InvalidState { .. } => vec!["请先初始化平台"],
            Self::Navigation { .. } => vec![
                "请检查网络连接",
                "请稍后重试",
            ],
            Self::ElementNotFound { .. } => vec![
                "平台页面结构可能已变化，请更新选择器配置",
                "请确认登录状态仍然有效",
            ],
            Self::Interaction { .. } => vec![
                "页面可能被弹窗遮挡，请手动检查",
                "请稍后重试",
            ],
            Self::PublishTimeout { .. } => vec![
                "请在平台后台确认文章是否已发布",
                "可以调大 batch.deadlineSecs 配置",
            ],
            Self::Config(_) => vec!["请检查 .publisher-config.yaml"],
        }
    }
}
