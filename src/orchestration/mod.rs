//! Orchestration layer for platform publishing
//!
//! This module provides the high-level components that drive strategies:
//! single-target operations, concurrent batches and batch progress tracking.

pub mod batch_publisher;
pub mod platform_publisher;
pub mod task_tracker;

// Re-export main types for convenience
pub use batch_publisher::{
    BatchPublishOptions, BatchPublishRequest, BatchPublishResult, BatchPublisher,
};
pub use platform_publisher::{PlatformPublisher, PlatformStatus};
pub use task_tracker::{TaskProgress, TaskTracker};
