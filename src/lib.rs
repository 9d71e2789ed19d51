pub mod api;
pub mod core;
pub mod driver;
pub mod interaction;
pub mod locator;
pub mod orchestration;
pub mod registry;
pub mod session;
pub mod strategies;

pub use core::*;
pub use driver::{AutomationDriver, DriverError, DriverSession, MemoryDriver, WebDriverClient};
pub use orchestration::{
    BatchPublishOptions, BatchPublishRequest, BatchPublishResult, BatchPublisher,
    PlatformPublisher, PlatformStatus, TaskProgress, TaskTracker,
};
pub use registry::StrategyRegistry;
pub use session::{SessionState, SessionStore};
