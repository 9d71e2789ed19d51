//! Automation driver capability interface
//!
//! The engine never automates a browser itself. Everything it needs from a
//! page goes through [`DriverSession`]: navigate, locate, click, fill, read a
//! property, evaluate a script and wait. Implementations:
//! - [`webdriver::WebDriverClient`]: forwards to a W3C WebDriver server
//! - [`memory::MemoryDriver`]: in-process page model for offline runs and tests

pub mod memory;
pub mod webdriver;

use crate::core::config::{DriverConfig, DriverKind};
use crate::session::SessionState;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use memory::{ClickEffect, FakeElement, MemoryDriver};
pub use webdriver::{WebDriverClient, WebDriverOptions};

/// Opaque reference to an element inside one session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Errors raised at the driver boundary
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DriverError {
    #[error("会话创建失败: {0}")]
    SessionUnavailable(String),

    #[error("页面导航失败: {0}")]
    Navigation(String),

    #[error("无效的选择器: {0}")]
    InvalidSelector(String),

    #[error("元素已失效: {0}")]
    StaleElement(String),

    #[error("交互失败: {0}")]
    Interaction(String),

    #[error("脚本执行失败: {0}")]
    Script(String),

    #[error("等待超时: {0}")]
    Timeout(String),

    #[error("驱动协议错误: {0}")]
    Protocol(String),

    #[error("会话已关闭")]
    Closed,
}

/// Factory for automation sessions
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    fn name(&self) -> &str;

    /// Open a fresh session (browser context), seeded with `state` if given
    async fn open_session(
        &self,
        state: Option<&SessionState>,
    ) -> Result<Box<dyn DriverSession>, DriverError>;
}

/// Build the driver selected by configuration
pub fn connect(config: &DriverConfig) -> Arc<dyn AutomationDriver> {
    match config.kind {
        DriverKind::Webdriver => Arc::new(WebDriverClient::new(WebDriverOptions::from(config))),
        DriverKind::Memory => Arc::new(MemoryDriver::new()),
    }
}

/// One automation session. Not safe for concurrent step execution; the owning
/// strategy drives it sequentially.
#[async_trait]
pub trait DriverSession: Send + Sync {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    /// First element matching `selector`, `None` when nothing matches
    async fn locate(&self, selector: &str) -> Result<Option<ElementHandle>, DriverError>;

    /// Wait up to `timeout` for the element to be displayed
    async fn wait_visible(
        &self,
        element: &ElementHandle,
        timeout: Duration,
    ) -> Result<bool, DriverError>;

    async fn is_enabled(&self, element: &ElementHandle) -> Result<bool, DriverError>;

    /// Click the element; `forced` skips actionability and overlay checks
    async fn click(&self, element: &ElementHandle, forced: bool) -> Result<(), DriverError>;

    async fn clear(&self, element: &ElementHandle) -> Result<(), DriverError>;

    /// Type `text` into the element
    async fn fill(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError>;

    /// Live DOM property (e.g. `value`), `None` when undefined
    async fn read_property(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Evaluate a page-level script body; `arguments` holds `args`
    async fn evaluate(&self, script: &str, args: Vec<Value>) -> Result<Value, DriverError>;

    /// Evaluate a script body with the element as `arguments[0]` followed by `args`
    async fn evaluate_on(
        &self,
        element: &ElementHandle,
        script: &str,
        args: Vec<Value>,
    ) -> Result<Value, DriverError>;

    /// Block until the page looks stable (network quiet, DOM complete) or
    /// `timeout` elapses, in which case `DriverError::Timeout` is returned
    async fn wait_for_stable(&self, timeout: Duration) -> Result<(), DriverError>;

    /// Snapshot cookies and local storage of the session
    async fn storage_state(&self) -> Result<SessionState, DriverError>;

    async fn close(&self) -> Result<(), DriverError>;
}

/// Scripts the engine evaluates through [`DriverSession::evaluate_on`].
///
/// Bodies follow the WebDriver convention: the element is `arguments[0]`.
pub mod scripts {
    pub const SCROLL_INTO_VIEW: &str =
        "arguments[0].scrollIntoView({block: 'center', inline: 'center'});";

    pub const CLICK: &str = "arguments[0].click();";

    /// Inner text of contenteditable editors, which have no `value`
    pub const READ_TEXT: &str =
        "return arguments[0].value !== undefined ? arguments[0].value : arguments[0].innerText;";

    /// Synthetic paste of `arguments[1]` into the focused element
    pub const PASTE_TEXT: &str = r#"
const el = arguments[0];
const text = arguments[1];
el.focus();
const data = new DataTransfer();
data.setData('text/plain', text);
const event = new ClipboardEvent('paste', { clipboardData: data, bubbles: true, cancelable: true });
if (el.dispatchEvent(event)) {
  document.execCommand('insertText', false, text);
}
return true;
"#;

    pub const FORCE_CLICK: &str = r#"
const el = arguments[0];
for (const type of ['pointerdown', 'mousedown', 'pointerup', 'mouseup', 'click']) {
  el.dispatchEvent(new MouseEvent(type, { bubbles: true, cancelable: true, view: window }));
}
"#;
}
